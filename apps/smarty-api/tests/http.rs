use std::{sync::Arc, time::Duration};

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
	response::Response,
};
use serde_json::{Value, json};
use tower::util::ServiceExt;
use uuid::Uuid;

use smarty_api::{routes, state::AppState};
use smarty_service::{Backends, SmartyService};
use smarty_testkit::{FailingEmbedding, MemoryNoteStore, MemoryVectorIndex, TestHarness};

const OWNER_HEADER: &str = "x-smarty-user-id";

fn app() -> (Router, TestHarness) {
	let h = smarty_testkit::harness(smarty_testkit::test_config());
	let router = routes::router(AppState::from_service(h.service.clone()));

	(router, h)
}

fn request(method: &str, uri: &str, owner_id: Option<&str>, body: Option<Value>) -> Request<Body> {
	let mut builder = Request::builder().method(method).uri(uri);

	if let Some(owner_id) = owner_id {
		builder = builder.header(OWNER_HEADER, owner_id);
	}

	match body {
		Some(body) => builder
			.header("content-type", "application/json")
			.body(Body::from(body.to_string()))
			.expect("Failed to build request."),
		None => builder.body(Body::empty()).expect("Failed to build request."),
	}
}

async fn send(router: &Router, req: Request<Body>) -> Response {
	router.clone().oneshot(req).await.expect("Failed to call router.")
}

async fn json_body(response: Response) -> Value {
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&bytes).expect("Failed to parse response.")
}

#[tokio::test]
async fn health_is_open() {
	let (router, _h) = app();
	let response = send(&router, request("GET", "/health", None, None)).await;

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn groceries_scenario_over_http() {
	let (router, h) = app();
	let response = send(
		&router,
		request(
			"POST",
			"/notes",
			Some("u1"),
			Some(json!({ "title": "Groceries", "content": "Milk, eggs" })),
		),
	)
	.await;

	assert_eq!(response.status(), StatusCode::CREATED);

	let created = json_body(response).await;
	let note_id = created["note"]["note_id"].as_str().expect("Expected a note id.").to_string();

	assert_eq!(created["note"]["title"], "Groceries");
	assert_eq!(created["note"]["created_at"], created["note"]["updated_at"]);

	let listed = json_body(send(&router, request("GET", "/notes", Some("u1"), None)).await).await;
	let notes = listed["notes"].as_array().expect("Expected notes array.");

	assert_eq!(notes.iter().filter(|note| note["note_id"] == note_id.as_str()).count(), 1);

	let parsed = Uuid::parse_str(&note_id).expect("Expected a UUID.");
	let indexed =
		smarty_testkit::wait_until(Duration::from_secs(2), || h.index.point(parsed).is_some())
			.await;

	assert!(indexed);

	let response =
		send(&router, request("DELETE", "/notes", Some("u1"), Some(json!({ "id": note_id }))))
			.await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await["message"], "Note deleted.");

	let listed = json_body(send(&router, request("GET", "/notes", Some("u1"), None)).await).await;

	assert_eq!(listed["notes"], json!([]));

	let response =
		send(&router, request("DELETE", "/notes", Some("u1"), Some(json!({ "id": note_id }))))
			.await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_by_another_owner_is_unauthorized() {
	let (router, h) = app();
	let created = json_body(
		send(
			&router,
			request("POST", "/notes", Some("u1"), Some(json!({ "title": "Groceries" }))),
		)
		.await,
	)
	.await;
	let note_id = created["note"]["note_id"].clone();
	let response = send(
		&router,
		request("PUT", "/notes", Some("u2"), Some(json!({ "id": note_id, "title": "Mine now" }))),
	)
	.await;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert!(json_body(response).await["error"].is_string());

	let id = Uuid::parse_str(note_id.as_str().expect("Expected a note id."))
		.expect("Expected a UUID.");

	assert_eq!(h.store.note(id).expect("Expected stored note.").title, "Groceries");
}

#[tokio::test]
async fn update_returns_the_new_note() {
	let (router, _h) = app();
	let created = json_body(
		send(
			&router,
			request("POST", "/notes", Some("u1"), Some(json!({ "title": "Groceries" }))),
		)
		.await,
	)
	.await;
	let response = send(
		&router,
		request(
			"PUT",
			"/notes",
			Some("u1"),
			Some(json!({
				"id": created["note"]["note_id"],
				"title": "Groceries",
				"content": "Bread",
			})),
		),
	)
	.await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await["note"]["content"], "Bread");
}

#[tokio::test]
async fn missing_owner_is_unauthorized() {
	let (router, _h) = app();
	let response =
		send(&router, request("POST", "/notes", None, Some(json!({ "title": "Groceries" })))).await;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

	let response = send(&router, request("GET", "/categories", Some("  "), None)).await;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_bodies_are_bad_requests() {
	let (router, _h) = app();
	let response =
		send(&router, request("POST", "/notes", Some("u1"), Some(json!({ "title": "  " })))).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let malformed = Request::builder()
		.method("POST")
		.uri("/notes")
		.header(OWNER_HEADER, "u1")
		.header("content-type", "application/json")
		.body(Body::from("{not json"))
		.expect("Failed to build request.");
	let response = send(&router, malformed).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn bearer_token_is_enforced_when_configured() {
	let mut cfg = smarty_testkit::test_config();

	cfg.security.api_auth_token = Some("gateway-secret".to_string());

	let h = smarty_testkit::harness(cfg);
	let router = routes::router(AppState::from_service(h.service.clone()));
	let response = send(&router, request("GET", "/notes", Some("u1"), None)).await;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

	let authorized = Request::builder()
		.method("GET")
		.uri("/notes")
		.header(OWNER_HEADER, "u1")
		.header("authorization", "Bearer gateway-secret")
		.body(Body::empty())
		.expect("Failed to build request.");
	let response = send(&router, authorized).await;

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn get_note_by_id() {
	let (router, _h) = app();
	let created = json_body(
		send(
			&router,
			request("POST", "/notes", Some("u1"), Some(json!({ "title": "Groceries" }))),
		)
		.await,
	)
	.await;
	let note_id = created["note"]["note_id"].as_str().expect("Expected a note id.").to_string();
	let uri = format!("/notes/{note_id}");
	let response = send(&router, request("GET", &uri, Some("u1"), None)).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await["note"]["title"], "Groceries");

	let response = send(&router, request("GET", &uri, Some("u2"), None)).await;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn search_finds_indexed_notes() {
	let (router, h) = app();
	let created = json_body(
		send(
			&router,
			request(
				"POST",
				"/notes",
				Some("u1"),
				Some(json!({ "title": "Groceries", "content": "milk eggs" })),
			),
		)
		.await,
	)
	.await;
	let note_id = created["note"]["note_id"].clone();
	let id = Uuid::parse_str(note_id.as_str().expect("Expected a note id."))
		.expect("Expected a UUID.");
	let indexed =
		smarty_testkit::wait_until(Duration::from_secs(2), || h.index.point(id).is_some()).await;

	assert!(indexed);

	let response = send(
		&router,
		request("POST", "/notes/search", Some("u1"), Some(json!({ "query": "groceries milk" }))),
	)
	.await;

	assert_eq!(response.status(), StatusCode::OK);

	let hits = json_body(response).await;

	assert_eq!(hits["hits"][0]["note"]["note_id"], note_id);
	assert!(hits["hits"][0]["score"].is_number());
}

#[tokio::test]
async fn search_reports_embedding_outage_as_unavailable() {
	let backends = Backends::new(
		Arc::new(MemoryNoteStore::default()),
		Arc::new(MemoryVectorIndex::default()),
		Arc::new(FailingEmbedding),
	);
	let service = SmartyService::with_backends(smarty_testkit::test_config(), backends);
	let router = routes::router(AppState::from_service(Arc::new(service)));
	let response = send(
		&router,
		request("POST", "/notes/search", Some("u1"), Some(json!({ "query": "groceries" }))),
	)
	.await;

	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn vector_delete_failure_is_a_server_error() {
	let (router, h) = app();
	let created = json_body(
		send(
			&router,
			request("POST", "/notes", Some("u1"), Some(json!({ "title": "Groceries" }))),
		)
		.await,
	)
	.await;

	h.index.set_fail_deletes(true);

	let response = send(
		&router,
		request("DELETE", "/notes", Some("u1"), Some(json!({ "id": created["note"]["note_id"] }))),
	)
	.await;

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(h.store.note_count(), 1);
}

#[tokio::test]
async fn category_routes() {
	let (router, _h) = app();
	let response =
		send(&router, request("POST", "/categories", Some("u1"), Some(json!({ "name": "Work" }))))
			.await;

	assert_eq!(response.status(), StatusCode::CREATED);

	let created = json_body(response).await;
	let category_id = created["category"]["category_id"].clone();
	let listed =
		json_body(send(&router, request("GET", "/categories", Some("u1"), None)).await).await;

	assert_eq!(listed["categories"][0]["name"], "Work");

	let response = send(
		&router,
		request("DELETE", "/categories", Some("u1"), Some(json!({ "id": category_id }))),
	)
	.await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await["message"], "Category deleted.");

	let response = send(
		&router,
		request("DELETE", "/categories", Some("u1"), Some(json!({ "id": category_id }))),
	)
	.await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);

	let listed =
		json_body(send(&router, request("GET", "/categories", Some("u1"), None)).await).await;

	assert_eq!(listed["categories"], json!([]));
}

#[tokio::test]
async fn malformed_note_id_is_a_json_error_after_authentication() {
	let (router, _h) = app();
	let response = send(&router, request("GET", "/notes/not-a-uuid", None, None)).await;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert!(json_body(response).await["error"].is_string());

	let response = send(&router, request("GET", "/notes/not-a-uuid", Some("u1"), None)).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(
		response.headers().get("content-type").and_then(|value| value.to_str().ok()),
		Some("application/json")
	);
	assert!(json_body(response).await["error"].is_string());
}
