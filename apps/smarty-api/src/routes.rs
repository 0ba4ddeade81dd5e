use axum::{
	Json, Router,
	extract::{
		Path, State,
		rejection::{JsonRejection, PathRejection},
	},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;
use smarty_service::{
	CategoryView, CreateCategoryRequest, CreateNoteRequest, DeleteCategoryRequest,
	DeleteNoteRequest, Error, NoteListItem, NoteView, SearchHit, SearchRequest, UpdateNoteRequest,
};

#[derive(Debug, Deserialize)]
struct NoteBody {
	title: String,
	content: Option<String>,
	category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct NoteUpdateBody {
	id: Uuid,
	title: String,
	content: Option<String>,
	category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct IdBody {
	id: Uuid,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
	query: String,
	top_k: Option<u32>,
}

#[derive(Debug, Serialize)]
struct NoteEnvelope {
	note: NoteView,
}

#[derive(Debug, Serialize)]
struct NotesEnvelope {
	notes: Vec<NoteListItem>,
}

#[derive(Debug, Serialize)]
struct HitsEnvelope {
	hits: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
struct CategoryEnvelope {
	category: CategoryView,
}

#[derive(Debug, Serialize)]
struct CategoriesEnvelope {
	categories: Vec<CategoryView>,
}

#[derive(Debug, Serialize)]
struct MessageBody {
	message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, message: impl Into<String>) -> Self {
		Self { status, message: message.into() }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } => Self::new(StatusCode::BAD_REQUEST, message),
			Error::Unauthorized { message } => Self::new(StatusCode::UNAUTHORIZED, message),
			Error::NotFound { message } => Self::new(StatusCode::NOT_FOUND, message),
			Error::EmbeddingUnavailable { message } => {
				tracing::warn!(error = %message, "Embedding provider unavailable.");

				Self::new(StatusCode::SERVICE_UNAVAILABLE, "Embedding provider is unavailable.")
			},
			Error::Storage { message } => {
				tracing::error!(error = %message, "Storage request failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Storage request failed.")
			},
			Error::VectorIndex { message } => {
				tracing::error!(error = %message, "Vector index request failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Vector index request failed.")
			},
		}
	}
}
impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
	}
}
impl From<PathRejection> for ApiError {
	fn from(rejection: PathRejection) -> Self {
		Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(ErrorBody { error: self.message })).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/notes", get(list_notes).post(create_note).put(update_note).delete(delete_note))
		.route("/notes/search", post(search_notes))
		.route("/notes/{id}", get(get_note))
		.route("/categories", get(list_categories).post(create_category).delete(delete_category))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn list_notes(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<NotesEnvelope>, ApiError> {
	let owner_id = authenticate(&state, &headers)?;
	let notes = state.service.list_notes(&owner_id).await?;

	Ok(Json(NotesEnvelope { notes }))
}

async fn create_note(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<NoteBody>, JsonRejection>,
) -> Result<(StatusCode, Json<NoteEnvelope>), ApiError> {
	let owner_id = authenticate(&state, &headers)?;
	let Json(body) = payload?;
	let note = state
		.service
		.create_note(CreateNoteRequest {
			owner_id,
			title: body.title,
			content: body.content,
			category_id: body.category_id,
		})
		.await?;

	Ok((StatusCode::CREATED, Json(NoteEnvelope { note })))
}

async fn update_note(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<NoteUpdateBody>, JsonRejection>,
) -> Result<Json<NoteEnvelope>, ApiError> {
	let owner_id = authenticate(&state, &headers)?;
	let Json(body) = payload?;
	let note = state
		.service
		.update_note(UpdateNoteRequest {
			note_id: body.id,
			owner_id,
			title: body.title,
			content: body.content,
			category_id: body.category_id,
		})
		.await?;

	Ok(Json(NoteEnvelope { note }))
}

async fn delete_note(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<IdBody>, JsonRejection>,
) -> Result<Json<MessageBody>, ApiError> {
	let owner_id = authenticate(&state, &headers)?;
	let Json(body) = payload?;

	state.service.delete_note(DeleteNoteRequest { note_id: body.id, owner_id }).await?;

	Ok(Json(MessageBody { message: "Note deleted." }))
}

async fn get_note(
	State(state): State<AppState>,
	headers: HeaderMap,
	path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<NoteEnvelope>, ApiError> {
	let owner_id = authenticate(&state, &headers)?;
	let Path(note_id) = path?;
	let note = state.service.get_note(note_id, &owner_id).await?;

	Ok(Json(NoteEnvelope { note }))
}

async fn search_notes(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Json<HitsEnvelope>, ApiError> {
	let owner_id = authenticate(&state, &headers)?;
	let Json(body) = payload?;
	let hits = state
		.service
		.search_notes(SearchRequest { owner_id, query: body.query, top_k: body.top_k })
		.await?;

	Ok(Json(HitsEnvelope { hits }))
}

async fn list_categories(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<CategoriesEnvelope>, ApiError> {
	authenticate(&state, &headers)?;

	let categories = state.service.list_categories().await?;

	Ok(Json(CategoriesEnvelope { categories }))
}

async fn create_category(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CategoryEnvelope>), ApiError> {
	authenticate(&state, &headers)?;

	let Json(body) = payload?;
	let category = state.service.create_category(body).await?;

	Ok((StatusCode::CREATED, Json(CategoryEnvelope { category })))
}

async fn delete_category(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<IdBody>, JsonRejection>,
) -> Result<Json<MessageBody>, ApiError> {
	authenticate(&state, &headers)?;

	let Json(body) = payload?;

	state.service.delete_category(DeleteCategoryRequest { id: body.id }).await?;

	Ok(Json(MessageBody { message: "Category deleted." }))
}

/// Resolves the caller's owner id from the gateway headers.
///
/// When `security.api_auth_token` is set the request must also carry it as a bearer token.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
	let security = &state.service.cfg.security;

	if let Some(expected) = security.api_auth_token.as_deref()
		&& read_bearer_token(headers) != Some(expected)
	{
		return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid or missing bearer token."));
	}

	headers
		.get(security.owner_header.as_str())
		.and_then(|value| value.to_str().ok())
		.map(str::trim)
		.filter(|owner_id| !owner_id.is_empty())
		.map(str::to_string)
		.ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Missing owner identity."))
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}
