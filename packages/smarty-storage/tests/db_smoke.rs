use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use smarty_config::Postgres;
use smarty_storage::{
	db::Db,
	models::{Category, Note, NoteChanges},
	queries,
};
use smarty_testkit::TestDatabase;

async fn bootstrap(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

fn note(owner_id: &str, title: &str, created_at: OffsetDateTime) -> Note {
	Note {
		note_id: Uuid::new_v4(),
		owner_id: owner_id.to_string(),
		title: title.to_string(),
		content: Some("Milk, eggs".to_string()),
		category_id: None,
		created_at,
		updated_at: created_at,
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SMARTY_PG_DSN to run."]
async fn db_connects_and_bootstraps_twice() {
	let Some(base_dsn) = smarty_testkit::env_dsn() else {
		eprintln!(
			"Skipping db_connects_and_bootstraps_twice; set SMARTY_PG_DSN to run this test."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	db.ensure_schema().await.expect("Failed to re-run schema bootstrap.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name IN ('notes', 'categories')",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 2);

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SMARTY_PG_DSN to run."]
async fn notes_round_trip_with_category_names() {
	let Some(base_dsn) = smarty_testkit::env_dsn() else {
		eprintln!(
			"Skipping notes_round_trip_with_category_names; set SMARTY_PG_DSN to run this test."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let now = OffsetDateTime::now_utc().replace_nanosecond(0).expect("Valid nanosecond.");
	let category =
		Category { category_id: Uuid::new_v4(), name: "Errands".to_string(), created_at: now };

	queries::insert_category(&db, &category).await.expect("Failed to insert category.");

	let mut older = note("u1", "Groceries", now - Duration::minutes(1));

	older.category_id = Some(category.category_id);

	let newer = note("u1", "Standup", now);

	queries::insert_note(&db, &newer).await.expect("Failed to insert note.");
	queries::insert_note(&db, &older).await.expect("Failed to insert note.");
	queries::insert_note(&db, &note("u2", "Other", now)).await.expect("Failed to insert note.");

	let listed = queries::list_notes_by_owner(&db, "u1").await.expect("Failed to list notes.");

	assert_eq!(listed.len(), 2);
	assert_eq!(listed[0].note, older);
	assert_eq!(listed[0].category_name.as_deref(), Some("Errands"));
	assert_eq!(listed[1].note, newer);

	let changes = NoteChanges {
		title: "Groceries".to_string(),
		content: None,
		category_id: None,
		updated_at: now + Duration::minutes(1),
	};
	let updated = queries::update_note(&db, older.note_id, &changes)
		.await
		.expect("Failed to update note.")
		.expect("Expected the note to exist.");

	assert_eq!(updated.content, None);
	assert_eq!(updated.created_at, older.created_at);

	assert!(
		queries::delete_category(&db, category.category_id)
			.await
			.expect("Failed to delete category.")
	);

	let fetched = queries::fetch_notes(&db, &[older.note_id, newer.note_id, Uuid::new_v4()])
		.await
		.expect("Failed to fetch notes.");

	assert_eq!(fetched.len(), 2);

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SMARTY_PG_DSN to run."]
async fn delete_inside_rolled_back_transaction_keeps_row() {
	let Some(base_dsn) = smarty_testkit::env_dsn() else {
		eprintln!(
			"Skipping delete_inside_rolled_back_transaction_keeps_row; set SMARTY_PG_DSN to run \
			 this test."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let row = note("u1", "Groceries", OffsetDateTime::now_utc());

	queries::insert_note(&db, &row).await.expect("Failed to insert note.");

	let mut tx = db.pool.begin().await.expect("Failed to begin transaction.");

	assert!(queries::delete_note_tx(&mut tx, row.note_id).await.expect("Failed to delete note."));

	tx.rollback().await.expect("Failed to roll back.");

	assert!(queries::fetch_note(&db, row.note_id).await.expect("Failed to fetch note.").is_some());

	let mut tx = db.pool.begin().await.expect("Failed to begin transaction.");

	assert!(queries::delete_note_tx(&mut tx, row.note_id).await.expect("Failed to delete note."));

	tx.commit().await.expect("Failed to commit.");

	let mut tx = db.pool.begin().await.expect("Failed to begin transaction.");

	assert!(!queries::delete_note_tx(&mut tx, row.note_id).await.expect("Failed to delete note."));

	tx.rollback().await.expect("Failed to roll back.");
	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to clean up test database.");
}
