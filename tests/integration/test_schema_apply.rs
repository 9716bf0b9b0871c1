//! Schema creation against a live PostgreSQL server.
//!
//! The `#[ignore]` tests need `DATABASE_URL`. Each test works inside its own
//! Postgres schema, dropped and recreated on setup:
//!
//! ```bash
//! DATABASE_URL=postgres://root@localhost/kurly_reviews cargo test --test test_schema_apply -- --ignored
//! ```

use kurly_store::config::DatabaseConfig;
use kurly_store::database::schema::has_cascade_foreign_key;
use kurly_store::database::{
    ensure_schema, schema_status, DatabaseManager, ProductRepository, ReviewRepository,
    SchemaOptions, TextSearchIndex,
};
use kurly_store::models::{NewProduct, NewReview, ReviewScore};
use kurly_store::StoreError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::Mutex;

// pg_trgm is database-wide; tests that touch it run one at a time
static TRGM_LOCK: Mutex<()> = Mutex::const_new(());

const EXTENSION_SCHEMA: &str = "kurly_test_extensions";

async fn admin_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for PostgreSQL tests");
    PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .expect("failed to connect to PostgreSQL")
}

async fn trgm_schema(pool: &PgPool) -> Option<String> {
    sqlx::query_scalar(
        "SELECT n.nspname::text FROM pg_extension e
         JOIN pg_namespace n ON n.oid = e.extnamespace
         WHERE e.extname = 'pg_trgm'",
    )
    .fetch_optional(pool)
    .await
    .unwrap()
}

async fn fresh_database(label: &str) -> (DatabaseManager, String) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for PostgreSQL tests");
    let schema = format!("kurly_test_{label}_{}", std::process::id());

    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .expect("failed to connect to PostgreSQL");
    sqlx::query(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
        .execute(&admin)
        .await
        .expect("failed to drop test schema");
    admin.close().await;

    let config = DatabaseConfig {
        url: Some(url),
        schema: Some(schema.clone()),
        max_connections: 2,
        ..Default::default()
    };
    let db = DatabaseManager::connect(&config)
        .await
        .expect("failed to connect with test schema");
    (db, schema)
}

fn simple_options(schema: &str) -> SchemaOptions {
    SchemaOptions::default()
        .with_text_search(TextSearchIndex::Simple)
        .with_schema(Some(schema.to_string()))
}

#[tokio::test]
#[ignore = "requires running PostgreSQL (DATABASE_URL)"]
async fn test_apply_creates_tables_and_views() {
    let (db, schema) = fresh_database("create").await;

    let report = ensure_schema(db.pool(), &simple_options(&schema)).await.unwrap();
    assert_eq!(report.created_tables.len(), 2);
    assert!(report.existing_tables.is_empty());
    assert_eq!(report.views_replaced.len(), 2);

    let status = schema_status(db.pool()).await.unwrap();
    for (table, rows) in &status.tables {
        assert_eq!(*rows, Some(0), "{table} should exist and be empty");
    }
    for (view, exists) in &status.views {
        assert!(*exists, "{view} should exist");
    }
    assert!(!status.cascade_foreign_key);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL (DATABASE_URL)"]
async fn test_reapply_keeps_existing_rows() {
    let (db, schema) = fresh_database("reapply").await;
    let options = simple_options(&schema);
    ensure_schema(db.pool(), &options).await.unwrap();

    let products = ProductRepository::new(&db);
    let reviews = ReviewRepository::new(&db);
    products
        .insert(&NewProduct::new("5012345", "수분 토너").with_review_count(2))
        .await
        .unwrap();
    reviews
        .insert(&NewReview::new("5012345", "촉촉해요").with_score(ReviewScore::new(5).unwrap()))
        .await
        .unwrap();

    let report = ensure_schema(db.pool(), &options).await.unwrap();
    assert!(report.created_tables.is_empty());
    assert_eq!(report.existing_tables.len(), 2);

    assert_eq!(products.count().await.unwrap(), 1);
    assert_eq!(reviews.count().await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL (DATABASE_URL)"]
async fn test_score_constraint_rejects_out_of_range() {
    let (db, schema) = fresh_database("score").await;
    ensure_schema(db.pool(), &simple_options(&schema)).await.unwrap();
    let reviews = ReviewRepository::new(&db);

    for score in [1, 3, 5] {
        let review = reviews
            .insert_raw_score("1", &format!("score {score}"), Some(score))
            .await
            .unwrap();
        assert_eq!(review.review_score.map(ReviewScore::value), Some(score));
    }

    let unscored = reviews.insert_raw_score("1", "not analyzed yet", None).await.unwrap();
    assert!(unscored.review_score.is_none());

    for score in [0, 6, -1] {
        let err = reviews
            .insert_raw_score("1", "bad", Some(score))
            .await
            .unwrap_err();
        assert!(err.is_integrity(), "score {score} should be rejected: {err}");
    }

    // The CHECK constraint guards writers that bypass the repository
    let err: StoreError = sqlx::query(
        "INSERT INTO kurly_skin_reviews (product_no, contents, review_score) VALUES ('1', 'raw', 6)",
    )
    .execute(db.pool())
    .await
    .unwrap_err()
    .into();
    assert!(err.is_integrity(), "{err}");

    assert_eq!(reviews.count().await.unwrap(), 4);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_product_no_is_integrity_error() {
    let (db, schema) = fresh_database("unique").await;
    ensure_schema(db.pool(), &simple_options(&schema)).await.unwrap();
    let products = ProductRepository::new(&db);

    products.insert(&NewProduct::new("77", "크림")).await.unwrap();
    let err = products.insert(&NewProduct::new("77", "크림 리필")).await.unwrap_err();
    assert!(err.is_integrity());

    let stored = products.get_by_product_no("77").await.unwrap().unwrap();
    assert_eq!(stored.product_name, "크림");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL (DATABASE_URL)"]
async fn test_updated_at_trigger_refreshes_timestamp() {
    let (db, schema) = fresh_database("trigger").await;
    ensure_schema(db.pool(), &simple_options(&schema)).await.unwrap();
    let products = ProductRepository::new(&db);

    let before = products.insert(&NewProduct::new("9", "선크림")).await.unwrap();
    sqlx::query("SELECT pg_sleep(0.05)").execute(db.pool()).await.unwrap();
    sqlx::query("UPDATE kurly_skin_products SET product_name = '선크림 SPF50' WHERE product_no = '9'")
        .execute(db.pool())
        .await
        .unwrap();

    let after = products.get_by_product_no("9").await.unwrap().unwrap();
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL (DATABASE_URL)"]
async fn test_cascade_foreign_key_is_opt_in() {
    let (db, schema) = fresh_database("cascade").await;
    ensure_schema(db.pool(), &simple_options(&schema)).await.unwrap();
    assert!(!has_cascade_foreign_key(db.pool()).await.unwrap());

    let options = simple_options(&schema).with_cascade_foreign_key(true);
    ensure_schema(db.pool(), &options).await.unwrap();
    ensure_schema(db.pool(), &options).await.unwrap();
    assert!(has_cascade_foreign_key(db.pool()).await.unwrap());

    // Reviews must now reference an existing product
    let err = ReviewRepository::new(&db)
        .insert(&NewReview::new("missing", "orphan"))
        .await
        .unwrap_err();
    assert!(err.is_integrity());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL with the pg_trgm extension available"]
async fn test_trigram_index_supports_substring_search() {
    let _guard = TRGM_LOCK.lock().await;
    let (db, schema) = fresh_database("trigram").await;
    let options = SchemaOptions::default().with_schema(Some(schema.clone()));
    ensure_schema(db.pool(), &options).await.unwrap();

    let index: Option<String> = sqlx::query_scalar(
        "SELECT indexname::text FROM pg_indexes
         WHERE schemaname = $1 AND indexname = 'idx_kurly_skin_reviews_contents_trgm'",
    )
    .bind(&schema)
    .fetch_optional(db.pool())
    .await
    .unwrap();
    assert!(index.is_some());

    let reviews = ReviewRepository::new(&db);
    reviews.insert(&NewReview::new("1", "피부가 촉촉해져요")).await.unwrap();
    reviews.insert(&NewReview::new("1", "향이 강해요")).await.unwrap();

    let hits: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kurly_skin_reviews WHERE contents LIKE '%촉촉%'")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(hits, 1);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL with the pg_trgm extension available"]
async fn test_trigram_index_uses_extension_outside_public() {
    let _guard = TRGM_LOCK.lock().await;
    let admin = admin_pool().await;
    let original = trgm_schema(&admin).await;

    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {EXTENSION_SCHEMA}"))
        .execute(&admin)
        .await
        .unwrap();
    match original.as_deref() {
        None => {
            sqlx::query(&format!("CREATE EXTENSION pg_trgm WITH SCHEMA {EXTENSION_SCHEMA}"))
                .execute(&admin)
                .await
                .unwrap();
        }
        Some(current) if current != EXTENSION_SCHEMA => {
            sqlx::query(&format!("ALTER EXTENSION pg_trgm SET SCHEMA {EXTENSION_SCHEMA}"))
                .execute(&admin)
                .await
                .unwrap();
        }
        Some(_) => {}
    }

    let (db, schema) = fresh_database("trgm_elsewhere").await;
    let options = SchemaOptions::default().with_schema(Some(schema.clone()));
    let first = ensure_schema(db.pool(), &options).await;
    let second = ensure_schema(db.pool(), &options).await;
    let indexdef: Option<String> = sqlx::query_scalar(
        "SELECT indexdef FROM pg_indexes
         WHERE schemaname = $1 AND indexname = 'idx_kurly_skin_reviews_contents_trgm'",
    )
    .bind(&schema)
    .fetch_optional(&admin)
    .await
    .unwrap();
    db.close().await;

    // Put the extension back before asserting
    let restore_to = original.unwrap_or_else(|| "public".to_string());
    if restore_to != EXTENSION_SCHEMA {
        sqlx::query(&format!("ALTER EXTENSION pg_trgm SET SCHEMA {restore_to}"))
            .execute(&admin)
            .await
            .unwrap();
        sqlx::query(&format!("DROP SCHEMA IF EXISTS {EXTENSION_SCHEMA}"))
            .execute(&admin)
            .await
            .unwrap();
    }

    assert!(first.is_ok(), "{:?}", first.err());
    assert!(second.is_ok(), "{:?}", second.err());
    let indexdef = indexdef.expect("trigram index should exist");
    assert!(
        indexdef.contains(&format!("{EXTENSION_SCHEMA}.gin_trgm_ops")),
        "{indexdef}"
    );
}

#[tokio::test]
#[ignore = "requires running PostgreSQL (DATABASE_URL)"]
async fn test_schema_option_wins_over_pool_search_path() {
    let admin = admin_pool().await;
    let schema = format!("kurly_test_plainpool_{}", std::process::id());
    sqlx::query(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
        .execute(&admin)
        .await
        .unwrap();

    // The pool has no search_path for the schema; the DDL must still land there
    let options = SchemaOptions::default()
        .with_text_search(TextSearchIndex::Simple)
        .with_schema(Some(schema.clone()));
    let report = ensure_schema(&admin, &options).await.unwrap();
    assert_eq!(report.created_tables.len(), 2);

    for relation in [
        "kurly_skin_products",
        "kurly_skin_reviews",
        "kurly_skin_product_stats",
        "kurly_skin_recent_reviews",
    ] {
        let found: Option<String> = sqlx::query_scalar("SELECT to_regclass($1)::text")
            .bind(format!("{schema}.{relation}"))
            .fetch_one(&admin)
            .await
            .unwrap();
        assert!(found.is_some(), "{relation} missing from {schema}");
    }

    let report = ensure_schema(&admin, &options).await.unwrap();
    assert!(report.created_tables.is_empty());
    assert_eq!(report.existing_tables.len(), 2);

    // The search_path change does not outlive the transaction
    let current: String = sqlx::query_scalar("SELECT current_schema()::text")
        .fetch_one(&admin)
        .await
        .unwrap();
    assert_ne!(current, schema);

    sqlx::query(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
        .execute(&admin)
        .await
        .unwrap();
}
