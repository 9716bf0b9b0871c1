//! Relational schema for the review dataset.
//!
//! Tables and indexes are created only when absent; views are always
//! replaced. Re-applying against a populated database changes nothing.

use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::config::validate_schema_name;
use crate::error::Result;

pub const PRODUCTS_TABLE: &str = "kurly_skin_products";
pub const REVIEWS_TABLE: &str = "kurly_skin_reviews";
pub const STATS_VIEW: &str = "kurly_skin_product_stats";
pub const RECENT_VIEW: &str = "kurly_skin_recent_reviews";

pub const BASE_TABLES: [&str; 2] = [PRODUCTS_TABLE, REVIEWS_TABLE];
pub const VIEWS: [&str; 2] = [STATS_VIEW, RECENT_VIEW];

/// Name of the optional reviews → products foreign key
pub const CASCADE_FK_NAME: &str = "fk_kurly_skin_reviews_product";

/// Characters kept in the recent-reviews preview
pub const PREVIEW_CHARS: usize = 100;

/// Index backing keyword search over review contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSearchIndex {
    /// `pg_trgm` GIN index; matches substrings, no word segmentation needed
    #[default]
    Trigram,
    /// GIN over `to_tsvector('simple', contents)`; no extension required
    Simple,
}

impl fmt::Display for TextSearchIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextSearchIndex::Trigram => write!(f, "trigram"),
            TextSearchIndex::Simple => write!(f, "simple"),
        }
    }
}

impl FromStr for TextSearchIndex {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trigram" | "trgm" => Ok(TextSearchIndex::Trigram),
            "simple" | "fts" => Ok(TextSearchIndex::Simple),
            _ => Err(format!("Unknown text search index: {s}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaOptions {
    pub text_search: TextSearchIndex,
    /// Add `ON DELETE CASCADE` from reviews to products. Off by default:
    /// with it, date-scoped purges also drop reviews outside the date.
    pub cascade_foreign_key: bool,
    /// Postgres schema to create before the tables
    pub schema: Option<String>,
}

impl SchemaOptions {
    pub fn with_text_search(mut self, text_search: TextSearchIndex) -> Self {
        self.text_search = text_search;
        self
    }

    pub fn with_cascade_foreign_key(mut self, enabled: bool) -> Self {
        self.cascade_foreign_key = enabled;
        self
    }

    pub fn with_schema(mut self, schema: Option<String>) -> Self {
        self.schema = schema;
        self
    }
}

/// Outcome of [`ensure_schema`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaReport {
    /// Tables that did not exist before this run
    pub created_tables: Vec<String>,
    /// Tables that already existed and were left untouched
    pub existing_tables: Vec<String>,
    pub views_replaced: Vec<String>,
    pub statements_executed: usize,
}

/// Live state of the schema objects
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaStatus {
    pub tables: Vec<(String, Option<u64>)>,
    pub views: Vec<(String, bool)>,
    pub cascade_foreign_key: bool,
}

fn products_table_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {PRODUCTS_TABLE} (
            id BIGSERIAL PRIMARY KEY,
            product_no TEXT NOT NULL UNIQUE,
            product_name TEXT NOT NULL,
            review_count INTEGER NOT NULL DEFAULT 0,
            short_description TEXT,
            product_image_url TEXT,
            sales_price INTEGER,
            discounted_price INTEGER,
            product_notice_notices JSONB,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )"
    )
}

fn reviews_table_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {REVIEWS_TABLE} (
            id BIGSERIAL PRIMARY KEY,
            product_no TEXT NOT NULL,
            contents TEXT NOT NULL,
            review_score INTEGER,
            registered_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CONSTRAINT chk_kurly_skin_reviews_score CHECK (review_score BETWEEN 1 AND 5)
        )"
    )
}

fn index_sql() -> Vec<String> {
    vec![
        format!("CREATE INDEX IF NOT EXISTS idx_kurly_skin_products_product_no ON {PRODUCTS_TABLE} (product_no)"),
        format!("CREATE INDEX IF NOT EXISTS idx_kurly_skin_products_created_at ON {PRODUCTS_TABLE} (created_at)"),
        format!("CREATE INDEX IF NOT EXISTS idx_kurly_skin_reviews_product_no ON {REVIEWS_TABLE} (product_no)"),
        format!("CREATE INDEX IF NOT EXISTS idx_kurly_skin_reviews_created_at ON {REVIEWS_TABLE} (created_at)"),
        format!("CREATE INDEX IF NOT EXISTS idx_kurly_skin_reviews_review_score ON {REVIEWS_TABLE} (review_score)"),
        format!("CREATE INDEX IF NOT EXISTS idx_kurly_skin_reviews_registered_at ON {REVIEWS_TABLE} (registered_at)"),
    ]
}

fn text_search_sql(text_search: TextSearchIndex) -> Vec<String> {
    match text_search {
        TextSearchIndex::Trigram => vec![
            "CREATE EXTENSION IF NOT EXISTS pg_trgm WITH SCHEMA public".to_string(),
            // The extension may already live in another schema; qualify the
            // opclass with wherever it is installed.
            format!(
                "DO $$
                 DECLARE
                     ext_schema name;
                 BEGIN
                     SELECT n.nspname INTO ext_schema
                     FROM pg_extension e
                     JOIN pg_namespace n ON n.oid = e.extnamespace
                     WHERE e.extname = 'pg_trgm';

                     EXECUTE format(
                         'CREATE INDEX IF NOT EXISTS idx_kurly_skin_reviews_contents_trgm
                          ON {REVIEWS_TABLE} USING gin (contents %I.gin_trgm_ops)',
                         ext_schema
                     );
                 END
                 $$"
            ),
        ],
        TextSearchIndex::Simple => vec![format!(
            "CREATE INDEX IF NOT EXISTS idx_kurly_skin_reviews_contents_fts
             ON {REVIEWS_TABLE} USING gin (to_tsvector('simple', contents))"
        )],
    }
}

fn updated_at_trigger_sql() -> Vec<String> {
    vec![
        "CREATE OR REPLACE FUNCTION kurly_skin_touch_updated_at() RETURNS trigger AS $$
         BEGIN
             NEW.updated_at = CURRENT_TIMESTAMP;
             RETURN NEW;
         END;
         $$ LANGUAGE plpgsql"
            .to_string(),
        format!(
            "DO $$
             BEGIN
                 IF NOT EXISTS (
                     SELECT 1 FROM pg_trigger
                     WHERE tgname = 'trg_kurly_skin_products_updated_at'
                       AND tgrelid = '{PRODUCTS_TABLE}'::regclass
                 ) THEN
                     CREATE TRIGGER trg_kurly_skin_products_updated_at
                     BEFORE UPDATE ON {PRODUCTS_TABLE}
                     FOR EACH ROW EXECUTE FUNCTION kurly_skin_touch_updated_at();
                 END IF;
             END
             $$"
        ),
    ]
}

fn cascade_fk_sql() -> String {
    format!(
        "DO $$
         BEGIN
             IF NOT EXISTS (
                 SELECT 1 FROM pg_constraint
                 WHERE conname = '{CASCADE_FK_NAME}'
                   AND conrelid = '{REVIEWS_TABLE}'::regclass
             ) THEN
                 ALTER TABLE {REVIEWS_TABLE}
                 ADD CONSTRAINT {CASCADE_FK_NAME}
                 FOREIGN KEY (product_no) REFERENCES {PRODUCTS_TABLE} (product_no)
                 ON DELETE CASCADE;
             END IF;
         END
         $$"
    )
}

fn stats_view_sql() -> String {
    format!(
        "CREATE OR REPLACE VIEW {STATS_VIEW} AS
         SELECT
             p.product_no,
             p.product_name,
             p.review_count AS total_reviews,
             COUNT(r.id) AS analyzed_reviews,
             ROUND(AVG(r.review_score), 2)::double precision AS avg_score,
             COUNT(*) FILTER (WHERE r.review_score = 1) AS score_1,
             COUNT(*) FILTER (WHERE r.review_score = 2) AS score_2,
             COUNT(*) FILTER (WHERE r.review_score = 3) AS score_3,
             COUNT(*) FILTER (WHERE r.review_score = 4) AS score_4,
             COUNT(*) FILTER (WHERE r.review_score = 5) AS score_5
         FROM {PRODUCTS_TABLE} p
         LEFT JOIN {REVIEWS_TABLE} r ON r.product_no = p.product_no
         GROUP BY p.id, p.product_no, p.product_name, p.review_count"
    )
}

fn recent_view_sql() -> String {
    format!(
        "CREATE OR REPLACE VIEW {RECENT_VIEW} AS
         SELECT
             r.id AS review_id,
             p.product_name,
             LEFT(r.contents, {PREVIEW_CHARS}) AS contents_preview,
             r.review_score,
             r.registered_at,
             r.created_at
         FROM {REVIEWS_TABLE} r
         JOIN {PRODUCTS_TABLE} p ON p.product_no = r.product_no
         ORDER BY r.created_at DESC"
    )
}

/// Every statement [`ensure_schema`] runs, in order
pub fn schema_statements(options: &SchemaOptions) -> Result<Vec<String>> {
    let mut statements = Vec::new();

    if let Some(schema) = &options.schema {
        validate_schema_name(schema)?;
        statements.push(format!("CREATE SCHEMA IF NOT EXISTS {schema}"));
        // Unqualified DDL below lands in the target schema whatever the pool's search_path
        statements.push(format!("SET LOCAL search_path TO {schema}, public"));
    }

    statements.push(products_table_sql());
    statements.push(reviews_table_sql());
    statements.extend(index_sql());
    statements.extend(text_search_sql(options.text_search));
    statements.extend(updated_at_trigger_sql());

    if options.cascade_foreign_key {
        statements.push(cascade_fk_sql());
    }

    statements.push(stats_view_sql());
    statements.push(recent_view_sql());

    Ok(statements)
}

/// Whether `name` exists in `schema`, or in `current_schema()` when none is
/// given. Never falls through to later `search_path` entries.
async fn relation_exists(pool: &PgPool, schema: Option<&str>, name: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM pg_class c
             JOIN pg_namespace n ON n.oid = c.relnamespace
             WHERE c.relname = $1 AND n.nspname = COALESCE($2, current_schema())
         )",
    )
    .bind(name)
    .bind(schema)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Create missing tables, indexes and constraints and replace both views.
///
/// Runs in a single transaction, so a failure leaves the schema as it was.
pub async fn ensure_schema(pool: &PgPool, options: &SchemaOptions) -> Result<SchemaReport> {
    let statements = schema_statements(options)?;
    let mut report = SchemaReport::default();

    for table in BASE_TABLES {
        if relation_exists(pool, options.schema.as_deref(), table).await? {
            report.existing_tables.push(table.to_string());
        } else {
            report.created_tables.push(table.to_string());
        }
    }

    let mut tx = pool.begin().await?;
    for statement in &statements {
        debug!(sql = %statement, "Applying schema statement");
        sqlx::query(statement).execute(&mut *tx).await?;
        report.statements_executed += 1;
    }
    tx.commit().await?;

    report.views_replaced = VIEWS.iter().map(|v| v.to_string()).collect();

    info!(
        created = ?report.created_tables,
        existing = ?report.existing_tables,
        statements = report.statements_executed,
        text_search = %options.text_search,
        cascade_fk = options.cascade_foreign_key,
        "Schema ensured"
    );

    Ok(report)
}

/// True when the optional cascade foreign key is installed
pub async fn has_cascade_foreign_key(pool: &PgPool) -> Result<bool> {
    if !relation_exists(pool, None, REVIEWS_TABLE).await? {
        return Ok(false);
    }

    let present: bool = sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM pg_constraint
             WHERE conname = $1 AND conrelid = to_regclass($2)
         )",
    )
    .bind(CASCADE_FK_NAME)
    .bind(REVIEWS_TABLE)
    .fetch_one(pool)
    .await?;

    Ok(present)
}

pub async fn schema_status(pool: &PgPool) -> Result<SchemaStatus> {
    let mut tables = Vec::new();
    for table in BASE_TABLES {
        let row_count = if relation_exists(pool, None, table).await? {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(pool)
                .await?;
            Some(count as u64)
        } else {
            None
        };
        tables.push((table.to_string(), row_count));
    }

    let mut views = Vec::new();
    for view in VIEWS {
        views.push((view.to_string(), relation_exists(pool, None, view).await?));
    }

    Ok(SchemaStatus {
        tables,
        views,
        cascade_foreign_key: has_cascade_foreign_key(pool).await?,
    })
}
