//! Date-scoped deletion, used to undo a single bad ingestion run.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use super::schema::{has_cascade_foreign_key, PRODUCTS_TABLE, REVIEWS_TABLE};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub date: Option<NaiveDate>,
    pub reviews_deleted: u64,
    pub products_deleted: u64,
    /// Reviews from other dates removed through the cascade foreign key
    pub cascaded_reviews: u64,
    pub dry_run: bool,
}

impl PurgeReport {
    pub fn total(&self) -> u64 {
        self.reviews_deleted + self.products_deleted + self.cascaded_reviews
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Reviews outside `date` whose product is created on `date`. Only these are
/// affected by the cascade beyond the date-scoped deletes.
const CASCADE_COUNT_SQL: &str = "SELECT COUNT(*) FROM kurly_skin_reviews r
     JOIN kurly_skin_products p ON p.product_no = r.product_no
     WHERE p.created_at::date = $1 AND r.created_at::date <> $1";

/// Delete every review and product whose `created_at::date` equals `date`.
///
/// Both deletes share one transaction, reviews first. `created_at::date`
/// follows the session time zone. With the optional cascade foreign key
/// installed, deleting a product also removes its reviews from other dates;
/// those are counted in `cascaded_reviews` and logged, never relied upon.
pub async fn purge_by_date(pool: &PgPool, date: NaiveDate) -> Result<PurgeReport> {
    let cascade = has_cascade_foreign_key(pool).await?;
    let mut tx = pool.begin().await?;

    let cascaded_reviews = if cascade {
        let count: i64 = sqlx::query_scalar(CASCADE_COUNT_SQL)
            .bind(date)
            .fetch_one(&mut *tx)
            .await?;
        if count > 0 {
            warn!(
                %date,
                cascaded_reviews = count,
                "Cascade foreign key will also delete reviews created on other dates"
            );
        }
        count as u64
    } else {
        0
    };

    let reviews = sqlx::query(&format!(
        "DELETE FROM {REVIEWS_TABLE} WHERE created_at::date = $1"
    ))
    .bind(date)
    .execute(&mut *tx)
    .await?;

    let products = sqlx::query(&format!(
        "DELETE FROM {PRODUCTS_TABLE} WHERE created_at::date = $1"
    ))
    .bind(date)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let report = PurgeReport {
        date: Some(date),
        reviews_deleted: reviews.rows_affected(),
        products_deleted: products.rows_affected(),
        cascaded_reviews,
        dry_run: false,
    };

    info!(
        %date,
        reviews = report.reviews_deleted,
        products = report.products_deleted,
        cascaded = report.cascaded_reviews,
        "Purged rows by creation date"
    );

    Ok(report)
}

/// Count what [`purge_by_date`] would delete, without deleting
pub async fn preview_purge(pool: &PgPool, date: NaiveDate) -> Result<PurgeReport> {
    let reviews: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {REVIEWS_TABLE} WHERE created_at::date = $1"
    ))
    .bind(date)
    .fetch_one(pool)
    .await?;

    let products: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {PRODUCTS_TABLE} WHERE created_at::date = $1"
    ))
    .bind(date)
    .fetch_one(pool)
    .await?;

    let cascaded_reviews = if has_cascade_foreign_key(pool).await? {
        let count: i64 = sqlx::query_scalar(CASCADE_COUNT_SQL)
            .bind(date)
            .fetch_one(pool)
            .await?;
        count as u64
    } else {
        0
    };

    Ok(PurgeReport {
        date: Some(date),
        reviews_deleted: reviews as u64,
        products_deleted: products as u64,
        cascaded_reviews,
        dry_run: true,
    })
}
