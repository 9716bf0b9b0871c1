use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};

use super::connection::DatabaseManager;
use super::schema::REVIEWS_TABLE;
use crate::error::{Result, StoreError};
use crate::models::{NewReview, Review, ReviewScore};

pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    pub fn new(db: &DatabaseManager) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    pub async fn insert(&self, review: &NewReview) -> Result<Review> {
        if review.contents.is_empty() {
            return Err(StoreError::validation("contents", "review contents are required"));
        }

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO {REVIEWS_TABLE} (product_no, contents, review_score, registered_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_no, contents, review_score, registered_at, created_at
            "#
        ))
        .bind(&review.product_no)
        .bind(&review.contents)
        .bind(review.review_score.map(ReviewScore::value))
        .bind(review.registered_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_review(&row)
    }

    /// Insert with a raw score, for writers that have not validated it yet.
    ///
    /// Out-of-range values never reach the database here; the `CHECK`
    /// constraint still guards every other path.
    pub async fn insert_raw_score(
        &self,
        product_no: &str,
        contents: &str,
        review_score: Option<i32>,
    ) -> Result<Review> {
        let score = review_score.map(ReviewScore::new).transpose()?;
        let mut review = NewReview::new(product_no, contents);
        review.review_score = score;
        self.insert(&review).await
    }

    pub async fn list_by_product(&self, product_no: &str) -> Result<Vec<Review>> {
        let rows = sqlx::query(&format!(
            "SELECT id, product_no, contents, review_score, registered_at, created_at
             FROM {REVIEWS_TABLE} WHERE product_no = $1 ORDER BY id"
        ))
        .bind(product_no)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_review).collect()
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {REVIEWS_TABLE}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    fn row_to_review(row: &PgRow) -> Result<Review> {
        let raw_score: Option<i32> = row.try_get("review_score")?;
        Ok(Review {
            id: row.try_get("id")?,
            product_no: row.try_get("product_no")?,
            contents: row.try_get("contents")?,
            review_score: raw_score.map(ReviewScore::new).transpose()?,
            registered_at: row.try_get::<Option<DateTime<Utc>>, _>("registered_at")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}
