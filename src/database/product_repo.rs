use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashSet;

use super::connection::DatabaseManager;
use super::schema::PRODUCTS_TABLE;
use crate::error::{Result, StoreError};
use crate::models::{NewProduct, Product};

pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(db: &DatabaseManager) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Insert one product; a duplicate `product_no` is an integrity error
    pub async fn insert(&self, product: &NewProduct) -> Result<Product> {
        if !product.is_valid() {
            return Err(StoreError::validation(
                "product",
                "product_no and product_name must not be blank",
            ));
        }

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO {PRODUCTS_TABLE} (
                product_no, product_name, review_count, short_description,
                product_image_url, sales_price, discounted_price, product_notice_notices
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, product_no, product_name, review_count, short_description,
                      product_image_url, sales_price, discounted_price,
                      product_notice_notices, created_at, updated_at
            "#
        ))
        .bind(&product.product_no)
        .bind(&product.product_name)
        .bind(product.review_count)
        .bind(&product.short_description)
        .bind(&product.product_image_url)
        .bind(product.sales_price)
        .bind(product.discounted_price)
        .bind(&product.product_notice_notices)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(&row)
    }

    pub async fn get_by_product_no(&self, product_no: &str) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT id, product_no, product_name, review_count, short_description,
                    product_image_url, sales_price, discounted_price,
                    product_notice_notices, created_at, updated_at
             FROM {PRODUCTS_TABLE} WHERE product_no = $1"
        ))
        .bind(product_no)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    /// Every `product_no` currently stored
    pub async fn product_nos(&self) -> Result<HashSet<String>> {
        let rows: Vec<String> =
            sqlx::query_scalar(&format!("SELECT product_no FROM {PRODUCTS_TABLE}"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {PRODUCTS_TABLE}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        Ok(Product {
            id: row.try_get("id")?,
            product_no: row.try_get("product_no")?,
            product_name: row.try_get("product_name")?,
            review_count: row.try_get("review_count")?,
            short_description: row.try_get("short_description")?,
            product_image_url: row.try_get("product_image_url")?,
            sales_price: row.try_get("sales_price")?,
            discounted_price: row.try_get("discounted_price")?,
            product_notice_notices: row.try_get::<Option<Value>, _>("product_notice_notices")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}
