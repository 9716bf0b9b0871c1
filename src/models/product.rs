use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A product row as stored in `kurly_skin_products`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: i64,
    pub product_no: String,
    pub product_name: String,
    pub review_count: i32,
    pub short_description: Option<String>,
    pub product_image_url: Option<String>,
    pub sales_price: Option<i32>,
    pub discounted_price: Option<i32>,
    pub product_notice_notices: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a product; `id` and timestamps come from the database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProduct {
    pub product_no: String,
    pub product_name: String,
    pub review_count: i32,
    pub short_description: Option<String>,
    pub product_image_url: Option<String>,
    pub sales_price: Option<i32>,
    pub discounted_price: Option<i32>,
    pub product_notice_notices: Option<Value>,
}

impl NewProduct {
    pub fn new(product_no: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            product_no: product_no.into(),
            product_name: product_name.into(),
            review_count: 0,
            short_description: None,
            product_image_url: None,
            sales_price: None,
            discounted_price: None,
            product_notice_notices: None,
        }
    }

    pub fn with_review_count(mut self, review_count: i32) -> Self {
        self.review_count = review_count;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.short_description = Some(description.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.product_image_url = Some(url.into());
        self
    }

    pub fn with_prices(mut self, sales_price: i32, discounted_price: Option<i32>) -> Self {
        self.sales_price = Some(sales_price);
        self.discounted_price = discounted_price;
        self
    }

    pub fn with_notices(mut self, notices: Value) -> Self {
        self.product_notice_notices = Some(notices);
        self
    }

    /// Both identifying fields must be non-blank
    pub fn is_valid(&self) -> bool {
        !self.product_no.trim().is_empty() && !self.product_name.trim().is_empty()
    }
}
