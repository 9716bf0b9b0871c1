//! Types for the crawler's merged JSON export (a list of products, each with
//! its reviews inline). Only the fields the audits read are modeled.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DumpProduct {
    #[serde(deserialize_with = "string_or_number")]
    pub product_no: String,
    pub name: String,
    #[serde(default)]
    pub review_count: i32,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub product_vertical_medium_url: Option<String>,
    #[serde(default)]
    pub sales_price: Option<i32>,
    #[serde(default)]
    pub discounted_price: Option<i32>,
    #[serde(default)]
    pub product_notice_notices: Option<Value>,
    #[serde(default)]
    pub reviews: Vec<DumpReview>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DumpReview {
    #[serde(default)]
    pub contents: String,
    #[serde(default, rename = "registeredAt")]
    pub registered_at: Option<String>,
}

/// `product_no` is numeric in some crawls and a string in others
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "product_no must be a string or number, got {other}"
        ))),
    }
}

/// Read a merged dump from disk
pub fn load_dump(path: &Path) -> Result<Vec<DumpProduct>, StoreError> {
    let contents = std::fs::read_to_string(path)?;
    let products = serde_json::from_str(&contents)?;
    Ok(products)
}
