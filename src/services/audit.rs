//! Consistency checks between the crawler's merged dump and the database.
//!
//! Nothing here writes to the database. The missing-products audit only
//! renders an `INSERT` script for an operator to review and apply.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::database::schema::PRODUCTS_TABLE;
use crate::models::DumpProduct;

/// Identity of a review inside a dump: `(product_no, contents, registeredAt)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ReviewKey {
    pub product_no: String,
    pub contents: String,
    pub registered_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub key: ReviewKey,
    pub occurrences: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DuplicateReport {
    pub total_reviews: usize,
    pub unique_reviews: usize,
    /// Groups seen more than once, most frequent first, then by key
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    /// Reviews that would disappear after deduplication
    pub fn redundant_reviews(&self) -> usize {
        self.total_reviews - self.unique_reviews
    }

    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }
}

pub fn find_duplicate_reviews(products: &[DumpProduct]) -> DuplicateReport {
    let mut counts: HashMap<ReviewKey, usize> = HashMap::new();
    let mut total_reviews = 0;

    for product in products {
        for review in &product.reviews {
            total_reviews += 1;
            let key = ReviewKey {
                product_no: product.product_no.clone(),
                contents: review.contents.clone(),
                registered_at: review.registered_at.clone().unwrap_or_default(),
            };
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    let unique_reviews = counts.len();
    let mut groups: Vec<DuplicateGroup> = counts
        .into_iter()
        .filter(|(_, occurrences)| *occurrences > 1)
        .map(|(key, occurrences)| DuplicateGroup { key, occurrences })
        .collect();
    groups.sort_by(|a, b| b.occurrences.cmp(&a.occurrences).then_with(|| a.key.cmp(&b.key)));

    DuplicateReport {
        total_reviews,
        unique_reviews,
        groups,
    }
}

/// Dump products whose `product_no` is absent from `existing`, sorted by
/// `product_no`. Repeated entries in the dump are reported once.
pub fn find_missing_products<'a>(
    products: &'a [DumpProduct],
    existing: &HashSet<String>,
) -> Vec<&'a DumpProduct> {
    let mut seen = HashSet::new();
    let mut missing: Vec<&DumpProduct> = products
        .iter()
        .filter(|p| !existing.contains(&p.product_no))
        .filter(|p| seen.insert(p.product_no.clone()))
        .collect();
    missing.sort_by(|a, b| a.product_no.cmp(&b.product_no));
    missing
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn optional_literal(value: Option<&str>) -> String {
    match value {
        Some(v) => quote_literal(v),
        None => "NULL".to_string(),
    }
}

fn optional_number(value: Option<i32>) -> String {
    value.map_or_else(|| "NULL".to_string(), |v| v.to_string())
}

/// Dollar-quote `body`, picking a tag that does not occur inside it
fn dollar_quote(body: &str) -> String {
    let mut tag = "notice".to_string();
    let mut suffix = 0;
    while body.contains(&format!("${tag}$")) {
        suffix += 1;
        tag = format!("notice{suffix}");
    }
    format!("${tag}${body}${tag}$")
}

fn insert_statement(product: &DumpProduct) -> String {
    let notices = product
        .product_notice_notices
        .clone()
        .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));

    format!(
        "INSERT INTO {PRODUCTS_TABLE}\n  \
         (product_no, product_name, review_count, short_description,\n   \
         product_image_url, sales_price, discounted_price, product_notice_notices, updated_at)\n\
         VALUES\n  \
         ({}, {}, {}, {},\n   {}, {}, {}, {}::jsonb, CURRENT_TIMESTAMP);",
        quote_literal(&product.product_no),
        quote_literal(&product.name),
        product.review_count,
        optional_literal(product.short_description.as_deref()),
        optional_literal(product.product_vertical_medium_url.as_deref()),
        optional_number(product.sales_price),
        optional_number(product.discounted_price),
        dollar_quote(&notices.to_string()),
    )
}

/// Render the script that would add `missing` to the products table.
///
/// The statements share one transaction so a partial apply cannot happen.
pub fn render_insert_sql(missing: &[&DumpProduct], generated_at: DateTime<Local>) -> String {
    let mut sql = String::new();
    sql.push_str("-- Missing products INSERT script\n");
    sql.push_str(&format!(
        "-- Generated at: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    sql.push_str(&format!("-- {} product(s)\n\n", missing.len()));
    sql.push_str("BEGIN;\n\n");

    let statements: Vec<String> = missing.iter().map(|p| insert_statement(p)).collect();
    sql.push_str(&statements.join("\n\n"));
    if !statements.is_empty() {
        sql.push_str("\n\n");
    }

    sql.push_str("COMMIT;\n");
    sql
}
