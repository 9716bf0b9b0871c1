use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;

/// Derived sentiment score in 1..=5, produced by an external analysis step.
///
/// Construction is the only place the range is checked on the Rust side; the
/// `CHECK` constraint on `kurly_skin_reviews.review_score` covers other writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct ReviewScore(u8);

impl ReviewScore {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 5;

    pub fn new(value: i32) -> Result<Self, StoreError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(StoreError::integrity(format!(
                "review_score must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn value(self) -> i32 {
        i32::from(self.0)
    }
}

impl TryFrom<i32> for ReviewScore {
    type Error = StoreError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ReviewScore> for i32 {
    fn from(score: ReviewScore) -> Self {
        score.value()
    }
}

impl fmt::Display for ReviewScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A review row as stored in `kurly_skin_reviews`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: i64,
    pub product_no: String,
    pub contents: String,
    pub review_score: Option<ReviewScore>,
    pub registered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a review
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewReview {
    pub product_no: String,
    pub contents: String,
    pub review_score: Option<ReviewScore>,
    pub registered_at: Option<DateTime<Utc>>,
}

impl NewReview {
    pub fn new(product_no: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            product_no: product_no.into(),
            contents: contents.into(),
            review_score: None,
            registered_at: None,
        }
    }

    pub fn with_score(mut self, score: ReviewScore) -> Self {
        self.review_score = Some(score);
        self
    }

    pub fn with_registered_at(mut self, registered_at: DateTime<Utc>) -> Self {
        self.registered_at = Some(registered_at);
        self
    }
}
