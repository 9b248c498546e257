use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::bson_datetime_as_chrono;

/// Review stored in the "reviews" collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub learner_id: String,
    pub course_id: String,
    /// 1..=5
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewView {
    pub id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReviewView {
    pub fn from_record(record: &ReviewRecord) -> Self {
        Self {
            id: record.id.clone(),
            rating: record.rating,
            comment: record.comment.clone(),
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CourseReviews {
    pub average_rating: Option<f64>,
    pub count: usize,
    pub reviews: Vec<ReviewView>,
}

impl CourseReviews {
    pub fn from_records(records: &[ReviewRecord]) -> Self {
        let average_rating = if records.is_empty() {
            None
        } else {
            Some(records.iter().map(|r| r.rating as f64).sum::<f64>() / records.len() as f64)
        };

        Self {
            average_rating,
            count: records.len(),
            reviews: records.iter().map(ReviewView::from_record).collect(),
        }
    }
}
