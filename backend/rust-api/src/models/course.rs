use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{bson_datetime_as_chrono, lesson::LessonOutline};

/// Category stored in the "categories" collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl CategoryView {
    pub fn from_record(record: &CategoryRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            icon: record.icon.clone(),
        }
    }
}

/// Course stored in the "courses" collection. Read-only on the learner
/// surface; authoring happens elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub long_description: Option<String>,
    pub category: String,
    pub level: String,
    /// Human-readable duration label, e.g. "6 weeks"
    pub duration: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub instructor_id: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub students_count: i64,
    #[serde(default)]
    pub is_published: bool,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

/// Course card returned by catalog listings and the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub level: String,
    pub duration: String,
    pub price: f64,
    pub image_url: Option<String>,
    pub rating: Option<f64>,
    pub students_count: i64,
}

impl CourseSummary {
    pub fn from_record(record: &CourseRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            category: record.category.clone(),
            level: record.level.clone(),
            duration: record.duration.clone(),
            price: record.price,
            image_url: record.image_url.clone(),
            rating: record.rating,
            students_count: record.students_count,
        }
    }
}

/// Full course page: summary plus the lesson outline and, when the caller is
/// authenticated, their enrollment.
#[derive(Debug, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: CourseSummary,
    pub long_description: Option<String>,
    pub lessons: Vec<LessonOutline>,
    pub lesson_count: usize,
    pub total_duration_minutes: i64,
    pub average_rating: Option<f64>,
    pub review_count: usize,
    pub enrollment: Option<super::EnrollmentView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CourseSort {
    /// Most recently created first
    #[default]
    Newest,
    /// Highest students_count first (featured / landing page)
    MostEnrolled,
}

/// Catalog listing filter. Only published courses are ever returned to the
/// learner surface; the store implementations apply that cut themselves.
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub category: Option<String>,
    pub level: Option<String>,
    /// Case-insensitive title search
    pub q: Option<String>,
    pub sort: CourseSort,
    pub limit: Option<i64>,
}

/// Query params for GET /api/v1/catalog/courses
#[derive(Debug, Deserialize)]
pub struct CourseListQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl CourseListQuery {
    pub fn into_filter(self) -> CourseFilter {
        CourseFilter {
            category: self.category,
            level: self.level,
            q: self.q,
            sort: CourseSort::Newest,
            limit: self.limit,
        }
    }
}
