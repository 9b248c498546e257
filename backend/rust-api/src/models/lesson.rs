use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::bson_datetime_as_chrono;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    Text,
    Quiz,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Video => "video",
            ContentKind::Text => "text",
            ContentKind::Quiz => "quiz",
        }
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "video" => Ok(ContentKind::Video),
            "text" => Ok(ContentKind::Text),
            "quiz" => Ok(ContentKind::Quiz),
            _ => Err(format!("Invalid content kind: {}", value)),
        }
    }
}

/// Lesson stored in the "lessons" collection. `order_index` is unique within
/// a course and defines the only sequencing a course has.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub course_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub content_kind: ContentKind,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub duration_minutes: i32,
    pub order_index: i32,
    #[serde(default)]
    pub is_free_preview: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

/// Lesson entry on the public course page. Content is withheld unless the
/// lesson is a free preview.
#[derive(Debug, Serialize)]
pub struct LessonOutline {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub content_kind: ContentKind,
    pub duration_minutes: i32,
    pub order_index: i32,
    pub is_free_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl LessonOutline {
    pub fn from_record(record: &LessonRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            content_kind: record.content_kind,
            duration_minutes: record.duration_minutes,
            order_index: record.order_index,
            is_free_preview: record.is_free_preview,
            content: if record.is_free_preview {
                record.content.clone()
            } else {
                None
            },
        }
    }
}

/// Lesson as served to an enrolled learner in the player.
#[derive(Debug, Serialize)]
pub struct LessonView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub content_kind: ContentKind,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub duration_minutes: i32,
    pub order_index: i32,
    pub is_free_preview: bool,
}

impl LessonView {
    pub fn from_record(record: &LessonRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            content_kind: record.content_kind,
            content: record.content.clone(),
            video_url: record.video_url.clone(),
            duration_minutes: record.duration_minutes,
            order_index: record.order_index,
            is_free_preview: record.is_free_preview,
        }
    }
}

/// Index of the next lesson in an ordered list; clamps at the end, no
/// wraparound.
pub fn next_lesson_index(current: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    std::cmp::min(current + 1, total - 1)
}

/// Index of the previous lesson; clamps at the start.
pub fn previous_lesson_index(current: usize) -> usize {
    current.saturating_sub(1)
}
