use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    bson_datetime_as_chrono, bson_datetime_as_chrono_option, course::CourseSummary,
    lesson::LessonView,
};

/// Hours credited per completed course in the dashboard stats.
const ESTIMATED_HOURS_PER_COURSE: i64 = 8;

/// Enrollment stored in the "enrollments" collection. Exactly one record per
/// (learner, course); never deleted, mutated only by progress recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub learner_id: String,
    pub course_id: String,
    /// Aggregate completion, 0..=100
    pub progress: f64,
    #[serde(rename = "enrolledAt", with = "bson_datetime_as_chrono")]
    pub enrolled_at: DateTime<Utc>,
    #[serde(
        rename = "completedAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Per-lesson completion stored in the "lesson_progress" collection. One
/// record per (learner, lesson); completion never transitions back to
/// incomplete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonProgressRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub learner_id: String,
    pub lesson_id: String,
    pub completed: bool,
    #[serde(
        rename = "completedAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Derived from the enrollment on every read; never stored.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    NotEnrolled,
    InProgress,
    Complete,
}

impl EnrollmentStatus {
    pub fn of(enrollment: Option<&EnrollmentRecord>) -> Self {
        match enrollment {
            None => EnrollmentStatus::NotEnrolled,
            Some(e) if e.completed_at.is_some() => EnrollmentStatus::Complete,
            Some(_) => EnrollmentStatus::InProgress,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentView {
    pub id: String,
    pub course_id: String,
    pub progress: f64,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl EnrollmentView {
    pub fn from_record(record: &EnrollmentRecord) -> Self {
        Self {
            id: record.id.clone(),
            course_id: record.course_id.clone(),
            progress: record.progress,
            enrolled_at: record.enrolled_at,
            completed_at: record.completed_at,
        }
    }
}

/// Composed player state: the course, its ordered lessons, the caller's
/// enrollment (absent is a valid "not enrolled" answer) and completion set.
#[derive(Debug, Serialize)]
pub struct CourseState {
    pub course: CourseSummary,
    pub lessons: Vec<LessonView>,
    pub enrollment: Option<EnrollmentView>,
    pub status: EnrollmentStatus,
    pub completed_lesson_ids: Vec<String>,
    pub completed_lessons: usize,
    pub total_lessons: usize,
}

/// Result of a lesson completion, after recomputation.
#[derive(Debug, Serialize)]
pub struct LessonCompletionView {
    pub lesson_id: String,
    pub course_id: String,
    pub progress: f64,
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub course_completed: bool,
}

#[derive(Debug, Serialize)]
pub struct DashboardEnrollment {
    pub enrollment: EnrollmentView,
    pub course: CourseSummary,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub enrollments: Vec<DashboardEnrollment>,
    pub stats: LearningStats,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LearningStats {
    pub enrolled: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub avg_progress: f64,
    pub estimated_hours: i64,
}

impl LearningStats {
    pub fn from_enrollments(enrollments: &[EnrollmentRecord]) -> Self {
        let in_progress = enrollments
            .iter()
            .filter(|e| e.completed_at.is_none() && e.progress > 0.0)
            .count();
        let completed = enrollments
            .iter()
            .filter(|e| e.completed_at.is_some())
            .count();
        let avg_progress = if enrollments.is_empty() {
            0.0
        } else {
            enrollments.iter().map(|e| e.progress).sum::<f64>() / enrollments.len() as f64
        };

        Self {
            enrolled: enrollments.len(),
            in_progress,
            completed,
            avg_progress,
            estimated_hours: completed as i64 * ESTIMATED_HOURS_PER_COURSE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enrollment(progress: f64, completed: bool) -> EnrollmentRecord {
        let now = Utc::now();
        EnrollmentRecord {
            id: uuid::Uuid::new_v4().to_string(),
            learner_id: "learner-1".to_string(),
            course_id: "course-1".to_string(),
            progress,
            enrolled_at: now,
            completed_at: completed.then_some(now),
        }
    }

    #[test]
    fn status_derivation() {
        assert_eq!(EnrollmentStatus::of(None), EnrollmentStatus::NotEnrolled);
        assert_eq!(
            EnrollmentStatus::of(Some(&enrollment(0.0, false))),
            EnrollmentStatus::InProgress
        );
        assert_eq!(
            EnrollmentStatus::of(Some(&enrollment(100.0, true))),
            EnrollmentStatus::Complete
        );
    }

    #[test]
    fn stats_over_empty_set_are_zero() {
        let stats = LearningStats::from_enrollments(&[]);
        assert_eq!(stats.enrolled, 0);
        assert_eq!(stats.avg_progress, 0.0);
        assert_eq!(stats.estimated_hours, 0);
    }

    #[test]
    fn stats_split_in_progress_and_completed() {
        let enrollments = vec![
            enrollment(0.0, false),
            enrollment(50.0, false),
            enrollment(100.0, true),
            enrollment(100.0, true),
        ];
        let stats = LearningStats::from_enrollments(&enrollments);

        // Untouched enrollments (progress 0) are not "in progress"
        assert_eq!(stats.enrolled, 4);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.avg_progress, 62.5);
        assert_eq!(stats.estimated_hours, 16);
    }
}
