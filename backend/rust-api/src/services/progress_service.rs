use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::metrics::{COURSES_COMPLETED_TOTAL, ENROLLMENTS_TOTAL, LESSONS_COMPLETED_TOTAL};
use crate::models::{
    CourseState, CourseSummary, DashboardEnrollment, DashboardView, EnrollmentRecord,
    EnrollmentStatus, EnrollmentView, LearningStats, LessonCompletionView, LessonView,
};
use crate::store::{RecordStore, StoreError};

/// Owns the relationship between a learner, a course, its ordered lessons and
/// the learner's completion state. Identity is always an explicit argument;
/// every operation re-reads what it needs from the store, which is the single
/// source of truth.
pub struct ProgressService {
    store: Arc<dyn RecordStore>,
}

/// How an enroll call concluded. Re-enrolling is benign and hands back the
/// existing record.
#[derive(Debug)]
pub enum EnrollOutcome {
    Enrolled(EnrollmentRecord),
    AlreadyEnrolled(EnrollmentRecord),
}

impl ProgressService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Enroll a learner into a published course. Checks for an existing
    /// enrollment before inserting; the store's uniqueness constraint backs
    /// the check up against racing duplicates.
    pub async fn enroll(&self, learner_id: &str, course_id: &str) -> Result<EnrollOutcome, ApiError> {
        let course = self
            .store
            .find_course(course_id)
            .await?
            .filter(|c| c.is_published)
            .ok_or(ApiError::NotFound("course"))?;

        if let Some(existing) = self.store.find_enrollment(learner_id, course_id).await? {
            tracing::info!(
                "Learner {} already enrolled in course {}",
                learner_id,
                course_id
            );
            ENROLLMENTS_TOTAL.with_label_values(&["already_enrolled"]).inc();
            return Ok(EnrollOutcome::AlreadyEnrolled(existing));
        }

        let enrollment = EnrollmentRecord {
            id: Uuid::new_v4().to_string(),
            learner_id: learner_id.to_string(),
            course_id: course_id.to_string(),
            progress: 0.0,
            enrolled_at: Utc::now(),
            completed_at: None,
        };

        match self.store.insert_enrollment(&enrollment).await {
            Ok(()) => {
                tracing::info!(
                    "Learner {} enrolled in course {} ({})",
                    learner_id,
                    course_id,
                    course.title
                );
                ENROLLMENTS_TOTAL.with_label_values(&["enrolled"]).inc();
                Ok(EnrollOutcome::Enrolled(enrollment))
            }
            // Lost a race against a concurrent enroll; the existing record
            // is the answer.
            Err(StoreError::Duplicate { .. }) => {
                let existing = self
                    .store
                    .find_enrollment(learner_id, course_id)
                    .await?
                    .ok_or(ApiError::DuplicateEnrollment)?;
                ENROLLMENTS_TOTAL.with_label_values(&["already_enrolled"]).inc();
                Ok(EnrollOutcome::AlreadyEnrolled(existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The player view: course, ordered lessons, the learner's enrollment
    /// (absence is a valid "not enrolled" answer) and completion set.
    pub async fn course_state(
        &self,
        learner_id: &str,
        course_id: &str,
    ) -> Result<CourseState, ApiError> {
        let course = self
            .store
            .find_course(course_id)
            .await?
            .filter(|c| c.is_published)
            .ok_or(ApiError::NotFound("course"))?;

        let lessons = self.store.lessons_for_course(course_id).await?;
        let enrollment = self.store.find_enrollment(learner_id, course_id).await?;

        let lesson_ids: Vec<String> = lessons.iter().map(|l| l.id.clone()).collect();
        let progress_records = self
            .store
            .lesson_progress_for(learner_id, &lesson_ids)
            .await?;

        let completed_lesson_ids: Vec<String> = progress_records
            .iter()
            .filter(|r| r.completed)
            .map(|r| r.lesson_id.clone())
            .collect();

        Ok(CourseState {
            course: CourseSummary::from_record(&course),
            status: EnrollmentStatus::of(enrollment.as_ref()),
            completed_lessons: completed_lesson_ids.len(),
            total_lessons: lessons.len(),
            lessons: lessons.iter().map(LessonView::from_record).collect(),
            enrollment: enrollment.as_ref().map(EnrollmentView::from_record),
            completed_lesson_ids,
        })
    }

    /// Mark a lesson completed and recompute the enrollment's aggregate
    /// progress from fresh store reads. Safe to repeat: the upsert is
    /// idempotent and progress is always derived from the stored counts,
    /// never incremented, so duplicate or retried calls converge on the same
    /// state.
    pub async fn complete_lesson(
        &self,
        learner_id: &str,
        lesson_id: &str,
    ) -> Result<LessonCompletionView, ApiError> {
        let lesson = self
            .store
            .find_lesson(lesson_id)
            .await?
            .ok_or(ApiError::NotFound("lesson"))?;

        let enrollment = self
            .store
            .find_enrollment(learner_id, &lesson.course_id)
            .await?
            .ok_or(ApiError::NotEnrolled)?;

        // The live lesson set gates the write: completed records stay a
        // subset of the course's current lessons.
        let lessons = self.store.lessons_for_course(&lesson.course_id).await?;
        if lessons.is_empty() {
            return Err(ApiError::InvalidLessonSet);
        }
        if !lessons.iter().any(|l| l.id == lesson.id) {
            return Err(ApiError::NotFound("lesson"));
        }

        let prior = self
            .store
            .lesson_progress_for(learner_id, std::slice::from_ref(&lesson.id))
            .await?;
        let repeat = prior.iter().any(|r| r.completed);

        self.store
            .upsert_lesson_progress(learner_id, lesson_id, Utc::now())
            .await?;
        LESSONS_COMPLETED_TOTAL
            .with_label_values(&[if repeat { "repeat" } else { "first" }])
            .inc();

        // Recompute from fresh reads of the completed set over the live
        // lesson count, so the result stays correct when lessons are added
        // (or removed) after enrollment and when the same completion is
        // retried.
        let lesson_ids: Vec<String> = lessons.iter().map(|l| l.id.clone()).collect();
        let progress_records = self
            .store
            .lesson_progress_for(learner_id, &lesson_ids)
            .await?;
        let completed_count = progress_records.iter().filter(|r| r.completed).count();
        let total_count = lessons.len();

        let progress = (completed_count as f64 / total_count as f64) * 100.0;
        let course_completed = completed_count == total_count;
        let completed_at = course_completed.then(Utc::now);

        let updated = self
            .store
            .update_enrollment_progress(&enrollment.id, progress, completed_at)
            .await?;

        if course_completed {
            tracing::info!(
                "Learner {} completed course {} ({}/{} lessons)",
                learner_id,
                lesson.course_id,
                completed_count,
                total_count
            );
            COURSES_COMPLETED_TOTAL.inc();
        } else {
            tracing::info!(
                "Learner {} progress on course {}: {:.1}% ({}/{})",
                learner_id,
                lesson.course_id,
                updated.progress,
                completed_count,
                total_count
            );
        }

        Ok(LessonCompletionView {
            lesson_id: lesson.id,
            course_id: lesson.course_id,
            progress: updated.progress,
            completed_lessons: completed_count,
            total_lessons: total_count,
            course_completed,
        })
    }

    /// The learner's enrollments joined with course summaries, plus the
    /// aggregate stats shown on the dashboard.
    pub async fn dashboard(&self, learner_id: &str) -> Result<DashboardView, ApiError> {
        let enrollments = self.store.enrollments_for_learner(learner_id).await?;

        let mut entries = Vec::with_capacity(enrollments.len());
        for enrollment in &enrollments {
            let Some(course) = self.store.find_course(&enrollment.course_id).await? else {
                tracing::warn!(
                    "Enrollment {} references missing course {}",
                    enrollment.id,
                    enrollment.course_id
                );
                continue;
            };
            entries.push(DashboardEnrollment {
                enrollment: EnrollmentView::from_record(enrollment),
                course: CourseSummary::from_record(&course),
            });
        }

        Ok(DashboardView {
            stats: LearningStats::from_enrollments(&enrollments),
            enrollments: entries,
        })
    }
}
