use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    refresh_token::RefreshTokenRecord, CategoryRecord, CourseFilter, CourseRecord, CourseSort,
    EnrollmentRecord, LessonProgressRecord, LessonRecord, ReviewRecord, User,
};

use super::{RecordStore, Result, StoreError};

/// In-memory Record Store used by the test suites. Enforces the same
/// uniqueness and ordering guarantees as the Mongo implementation so the
/// tracker behaves identically over either backend.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    refresh_tokens: RwLock<HashMap<String, RefreshTokenRecord>>,
    categories: RwLock<Vec<CategoryRecord>>,
    courses: RwLock<HashMap<String, CourseRecord>>,
    lessons: RwLock<HashMap<String, LessonRecord>>,
    reviews: RwLock<Vec<ReviewRecord>>,
    enrollments: RwLock<HashMap<String, EnrollmentRecord>>,
    lesson_progress: RwLock<HashMap<String, LessonProgressRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Seeding helpers for tests; the learner surface never writes catalog
    // records.

    pub fn seed_category(&self, category: CategoryRecord) {
        self.categories.write().unwrap().push(category);
    }

    pub fn seed_course(&self, course: CourseRecord) {
        self.courses.write().unwrap().insert(course.id.clone(), course);
    }

    pub fn seed_lesson(&self, lesson: LessonRecord) {
        self.lessons.write().unwrap().insert(lesson.id.clone(), lesson);
    }

    pub fn remove_lesson(&self, lesson_id: &str) {
        self.lessons.write().unwrap().remove(lesson_id);
    }

    pub fn enrollment_count(&self) -> usize {
        self.enrollments.read().unwrap().len()
    }

    pub fn lesson_progress_count(&self) -> usize {
        self.lesson_progress.read().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate { entity: "user" });
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.read().unwrap().get(user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn record_login(&self, user_id: &str, at: DateTime<Utc>) -> Result<()> {
        if let Some(user) = self.users.write().unwrap().get_mut(user_id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn insert_refresh_token(&self, token: &RefreshTokenRecord) -> Result<()> {
        let mut tokens = self.refresh_tokens.write().unwrap();
        if tokens.contains_key(&token.token_hash) {
            return Err(StoreError::Duplicate {
                entity: "refresh_token",
            });
        }
        tokens.insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>> {
        Ok(self.refresh_tokens.read().unwrap().get(token_hash).cloned())
    }

    async fn revoke_refresh_token(&self, token_hash: &str, at: DateTime<Utc>) -> Result<()> {
        if let Some(token) = self.refresh_tokens.write().unwrap().get_mut(token_hash) {
            token.revoked_at = Some(at);
        }
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>> {
        let mut categories = self.categories.read().unwrap().clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_courses(&self, filter: &CourseFilter) -> Result<Vec<CourseRecord>> {
        let courses = self.courses.read().unwrap();
        let mut matched: Vec<CourseRecord> = courses
            .values()
            .filter(|c| c.is_published)
            .filter(|c| {
                filter
                    .category
                    .as_ref()
                    .map_or(true, |category| &c.category == category)
            })
            .filter(|c| filter.level.as_ref().map_or(true, |level| &c.level == level))
            .filter(|c| {
                filter
                    .q
                    .as_ref()
                    .map_or(true, |q| c.title.to_lowercase().contains(&q.to_lowercase()))
            })
            .cloned()
            .collect();

        match filter.sort {
            CourseSort::Newest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            CourseSort::MostEnrolled => {
                matched.sort_by(|a, b| b.students_count.cmp(&a.students_count))
            }
        }
        if let Some(limit) = filter.limit {
            matched.truncate(limit as usize);
        }
        Ok(matched)
    }

    async fn find_course(&self, course_id: &str) -> Result<Option<CourseRecord>> {
        Ok(self.courses.read().unwrap().get(course_id).cloned())
    }

    async fn lessons_for_course(&self, course_id: &str) -> Result<Vec<LessonRecord>> {
        let lessons = self.lessons.read().unwrap();
        let mut matched: Vec<LessonRecord> = lessons
            .values()
            .filter(|l| l.course_id == course_id && l.is_published)
            .cloned()
            .collect();
        matched.sort_by_key(|l| l.order_index);
        Ok(matched)
    }

    async fn find_lesson(&self, lesson_id: &str) -> Result<Option<LessonRecord>> {
        Ok(self.lessons.read().unwrap().get(lesson_id).cloned())
    }

    async fn insert_review(&self, review: &ReviewRecord) -> Result<()> {
        self.reviews.write().unwrap().push(review.clone());
        Ok(())
    }

    async fn reviews_for_course(&self, course_id: &str) -> Result<Vec<ReviewRecord>> {
        let mut matched: Vec<ReviewRecord> = self
            .reviews
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.course_id == course_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn insert_enrollment(&self, enrollment: &EnrollmentRecord) -> Result<()> {
        let mut enrollments = self.enrollments.write().unwrap();
        let exists = enrollments.values().any(|e| {
            e.learner_id == enrollment.learner_id && e.course_id == enrollment.course_id
        });
        if exists {
            return Err(StoreError::Duplicate {
                entity: "enrollment",
            });
        }
        enrollments.insert(enrollment.id.clone(), enrollment.clone());
        Ok(())
    }

    async fn find_enrollment(
        &self,
        learner_id: &str,
        course_id: &str,
    ) -> Result<Option<EnrollmentRecord>> {
        Ok(self
            .enrollments
            .read()
            .unwrap()
            .values()
            .find(|e| e.learner_id == learner_id && e.course_id == course_id)
            .cloned())
    }

    async fn enrollments_for_learner(&self, learner_id: &str) -> Result<Vec<EnrollmentRecord>> {
        let mut matched: Vec<EnrollmentRecord> = self
            .enrollments
            .read()
            .unwrap()
            .values()
            .filter(|e| e.learner_id == learner_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
        Ok(matched)
    }

    async fn update_enrollment_progress(
        &self,
        enrollment_id: &str,
        progress: f64,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<EnrollmentRecord> {
        let mut enrollments = self.enrollments.write().unwrap();
        let enrollment = enrollments
            .get_mut(enrollment_id)
            .ok_or(StoreError::NotFound {
                entity: "enrollment",
            })?;
        enrollment.progress = progress;
        enrollment.completed_at = completed_at;
        Ok(enrollment.clone())
    }

    async fn upsert_lesson_progress(
        &self,
        learner_id: &str,
        lesson_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<LessonProgressRecord> {
        let mut records = self.lesson_progress.write().unwrap();
        let existing = records
            .values_mut()
            .find(|r| r.learner_id == learner_id && r.lesson_id == lesson_id);

        match existing {
            Some(record) => {
                // Monotonic: a completed record keeps its original timestamp.
                if !record.completed {
                    record.completed = true;
                    record.completed_at = Some(completed_at);
                }
                Ok(record.clone())
            }
            None => {
                let record = LessonProgressRecord {
                    id: Uuid::new_v4().to_string(),
                    learner_id: learner_id.to_string(),
                    lesson_id: lesson_id.to_string(),
                    completed: true,
                    completed_at: Some(completed_at),
                };
                records.insert(record.id.clone(), record.clone());
                Ok(record)
            }
        }
    }

    async fn lesson_progress_for(
        &self,
        learner_id: &str,
        lesson_ids: &[String],
    ) -> Result<Vec<LessonProgressRecord>> {
        Ok(self
            .lesson_progress
            .read()
            .unwrap()
            .values()
            .filter(|r| r.learner_id == learner_id && lesson_ids.contains(&r.lesson_id))
            .cloned()
            .collect())
    }
}
