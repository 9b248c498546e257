use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    refresh_token::RefreshTokenRecord, CategoryRecord, CourseFilter, CourseRecord,
    EnrollmentRecord, LessonProgressRecord, LessonRecord, ReviewRecord, User,
};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by Record Store implementations. `Unavailable` is the
/// transient class: callers may retry the same logical operation safely.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate {entity}")]
    Duplicate { entity: &'static str },

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage behind the API. The Mongo implementation backs the
/// running service; the in-memory one backs the test suites. Implementations
/// must enforce the uniqueness rules called out per method and keep every
/// call bounded in time.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Liveness probe for /health.
    async fn ping(&self) -> Result<()>;

    // === Users ===

    /// Insert a user. `Duplicate` when the email is already registered.
    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn find_user(&self, user_id: &str) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn record_login(&self, user_id: &str, at: DateTime<Utc>) -> Result<()>;

    // === Refresh tokens ===

    async fn insert_refresh_token(&self, token: &RefreshTokenRecord) -> Result<()>;

    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>>;

    async fn revoke_refresh_token(&self, token_hash: &str, at: DateTime<Utc>) -> Result<()>;

    // === Catalog ===

    /// Categories sorted by name.
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>>;

    /// Published courses matching the filter, ordered per `filter.sort`.
    async fn list_courses(&self, filter: &CourseFilter) -> Result<Vec<CourseRecord>>;

    async fn find_course(&self, course_id: &str) -> Result<Option<CourseRecord>>;

    /// Published lessons of a course ordered by `order_index` ascending.
    async fn lessons_for_course(&self, course_id: &str) -> Result<Vec<LessonRecord>>;

    async fn find_lesson(&self, lesson_id: &str) -> Result<Option<LessonRecord>>;

    // === Reviews ===

    async fn insert_review(&self, review: &ReviewRecord) -> Result<()>;

    /// Reviews for a course, newest first.
    async fn reviews_for_course(&self, course_id: &str) -> Result<Vec<ReviewRecord>>;

    // === Enrollments & progress ===

    /// Insert an enrollment. `Duplicate` when one already exists for the
    /// (learner, course) pair.
    async fn insert_enrollment(&self, enrollment: &EnrollmentRecord) -> Result<()>;

    async fn find_enrollment(
        &self,
        learner_id: &str,
        course_id: &str,
    ) -> Result<Option<EnrollmentRecord>>;

    /// All enrollments of a learner, most recently enrolled first.
    async fn enrollments_for_learner(&self, learner_id: &str) -> Result<Vec<EnrollmentRecord>>;

    /// Overwrite progress/completed_at on an enrollment. `NotFound` when the
    /// enrollment id does not exist.
    async fn update_enrollment_progress(
        &self,
        enrollment_id: &str,
        progress: f64,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<EnrollmentRecord>;

    /// Mark a lesson completed for a learner: insert if absent, else set
    /// completed. Monotonic; repeated calls return the same single record
    /// and never reset an earlier completion timestamp.
    async fn upsert_lesson_progress(
        &self,
        learner_id: &str,
        lesson_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<LessonProgressRecord>;

    /// The learner's progress records restricted to the given lesson ids.
    async fn lesson_progress_for(
        &self,
        learner_id: &str,
        lesson_ids: &[String],
    ) -> Result<Vec<LessonProgressRecord>>;
}
