use std::future::IntoFuture;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Database, IndexModel};
use uuid::Uuid;

use crate::metrics::{STORE_OPERATIONS_TOTAL, STORE_OPERATION_DURATION_SECONDS};
use crate::models::{
    refresh_token::RefreshTokenRecord, CategoryRecord, CourseFilter, CourseRecord, CourseSort,
    EnrollmentRecord, LessonProgressRecord, LessonRecord, ReviewRecord, User,
};

use super::{RecordStore, Result, StoreError};

/// Upper bound on any single store call. Timeouts surface as the retryable
/// `Unavailable` class; retry policy stays with the caller.
const OP_TIMEOUT: Duration = Duration::from_secs(5);

/// MongoDB-backed Record Store.
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create the unique indexes the data model relies on: one enrollment per
    /// (learner, course), one progress record per (learner, lesson), unique
    /// user emails and refresh-token digests.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique = |keys: Document| {
            IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build()
        };

        self.run("create_index", "enrollments", async {
            self.db
                .collection::<EnrollmentRecord>("enrollments")
                .create_index(unique(doc! { "learner_id": 1, "course_id": 1 }))
                .await
                .map(|_| ())
        })
        .await?;

        self.run("create_index", "lesson_progress", async {
            self.db
                .collection::<LessonProgressRecord>("lesson_progress")
                .create_index(unique(doc! { "learner_id": 1, "lesson_id": 1 }))
                .await
                .map(|_| ())
        })
        .await?;

        self.run("create_index", "users", async {
            self.db
                .collection::<User>("users")
                .create_index(unique(doc! { "email": 1 }))
                .await
                .map(|_| ())
        })
        .await?;

        self.run("create_index", "refresh_tokens", async {
            self.db
                .collection::<RefreshTokenRecord>("refresh_tokens")
                .create_index(unique(doc! { "token_hash": 1 }))
                .await
                .map(|_| ())
        })
        .await?;

        self.run("create_index", "lessons", async {
            self.db
                .collection::<LessonRecord>("lessons")
                .create_index(unique(doc! { "course_id": 1, "order_index": 1 }))
                .await
                .map(|_| ())
        })
        .await
    }

    /// Run one driver call with the bounded timeout, classify failures and
    /// record store metrics.
    async fn run<T, F>(&self, operation: &'static str, collection: &'static str, fut: F) -> Result<T>
    where
        F: IntoFuture<Output = std::result::Result<T, mongodb::error::Error>>,
    {
        let start = Instant::now();
        let outcome = tokio::time::timeout(OP_TIMEOUT, fut).await;

        STORE_OPERATION_DURATION_SECONDS
            .with_label_values(&[operation, collection])
            .observe(start.elapsed().as_secs_f64());

        let (status, result) = match outcome {
            Ok(Ok(value)) => ("ok", Ok(value)),
            Ok(Err(e)) if is_duplicate_key(&e) => {
                ("duplicate", Err(StoreError::Duplicate { entity: collection }))
            }
            Ok(Err(e)) => {
                tracing::error!("Store operation {}.{} failed: {}", collection, operation, e);
                ("error", Err(StoreError::Unavailable(e.to_string())))
            }
            Err(_) => {
                tracing::error!(
                    "Store operation {}.{} timed out after {:?}",
                    collection,
                    operation,
                    OP_TIMEOUT
                );
                (
                    "timeout",
                    Err(StoreError::Unavailable(format!(
                        "{}.{} timed out",
                        collection, operation
                    ))),
                )
            }
        };

        STORE_OPERATIONS_TOTAL
            .with_label_values(&[operation, collection, status])
            .inc();

        result
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    match *error.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref we)) => we.code == 11000,
        ErrorKind::Command(ref ce) => ce.code == 11000,
        _ => false,
    }
}

#[async_trait]
impl RecordStore for MongoStore {
    async fn ping(&self) -> Result<()> {
        self.run("ping", "admin", async {
            self.db.run_command(doc! { "ping": 1 }).await.map(|_| ())
        })
        .await
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let collection = self.db.collection::<User>("users");
        self.run("insert_one", "users", async {
            collection.insert_one(user).await.map(|_| ())
        })
        .await
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        let collection = self.db.collection::<User>("users");
        self.run("find_one", "users", collection.find_one(doc! { "_id": user_id }))
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let collection = self.db.collection::<User>("users");
        self.run(
            "find_one",
            "users",
            collection.find_one(doc! { "email": email }),
        )
        .await
    }

    async fn record_login(&self, user_id: &str, at: DateTime<Utc>) -> Result<()> {
        let collection = self.db.collection::<User>("users");
        let update = doc! {
            "$set": { "lastLoginAt": mongodb::bson::DateTime::from_millis(at.timestamp_millis()) }
        };
        self.run("update_one", "users", async {
            collection
                .update_one(doc! { "_id": user_id }, update)
                .await
                .map(|_| ())
        })
        .await
    }

    async fn insert_refresh_token(&self, token: &RefreshTokenRecord) -> Result<()> {
        let collection = self.db.collection::<RefreshTokenRecord>("refresh_tokens");
        self.run("insert_one", "refresh_tokens", async {
            collection.insert_one(token).await.map(|_| ())
        })
        .await
    }

    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>> {
        let collection = self.db.collection::<RefreshTokenRecord>("refresh_tokens");
        self.run(
            "find_one",
            "refresh_tokens",
            collection.find_one(doc! { "token_hash": token_hash }),
        )
        .await
    }

    async fn revoke_refresh_token(&self, token_hash: &str, at: DateTime<Utc>) -> Result<()> {
        let collection = self.db.collection::<RefreshTokenRecord>("refresh_tokens");
        let update = doc! {
            "$set": { "revokedAt": mongodb::bson::DateTime::from_millis(at.timestamp_millis()) }
        };
        self.run("update_one", "refresh_tokens", async {
            collection
                .update_one(doc! { "token_hash": token_hash }, update)
                .await
                .map(|_| ())
        })
        .await
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>> {
        let collection = self.db.collection::<CategoryRecord>("categories");
        self.run("find", "categories", async {
            collection
                .find(doc! {})
                .sort(doc! { "name": 1 })
                .await?
                .try_collect()
                .await
        })
        .await
    }

    async fn list_courses(&self, filter: &CourseFilter) -> Result<Vec<CourseRecord>> {
        let collection = self.db.collection::<CourseRecord>("courses");

        let mut query = doc! { "is_published": true };
        if let Some(ref category) = filter.category {
            query.insert("category", category.as_str());
        }
        if let Some(ref level) = filter.level {
            query.insert("level", level.as_str());
        }
        if let Some(ref q) = filter.q {
            query.insert("title", doc! { "$regex": q.as_str(), "$options": "i" });
        }

        let sort = match filter.sort {
            CourseSort::Newest => doc! { "createdAt": -1 },
            CourseSort::MostEnrolled => doc! { "students_count": -1 },
        };

        let limit = filter.limit;
        self.run("find", "courses", async {
            let mut find = collection.find(query).sort(sort);
            if let Some(limit) = limit {
                find = find.limit(limit);
            }
            find.await?.try_collect().await
        })
        .await
    }

    async fn find_course(&self, course_id: &str) -> Result<Option<CourseRecord>> {
        let collection = self.db.collection::<CourseRecord>("courses");
        self.run(
            "find_one",
            "courses",
            collection.find_one(doc! { "_id": course_id }),
        )
        .await
    }

    async fn lessons_for_course(&self, course_id: &str) -> Result<Vec<LessonRecord>> {
        let collection = self.db.collection::<LessonRecord>("lessons");
        self.run("find", "lessons", async {
            collection
                .find(doc! { "course_id": course_id, "is_published": true })
                .sort(doc! { "order_index": 1 })
                .await?
                .try_collect()
                .await
        })
        .await
    }

    async fn find_lesson(&self, lesson_id: &str) -> Result<Option<LessonRecord>> {
        let collection = self.db.collection::<LessonRecord>("lessons");
        self.run(
            "find_one",
            "lessons",
            collection.find_one(doc! { "_id": lesson_id }),
        )
        .await
    }

    async fn insert_review(&self, review: &ReviewRecord) -> Result<()> {
        let collection = self.db.collection::<ReviewRecord>("reviews");
        self.run("insert_one", "reviews", async {
            collection.insert_one(review).await.map(|_| ())
        })
        .await
    }

    async fn reviews_for_course(&self, course_id: &str) -> Result<Vec<ReviewRecord>> {
        let collection = self.db.collection::<ReviewRecord>("reviews");
        self.run("find", "reviews", async {
            collection
                .find(doc! { "course_id": course_id })
                .sort(doc! { "createdAt": -1 })
                .await?
                .try_collect()
                .await
        })
        .await
    }

    async fn insert_enrollment(&self, enrollment: &EnrollmentRecord) -> Result<()> {
        let collection = self.db.collection::<EnrollmentRecord>("enrollments");
        self.run("insert_one", "enrollments", async {
            collection.insert_one(enrollment).await.map(|_| ())
        })
        .await
    }

    async fn find_enrollment(
        &self,
        learner_id: &str,
        course_id: &str,
    ) -> Result<Option<EnrollmentRecord>> {
        let collection = self.db.collection::<EnrollmentRecord>("enrollments");
        self.run(
            "find_one",
            "enrollments",
            collection.find_one(doc! { "learner_id": learner_id, "course_id": course_id }),
        )
        .await
    }

    async fn enrollments_for_learner(&self, learner_id: &str) -> Result<Vec<EnrollmentRecord>> {
        let collection = self.db.collection::<EnrollmentRecord>("enrollments");
        self.run("find", "enrollments", async {
            collection
                .find(doc! { "learner_id": learner_id })
                .sort(doc! { "enrolledAt": -1 })
                .await?
                .try_collect()
                .await
        })
        .await
    }

    async fn update_enrollment_progress(
        &self,
        enrollment_id: &str,
        progress: f64,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<EnrollmentRecord> {
        let collection = self.db.collection::<EnrollmentRecord>("enrollments");

        let completed_bson = match completed_at {
            Some(at) => {
                mongodb::bson::Bson::DateTime(mongodb::bson::DateTime::from_millis(
                    at.timestamp_millis(),
                ))
            }
            None => mongodb::bson::Bson::Null,
        };
        let update = doc! {
            "$set": { "progress": progress, "completedAt": completed_bson }
        };

        let updated = self
            .run("find_one_and_update", "enrollments", async {
                collection
                    .find_one_and_update(doc! { "_id": enrollment_id }, update)
                    .return_document(ReturnDocument::After)
                    .await
            })
            .await?;

        updated.ok_or(StoreError::NotFound {
            entity: "enrollment",
        })
    }

    async fn upsert_lesson_progress(
        &self,
        learner_id: &str,
        lesson_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<LessonProgressRecord> {
        let collection = self.db.collection::<LessonProgressRecord>("lesson_progress");
        let filter = doc! { "learner_id": learner_id, "lesson_id": lesson_id };

        // Already-completed records are left untouched so repeated calls
        // converge on the same record, timestamp included.
        let existing = self
            .run("find_one", "lesson_progress", collection.find_one(filter.clone()))
            .await?;
        if let Some(record) = existing {
            if record.completed {
                return Ok(record);
            }
        }

        let update = doc! {
            "$set": {
                "completed": true,
                "completedAt": mongodb::bson::DateTime::from_millis(completed_at.timestamp_millis()),
            },
            "$setOnInsert": {
                "_id": Uuid::new_v4().to_string(),
                "learner_id": learner_id,
                "lesson_id": lesson_id,
            },
        };
        self.run("update_one", "lesson_progress", async {
            collection
                .update_one(filter.clone(), update)
                .upsert(true)
                .await
                .map(|_| ())
        })
        .await?;

        let record = self
            .run("find_one", "lesson_progress", collection.find_one(filter))
            .await?;
        record.ok_or(StoreError::NotFound {
            entity: "lesson_progress",
        })
    }

    async fn lesson_progress_for(
        &self,
        learner_id: &str,
        lesson_ids: &[String],
    ) -> Result<Vec<LessonProgressRecord>> {
        let collection = self.db.collection::<LessonProgressRecord>("lesson_progress");
        let filter = doc! {
            "learner_id": learner_id,
            "lesson_id": { "$in": lesson_ids.to_vec() },
        };
        self.run("find", "lesson_progress", async {
            collection.find(filter).await?.try_collect().await
        })
        .await
    }
}
