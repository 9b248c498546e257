pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod refresh_token;
pub mod review;
pub mod user;

pub use course::{
    CategoryRecord, CategoryView, CourseFilter, CourseRecord, CourseSort, CourseSummary,
};
pub use enrollment::{
    CourseState, DashboardEnrollment, DashboardView, EnrollmentRecord, EnrollmentStatus,
    EnrollmentView, LearningStats, LessonCompletionView, LessonProgressRecord,
};
pub use lesson::{ContentKind, LessonOutline, LessonRecord, LessonView};
pub use review::{CourseReviews, ReviewRecord, ReviewView};
pub use user::{User, UserProfile, UserRole};

// Serde converters for chrono::DateTime <-> mongodb::bson::DateTime, shared by
// all record types persisted through the Mongo store.
pub(crate) mod bson_datetime_as_chrono {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bson_dt = bson::DateTime::from_millis(date.timestamp_millis());
        bson_dt.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bson_dt = bson::DateTime::deserialize(deserializer)?;
        DateTime::from_timestamp_millis(bson_dt.timestamp_millis())
            .ok_or_else(|| serde::de::Error::custom("timestamp out of range"))
    }
}

pub(crate) mod bson_datetime_as_chrono_option {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => {
                let bson_dt = bson::DateTime::from_millis(d.timestamp_millis());
                serializer.serialize_some(&bson_dt)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt_bson_dt: Option<bson::DateTime> = Option::deserialize(deserializer)?;
        Ok(opt_bson_dt
            .and_then(|bson_dt| DateTime::from_timestamp_millis(bson_dt.timestamp_millis())))
    }
}
