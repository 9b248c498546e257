use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::course::CourseDetail;
use crate::models::review::CreateReviewRequest;
use crate::models::{
    CategoryView, CourseFilter, CourseReviews, CourseSort, CourseSummary, EnrollmentView,
    LessonOutline, ReviewRecord, ReviewView,
};
use crate::store::RecordStore;

/// Number of courses on the landing page strip.
const FEATURED_LIMIT: i64 = 6;

/// Read-mostly catalog surface: course listings, course pages, categories
/// and reviews. Courses and lessons are authored elsewhere and are read-only
/// here.
pub struct CatalogService {
    store: Arc<dyn RecordStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list_courses(&self, filter: CourseFilter) -> Result<Vec<CourseSummary>, ApiError> {
        let courses = self.store.list_courses(&filter).await?;
        Ok(courses.iter().map(CourseSummary::from_record).collect())
    }

    pub async fn featured_courses(&self) -> Result<Vec<CourseSummary>, ApiError> {
        let filter = CourseFilter {
            sort: CourseSort::MostEnrolled,
            limit: Some(FEATURED_LIMIT),
            ..CourseFilter::default()
        };
        let courses = self.store.list_courses(&filter).await?;
        Ok(courses.iter().map(CourseSummary::from_record).collect())
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryView>, ApiError> {
        let categories = self.store.list_categories().await?;
        Ok(categories.iter().map(CategoryView::from_record).collect())
    }

    /// Full course page. When a learner identity is present their enrollment
    /// is attached; lesson content stays withheld unless free-preview.
    pub async fn course_detail(
        &self,
        course_id: &str,
        learner_id: Option<&str>,
    ) -> Result<CourseDetail, ApiError> {
        let course = self
            .store
            .find_course(course_id)
            .await?
            .filter(|c| c.is_published)
            .ok_or(ApiError::NotFound("course"))?;

        let lessons = self.store.lessons_for_course(course_id).await?;
        let reviews = self.store.reviews_for_course(course_id).await?;

        let enrollment = match learner_id {
            Some(learner_id) => self
                .store
                .find_enrollment(learner_id, course_id)
                .await?
                .map(|e| EnrollmentView::from_record(&e)),
            None => None,
        };

        let total_duration_minutes = lessons
            .iter()
            .map(|l| l.duration_minutes as i64)
            .sum::<i64>();
        let review_summary = CourseReviews::from_records(&reviews);

        Ok(CourseDetail {
            course: CourseSummary::from_record(&course),
            long_description: course.long_description.clone(),
            lesson_count: lessons.len(),
            total_duration_minutes,
            lessons: lessons.iter().map(LessonOutline::from_record).collect(),
            average_rating: review_summary.average_rating,
            review_count: review_summary.count,
            enrollment,
        })
    }

    pub async fn course_reviews(&self, course_id: &str) -> Result<CourseReviews, ApiError> {
        self.store
            .find_course(course_id)
            .await?
            .filter(|c| c.is_published)
            .ok_or(ApiError::NotFound("course"))?;

        let reviews = self.store.reviews_for_course(course_id).await?;
        Ok(CourseReviews::from_records(&reviews))
    }

    /// Leave a review. Only enrolled learners can review a course.
    pub async fn create_review(
        &self,
        learner_id: &str,
        course_id: &str,
        req: &CreateReviewRequest,
    ) -> Result<ReviewView, ApiError> {
        self.store
            .find_course(course_id)
            .await?
            .filter(|c| c.is_published)
            .ok_or(ApiError::NotFound("course"))?;

        self.store
            .find_enrollment(learner_id, course_id)
            .await?
            .ok_or(ApiError::NotEnrolled)?;

        let review = ReviewRecord {
            id: Uuid::new_v4().to_string(),
            learner_id: learner_id.to_string(),
            course_id: course_id.to_string(),
            rating: req.rating,
            comment: req.comment.clone(),
            created_at: Utc::now(),
        };
        self.store.insert_review(&review).await?;

        tracing::info!(
            "Review created for course {} by learner {} (rating {})",
            course_id,
            learner_id,
            review.rating
        );

        Ok(ReviewView::from_record(&review))
    }
}
