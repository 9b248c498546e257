use std::sync::Arc;

use ujuzi_api::errors::ApiError;
use ujuzi_api::models::EnrollmentStatus;
use ujuzi_api::services::progress_service::{EnrollOutcome, ProgressService};
use ujuzi_api::store::{MemoryStore, RecordStore};

mod common;

fn setup(lesson_count: usize) -> (ProgressService, Arc<MemoryStore>, Vec<String>) {
    let store = Arc::new(MemoryStore::new());
    let lesson_ids = common::seed_course(&store, "course-1", lesson_count);
    let service = ProgressService::new(store.clone());
    (service, store, lesson_ids)
}

async fn enroll(service: &ProgressService, learner: &str) {
    match service.enroll(learner, "course-1").await.unwrap() {
        EnrollOutcome::Enrolled(_) => {}
        EnrollOutcome::AlreadyEnrolled(_) => panic!("expected a fresh enrollment"),
    }
}

#[tokio::test]
async fn four_lesson_scenario_hits_quarter_steps() {
    let (service, store, lessons) = setup(4);
    enroll(&service, "learner-1").await;

    let expected = [25.0, 50.0, 75.0, 100.0];
    for (lesson_id, expected_progress) in lessons.iter().zip(expected) {
        let view = service.complete_lesson("learner-1", lesson_id).await.unwrap();
        assert_eq!(view.progress, expected_progress);
        assert_eq!(view.course_completed, expected_progress == 100.0);
    }

    let enrollment = store
        .find_enrollment("learner-1", "course-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(enrollment.progress, 100.0);
    assert!(enrollment.completed_at.is_some());
}

#[tokio::test]
async fn completion_order_does_not_matter() {
    let (service, store, lessons) = setup(4);
    enroll(&service, "learner-1").await;

    for index in [2, 0, 3, 1] {
        service
            .complete_lesson("learner-1", &lessons[index])
            .await
            .unwrap();
    }

    let enrollment = store
        .find_enrollment("learner-1", "course-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(enrollment.progress, 100.0);
    assert!(enrollment.completed_at.is_some());
}

#[tokio::test]
async fn completing_the_same_lesson_twice_does_not_double_count() {
    let (service, store, lessons) = setup(4);
    enroll(&service, "learner-1").await;

    let first = service
        .complete_lesson("learner-1", &lessons[0])
        .await
        .unwrap();
    let second = service
        .complete_lesson("learner-1", &lessons[0])
        .await
        .unwrap();

    assert_eq!(first.progress, 25.0);
    assert_eq!(second.progress, 25.0);
    assert_eq!(second.completed_lessons, 1);
    assert_eq!(store.lesson_progress_count(), 1);
}

#[tokio::test]
async fn progress_is_monotonic_over_distinct_completions() {
    let (service, _store, lessons) = setup(5);
    enroll(&service, "learner-1").await;

    let mut last_progress = 0.0;
    for lesson_id in &lessons {
        let view = service.complete_lesson("learner-1", lesson_id).await.unwrap();
        assert!(view.progress >= last_progress);
        last_progress = view.progress;
    }
    assert_eq!(last_progress, 100.0);
}

#[tokio::test]
async fn enrolling_twice_returns_the_existing_record() {
    let (service, store, _lessons) = setup(2);

    let first = match service.enroll("learner-1", "course-1").await.unwrap() {
        EnrollOutcome::Enrolled(e) => e,
        EnrollOutcome::AlreadyEnrolled(_) => panic!("expected a fresh enrollment"),
    };

    let second = match service.enroll("learner-1", "course-1").await.unwrap() {
        EnrollOutcome::AlreadyEnrolled(e) => e,
        EnrollOutcome::Enrolled(_) => panic!("expected the existing enrollment"),
    };

    assert_eq!(first.id, second.id);
    assert_eq!(store.enrollment_count(), 1);
}

#[tokio::test]
async fn enrolling_in_unknown_course_fails() {
    let (service, _store, _lessons) = setup(1);

    let err = service.enroll("learner-1", "no-such-course").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn completion_without_enrollment_writes_nothing() {
    let (service, store, lessons) = setup(3);

    let err = service
        .complete_lesson("learner-1", &lessons[0])
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotEnrolled));
    assert_eq!(store.lesson_progress_count(), 0);
    assert_eq!(store.enrollment_count(), 0);
}

#[tokio::test]
async fn empty_live_lesson_set_is_rejected() {
    let (service, store, lessons) = setup(1);
    enroll(&service, "learner-1").await;

    // Unpublish the only lesson after enrollment: the record still exists,
    // but the live lesson set the recomputation runs over is empty.
    let mut lesson = store.find_lesson(&lessons[0]).await.unwrap().unwrap();
    lesson.is_published = false;
    store.seed_lesson(lesson);

    let err = service
        .complete_lesson("learner-1", &lessons[0])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidLessonSet));

    // Nothing was written; the enrollment keeps its last consistent state.
    assert_eq!(store.lesson_progress_count(), 0);
    let enrollment = store
        .find_enrollment("learner-1", "course-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(enrollment.progress, 0.0);
}

#[tokio::test]
async fn lesson_outside_the_live_set_cannot_be_completed() {
    let (service, store, lessons) = setup(2);
    enroll(&service, "learner-1").await;

    // Unpublish one of two lessons; it still resolves by id but is no longer
    // part of the live lesson set.
    let mut lesson = store.find_lesson(&lessons[1]).await.unwrap().unwrap();
    lesson.is_published = false;
    store.seed_lesson(lesson);

    let err = service
        .complete_lesson("learner-1", &lessons[1])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(store.lesson_progress_count(), 0);
}

#[tokio::test]
async fn lessons_added_after_completion_reopen_the_course() {
    let (service, store, lessons) = setup(1);
    enroll(&service, "learner-1").await;

    let view = service
        .complete_lesson("learner-1", &lessons[0])
        .await
        .unwrap();
    assert_eq!(view.progress, 100.0);
    assert!(view.course_completed);

    // Two more lessons appear; the next recomputation runs over the live
    // lesson set and clears the completion.
    let late_one = common::lesson_record("course-1", 1);
    let late_two = common::lesson_record("course-1", 2);
    let late_one_id = late_one.id.clone();
    store.seed_lesson(late_one);
    store.seed_lesson(late_two);

    let view = service
        .complete_lesson("learner-1", &late_one_id)
        .await
        .unwrap();
    assert_eq!(view.completed_lessons, 2);
    assert_eq!(view.total_lessons, 3);
    assert!(!view.course_completed);

    let enrollment = store
        .find_enrollment("learner-1", "course-1")
        .await
        .unwrap()
        .unwrap();
    assert!(enrollment.completed_at.is_none());
    assert!((enrollment.progress - 200.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn course_state_without_enrollment_is_a_valid_answer() {
    let (service, _store, _lessons) = setup(3);

    let state = service.course_state("learner-1", "course-1").await.unwrap();

    assert_eq!(state.status, EnrollmentStatus::NotEnrolled);
    assert!(state.enrollment.is_none());
    assert_eq!(state.total_lessons, 3);
    assert_eq!(state.completed_lessons, 0);
}

#[tokio::test]
async fn course_state_orders_lessons_and_reports_completions() {
    let (service, _store, lessons) = setup(3);
    enroll(&service, "learner-1").await;

    service
        .complete_lesson("learner-1", &lessons[1])
        .await
        .unwrap();

    let state = service.course_state("learner-1", "course-1").await.unwrap();

    let order: Vec<i32> = state.lessons.iter().map(|l| l.order_index).collect();
    assert_eq!(order, vec![0, 1, 2]);
    assert_eq!(state.status, EnrollmentStatus::InProgress);
    assert_eq!(state.completed_lessons, 1);
    assert_eq!(state.completed_lesson_ids, vec![lessons[1].clone()]);
}

#[tokio::test]
async fn dashboard_aggregates_enrollments() {
    let store = Arc::new(MemoryStore::new());
    let lessons_a = common::seed_course(&store, "course-a", 2);
    store.seed_course(common::course_record("course-b", "Second Course"));
    let lesson_b = common::lesson_record("course-b", 0);
    store.seed_lesson(lesson_b);

    let service = ProgressService::new(store.clone());
    service.enroll("learner-1", "course-a").await.unwrap();
    service.enroll("learner-1", "course-b").await.unwrap();

    service
        .complete_lesson("learner-1", &lessons_a[0])
        .await
        .unwrap();

    let view = service.dashboard("learner-1").await.unwrap();

    assert_eq!(view.enrollments.len(), 2);
    assert_eq!(view.stats.enrolled, 2);
    assert_eq!(view.stats.in_progress, 1);
    assert_eq!(view.stats.completed, 0);
    assert_eq!(view.stats.estimated_hours, 0);
    assert_eq!(view.stats.avg_progress, 25.0);
}
