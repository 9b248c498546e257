use axum::http::StatusCode;

mod common;

#[tokio::test]
async fn completing_lessons_walks_progress_to_one_hundred() {
    let (app, store) = common::create_test_app();
    let lessons = common::seed_course(&store, "course-1", 4);

    let (_user_id, token) = common::register_and_login(&app).await;

    let (status, _body) =
        common::authed_post(&app, "/api/v1/learn/courses/course-1/enroll", &token, None).await;
    assert_eq!(status, StatusCode::CREATED);

    let expected = [25.0, 50.0, 75.0, 100.0];
    for (lesson_id, expected_progress) in lessons.iter().zip(expected) {
        let uri = format!("/api/v1/learn/lessons/{}/complete", lesson_id);
        let (status, body) = common::authed_post(&app, &uri, &token, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["progress"], expected_progress);
        assert_eq!(body["course_completed"], expected_progress == 100.0);
    }

    // The player view reflects the completed course
    let (status, state) =
        common::authed_get(&app, "/api/v1/learn/courses/course-1", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["status"], "complete");
    assert_eq!(state["completed_lessons"], 4);
    assert!(state["enrollment"]["completed_at"].is_string());
}

#[tokio::test]
async fn repeated_completion_reports_the_same_progress() {
    let (app, store) = common::create_test_app();
    let lessons = common::seed_course(&store, "course-1", 2);

    let (_user_id, token) = common::register_and_login(&app).await;
    common::authed_post(&app, "/api/v1/learn/courses/course-1/enroll", &token, None).await;

    let uri = format!("/api/v1/learn/lessons/{}/complete", lessons[0]);
    let (_status, first) = common::authed_post(&app, &uri, &token, None).await;
    let (_status, second) = common::authed_post(&app, &uri, &token, None).await;

    assert_eq!(first["progress"], 50.0);
    assert_eq!(second["progress"], 50.0);
    assert_eq!(store.lesson_progress_count(), 1);
}

#[tokio::test]
async fn completion_without_enrollment_is_forbidden() {
    let (app, store) = common::create_test_app();
    let lessons = common::seed_course(&store, "course-1", 2);

    let (_user_id, token) = common::register_and_login(&app).await;

    let uri = format!("/api/v1/learn/lessons/{}/complete", lessons[0]);
    let (status, body) = common::authed_post(&app, &uri, &token, None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_ENROLLED");
    assert_eq!(store.lesson_progress_count(), 0);
}

#[tokio::test]
async fn completing_unknown_lesson_is_not_found() {
    let (app, _store) = common::create_test_app();
    let (_user_id, token) = common::register_and_login(&app).await;

    let (status, _body) =
        common::authed_post(&app, "/api/v1/learn/lessons/missing/complete", &token, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_reports_stats_and_courses() {
    let (app, store) = common::create_test_app();
    let lessons = common::seed_course(&store, "course-1", 2);
    store.seed_course(common::course_record("course-2", "Second Course"));
    store.seed_lesson(common::lesson_record("course-2", 0));

    let (_user_id, token) = common::register_and_login(&app).await;

    common::authed_post(&app, "/api/v1/learn/courses/course-1/enroll", &token, None).await;
    common::authed_post(&app, "/api/v1/learn/courses/course-2/enroll", &token, None).await;

    // Complete all of course-1
    for lesson_id in &lessons {
        let uri = format!("/api/v1/learn/lessons/{}/complete", lesson_id);
        common::authed_post(&app, &uri, &token, None).await;
    }

    let (status, body) = common::authed_get(&app, "/api/v1/learn/dashboard", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["enrolled"], 2);
    assert_eq!(body["stats"]["completed"], 1);
    assert_eq!(body["stats"]["in_progress"], 0);
    assert_eq!(body["stats"]["estimated_hours"], 8);
    assert_eq!(body["enrollments"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn dashboard_requires_authentication() {
    let (app, _store) = common::create_test_app();

    let (status, _body) = common::get_json(&app, "/api/v1/learn/dashboard").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
