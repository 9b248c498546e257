use axum::http::StatusCode;
use chrono::Utc;

mod common;

#[tokio::test]
async fn course_listing_applies_filters() {
    let (app, store) = common::create_test_app();

    let mut rust_course = common::course_record("course-rust", "Intro to Farming Tech");
    rust_course.category = "Agriculture".to_string();
    store.seed_course(rust_course);

    let mut digital = common::course_record("course-digital", "Digital Basics");
    digital.category = "Digital Literacy".to_string();
    store.seed_course(digital);

    let mut unpublished = common::course_record("course-draft", "Draft Course");
    unpublished.is_published = false;
    store.seed_course(unpublished);

    let (status, body) = common::get_json(&app, "/api/v1/catalog/courses").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["courses"].as_array().unwrap().len(), 2);

    let (status, body) =
        common::get_json(&app, "/api/v1/catalog/courses?category=Agriculture").await;
    assert_eq!(status, StatusCode::OK);
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["id"], "course-rust");

    let (status, body) = common::get_json(&app, "/api/v1/catalog/courses?q=digital").await;
    assert_eq!(status, StatusCode::OK);
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["id"], "course-digital");
}

#[tokio::test]
async fn featured_courses_rank_by_student_count() {
    let (app, store) = common::create_test_app();

    for (id, students) in [("course-a", 10), ("course-b", 500), ("course-c", 120)] {
        let mut course = common::course_record(id, id);
        course.students_count = students;
        store.seed_course(course);
    }

    let (status, body) = common::get_json(&app, "/api/v1/catalog/courses/featured").await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = body["courses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["course-b", "course-c", "course-a"]);
}

#[tokio::test]
async fn course_detail_withholds_content_except_free_previews() {
    let (app, store) = common::create_test_app();
    common::seed_course(&store, "course-1", 3);

    let (status, body) = common::get_json(&app, "/api/v1/catalog/courses/course-1").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["lesson_count"], 3);
    assert_eq!(body["total_duration_minutes"], 30);
    assert!(body["enrollment"].is_null());

    let lessons = body["lessons"].as_array().unwrap();
    // Only the first lesson is seeded as a free preview
    assert!(lessons[0]["content"].is_string());
    assert!(lessons[1].get("content").is_none() || lessons[1]["content"].is_null());
}

#[tokio::test]
async fn course_detail_attaches_enrollment_for_signed_in_learner() {
    let (app, store) = common::create_test_app();
    common::seed_course(&store, "course-1", 2);

    let (_user_id, token) = common::register_and_login(&app).await;
    common::authed_post(&app, "/api/v1/learn/courses/course-1/enroll", &token, None).await;

    let (status, body) =
        common::authed_get(&app, "/api/v1/catalog/courses/course-1", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enrollment"]["course_id"], "course-1");
    assert_eq!(body["enrollment"]["progress"], 0.0);
}

#[tokio::test]
async fn unknown_course_is_not_found() {
    let (app, _store) = common::create_test_app();

    let (status, body) = common::get_json(&app, "/api/v1/catalog/courses/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn categories_are_listed_sorted_by_name() {
    let (app, store) = common::create_test_app();

    for name in ["Technology", "Agriculture", "Business"] {
        store.seed_category(ujuzi_api::models::CategoryRecord {
            id: name.to_lowercase(),
            name: name.to_string(),
            description: None,
            icon: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
    }

    let (status, body) = common::get_json(&app, "/api/v1/catalog/categories").await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Agriculture", "Business", "Technology"]);
}

#[tokio::test]
async fn reviews_require_enrollment() {
    let (app, store) = common::create_test_app();
    common::seed_course(&store, "course-1", 2);

    let (_user_id, token) = common::register_and_login(&app).await;

    let review = serde_json::json!({ "rating": 5, "comment": "Great course" });
    let (status, body) = common::authed_post(
        &app,
        "/api/v1/learn/courses/course-1/reviews",
        &token,
        Some(review),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_ENROLLED");
}

#[tokio::test]
async fn enrolled_learner_can_review_and_reviews_aggregate() {
    let (app, store) = common::create_test_app();
    common::seed_course(&store, "course-1", 2);

    let (_user_id, token) = common::register_and_login(&app).await;
    common::authed_post(&app, "/api/v1/learn/courses/course-1/enroll", &token, None).await;

    let review = serde_json::json!({ "rating": 4, "comment": "Solid material" });
    let (status, body) = common::authed_post(
        &app,
        "/api/v1/learn/courses/course-1/reviews",
        &token,
        Some(review),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["rating"], 4);

    let (status, body) = common::get_json(&app, "/api/v1/catalog/courses/course-1/reviews").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["average_rating"], 4.0);
}

#[tokio::test]
async fn review_rating_is_validated() {
    let (app, store) = common::create_test_app();
    common::seed_course(&store, "course-1", 2);

    let (_user_id, token) = common::register_and_login(&app).await;
    common::authed_post(&app, "/api/v1/learn/courses/course-1/enroll", &token, None).await;

    let review = serde_json::json!({ "rating": 9 });
    let (status, body) = common::authed_post(
        &app,
        "/api/v1/learn/courses/course-1/reviews",
        &token,
        Some(review),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
