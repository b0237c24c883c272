mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use coursehub::db::repository;
use coursehub::models::HomePage;

use common::{OWNER, TestApp};

async fn home(app: &TestApp, query: &str) -> HomePage {
    let (status, body) = app.request(Method::GET, &format!("/api/home{}", query), None, None).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_value(body).expect("homepage payload")
}

#[tokio::test]
async fn lists_categories_by_name_and_only_published_courses() {
    let app = TestApp::new().await;
    for name in ["Music", "Design", "Programming"] {
        repository::insert_category(&app.db, name).await.unwrap();
    }
    let (published, _) = app.published_course(&["A", "B"]).await;
    repository::insert_course(&app.db, OWNER, "Draft course").await.unwrap();

    let page = home(&app, "").await;
    let names: Vec<&str> = page.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Design", "Music", "Programming"]);

    assert_eq!(page.courses.len(), 1);
    assert_eq!(page.courses[0].id, published);
    assert_eq!(page.courses[0].chapters_count, 2);
}

#[tokio::test]
async fn filters_by_title_and_category() {
    let app = TestApp::new().await;
    let music = repository::insert_category(&app.db, "Music").await.unwrap();
    let design = repository::insert_category(&app.db, "Design").await.unwrap();

    let (guitar, _) = app.published_course(&["Chords"]).await;
    let (figma, _) = app.published_course(&["Frames"]).await;
    for (id, title, category) in [(&guitar, "Guitar Basics", &music), (&figma, "Figma Basics", &design)] {
        let mut course = repository::find_course_by_id(&app.db, id).await.unwrap().unwrap();
        course.title = title.to_string();
        course.category_id = Some(category.id.clone());
        repository::update_course(&app.db, &course).await.unwrap();
    }

    let page = home(&app, "?title=basics").await;
    assert_eq!(page.courses.len(), 2);

    let page = home(&app, "?title=GUITAR").await;
    assert_eq!(page.courses.len(), 1);
    assert_eq!(page.courses[0].id, guitar);
    assert_eq!(page.courses[0].category_name.as_deref(), Some("Music"));

    let page = home(&app, &format!("?categoryId={}", design.id)).await;
    assert_eq!(page.courses.len(), 1);
    assert_eq!(page.courses[0].id, figma);

    let page = home(&app, &format!("?title=guitar&categoryId={}", design.id)).await;
    assert!(page.courses.is_empty());

    // blank filters are ignored
    let page = home(&app, "?title=&categoryId=").await;
    assert_eq!(page.courses.len(), 2);
}

#[tokio::test]
async fn categories_can_be_created_once() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request(Method::POST, "/api/categories", None, Some(json!({ "name": "Music" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request(Method::POST, "/api/categories", Some(OWNER), Some(json!({ "name": " Music " })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Music");

    let (status, _) = app
        .request(Method::POST, "/api/categories", Some(OWNER), Some(json!({ "name": "Music" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.request(Method::GET, "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn health_check_reports_ok() {
    let app = TestApp::new().await;
    let (status, _) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
