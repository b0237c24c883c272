mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};

use common::{OWNER, TestApp};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_pair_deletes_on_one_course_all_succeed() {
    let app = Arc::new(TestApp::with_database_file(5).await);

    for _ in 0..10 {
        let (course_id, ids) = app.published_course(&["A", "B", "C", "D"]).await;

        let mut handles = Vec::new();
        for (chapter_id, section_id) in ids {
            let app = Arc::clone(&app);
            let uri = format!(
                "/api/courses/{}/chapters/{}/sections/{}",
                course_id, chapter_id, section_id
            );
            handles.push(tokio::spawn(async move {
                app.request(Method::DELETE, &uri, Some(OWNER), None).await
            }));
        }

        for handle in handles {
            let (status, body) = handle.await.unwrap();
            assert_eq!(status, StatusCode::OK, "{}", body);
        }

        assert!(!app.course_published(&course_id).await);
        let chapters = app.count("chapters").await;
        assert_eq!(chapters, 0);
    }

    assert_eq!(app.count("sections").await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_unpublishes_leave_course_consistent() {
    let app = Arc::new(TestApp::with_database_file(5).await);
    let (course_id, ids) = app.published_course(&["A", "B", "C"]).await;

    let mut handles = Vec::new();
    for (chapter_id, _) in ids {
        let app = Arc::clone(&app);
        let uri = format!("/api/courses/{}/chapters/{}/unpublish", course_id, chapter_id);
        handles.push(tokio::spawn(async move {
            app.request(Method::PATCH, &uri, Some(OWNER), None).await
        }));
    }

    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    assert!(!app.course_published(&course_id).await);
}
