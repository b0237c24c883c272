#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;
use uuid::Uuid;

use coursehub::api::router;
use coursehub::auth::{TrustedHeaderResolver, USER_ID_HEADER};
use coursehub::db::{self, repository};
use coursehub::state::AppState;

pub const OWNER: &str = "user-1";
pub const STRANGER: &str = "user-2";

pub struct TestApp {
    pub db: SqlitePool,
    pub router: Router,
    file: Option<DatabaseFile>,
}

/// On-disk database removed when the app is dropped.
struct DatabaseFile(PathBuf);

impl Drop for DatabaseFile {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.0.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let db = db::connect("sqlite::memory:", 1)
            .await
            .expect("Failed to create database");
        Self::with_pool(db, None)
    }

    /// App on a fresh database file with a multi-connection pool, so
    /// requests can really run side by side.
    pub async fn with_database_file(max_connections: u32) -> Self {
        let path = std::env::temp_dir().join(format!("coursehub-test-{}.db", Uuid::new_v4()));
        let db = db::connect(&format!("sqlite://{}", path.display()), max_connections)
            .await
            .expect("Failed to create database");
        Self::with_pool(db, Some(DatabaseFile(path)))
    }

    fn with_pool(db: SqlitePool, file: Option<DatabaseFile>) -> Self {
        let state = AppState {
            db: db.clone(),
            identity: Arc::new(TrustedHeaderResolver),
        };

        Self {
            db,
            router: router(state),
            file,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    /// Course owned by `OWNER` with one published chapter per title, each
    /// holding a single published section. Returns (course_id, [(chapter_id, section_id)]).
    pub async fn published_course(&self, chapters: &[&str]) -> (String, Vec<(String, String)>) {
        let course = repository::insert_course(&self.db, OWNER, "Course C").await.unwrap();
        let mut ids = Vec::new();

        for (i, title) in chapters.iter().enumerate() {
            let chapter = repository::insert_chapter(&self.db, &course.id, title, i as i64 + 1)
                .await
                .unwrap();
            let section = repository::insert_section(&self.db, &chapter.id, "Section", 1)
                .await
                .unwrap();
            repository::set_section_published(&self.db, &section.id, true).await.unwrap();
            repository::set_chapter_published(&self.db, &chapter.id, true).await.unwrap();
            ids.push((chapter.id, section.id));
        }

        repository::set_course_published(&self.db, &course.id, true).await.unwrap();
        (course.id, ids)
    }

    pub async fn course_published(&self, course_id: &str) -> bool {
        repository::find_course_by_id(&self.db, course_id)
            .await
            .unwrap()
            .expect("course missing")
            .is_published
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.db)
            .await
            .unwrap()
    }

    pub async fn row_counts(&self) -> (i64, i64, i64) {
        (
            self.count("courses").await,
            self.count("chapters").await,
            self.count("sections").await,
        )
    }
}
