mod chapters;
mod courses;
mod home;
mod sections;

use axum::routing::{get, patch, post, put};
use axum::{Router, extract::State, http::StatusCode};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::db::repository;
use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/home", get(home::home))
        .route("/api/categories", get(home::list_categories).post(home::create_category))
        .route("/api/courses", get(courses::list_courses).post(courses::create_course))
        .route(
            "/api/courses/{course_id}",
            get(courses::get_course)
                .patch(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/api/courses/{course_id}/publish", patch(courses::publish_course))
        .route("/api/courses/{course_id}/unpublish", patch(courses::unpublish_course))
        .route("/api/courses/{course_id}/chapters", post(chapters::create_chapter))
        .route("/api/courses/{course_id}/chapters/reorder", put(chapters::reorder_chapters))
        .route(
            "/api/courses/{course_id}/chapters/{chapter_id}",
            patch(chapters::update_chapter).delete(chapters::delete_chapter),
        )
        .route(
            "/api/courses/{course_id}/chapters/{chapter_id}/publish",
            patch(chapters::publish_chapter),
        )
        .route(
            "/api/courses/{course_id}/chapters/{chapter_id}/unpublish",
            patch(chapters::unpublish_chapter),
        )
        .route(
            "/api/courses/{course_id}/chapters/{chapter_id}/sections",
            post(sections::create_section),
        )
        .route(
            "/api/courses/{course_id}/chapters/{chapter_id}/sections/{section_id}",
            patch(sections::update_section).delete(sections::delete_chapter_section),
        )
        .route(
            "/api/courses/{course_id}/chapters/{chapter_id}/sections/{section_id}/publish",
            patch(sections::publish_section),
        )
        .route(
            "/api/courses/{course_id}/chapters/{chapter_id}/sections/{section_id}/unpublish",
            patch(sections::unpublish_section),
        )
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    repository::ping(&state.db).await?;
    Ok(StatusCode::OK)
}
