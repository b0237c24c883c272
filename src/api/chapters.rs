use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::*;
use crate::services::CourseService;
use crate::state::AppState;

pub async fn create_chapter(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    payload: Result<Json<NewChapterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Chapter>), AppError> {
    let Json(req) = payload?;
    let chapter = CourseService::new(state.db.clone())
        .create_chapter(&user.id, &course_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(chapter)))
}

pub async fn reorder_chapters(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<Json<Vec<Chapter>>, AppError> {
    let Json(req) = payload?;
    let chapters = CourseService::new(state.db.clone())
        .reorder_chapters(&user.id, &course_id, req)
        .await?;
    Ok(Json(chapters))
}

pub async fn update_chapter(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path((course_id, chapter_id)): Path<(String, String)>,
    payload: Result<Json<ChapterUpdate>, JsonRejection>,
) -> Result<Json<Chapter>, AppError> {
    let Json(update) = payload?;
    let chapter = CourseService::new(state.db.clone())
        .update_chapter(&user.id, &course_id, &chapter_id, update)
        .await?;
    Ok(Json(chapter))
}

pub async fn delete_chapter(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path((course_id, chapter_id)): Path<(String, String)>,
) -> Result<Json<Chapter>, AppError> {
    let chapter = CourseService::new(state.db.clone())
        .delete_chapter(&user.id, &course_id, &chapter_id)
        .await?;
    Ok(Json(chapter))
}

pub async fn publish_chapter(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path((course_id, chapter_id)): Path<(String, String)>,
) -> Result<Json<Chapter>, AppError> {
    let chapter = CourseService::new(state.db.clone())
        .publish_chapter(&user.id, &course_id, &chapter_id)
        .await?;
    Ok(Json(chapter))
}

pub async fn unpublish_chapter(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path((course_id, chapter_id)): Path<(String, String)>,
) -> Result<Json<Chapter>, AppError> {
    let chapter = CourseService::new(state.db.clone())
        .unpublish_chapter(&user.id, &course_id, &chapter_id)
        .await?;
    Ok(Json(chapter))
}
