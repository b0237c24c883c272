use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::*;
use crate::services::CourseService;
use crate::state::AppState;

pub async fn create_section(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path((course_id, chapter_id)): Path<(String, String)>,
    payload: Result<Json<NewSectionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Section>), AppError> {
    let Json(req) = payload?;
    let section = CourseService::new(state.db.clone())
        .create_section(&user.id, &course_id, &chapter_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(section)))
}

pub async fn update_section(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path((course_id, chapter_id, section_id)): Path<(String, String, String)>,
    payload: Result<Json<SectionUpdate>, JsonRejection>,
) -> Result<Json<Section>, AppError> {
    let Json(update) = payload?;
    let section = CourseService::new(state.db.clone())
        .update_section(&user.id, &course_id, &chapter_id, &section_id, update)
        .await?;
    Ok(Json(section))
}

/// Removes the chapter and the section together; responds with the chapter.
pub async fn delete_chapter_section(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path((course_id, chapter_id, section_id)): Path<(String, String, String)>,
) -> Result<Json<Chapter>, AppError> {
    let chapter = CourseService::new(state.db.clone())
        .delete_chapter_section(&user.id, &course_id, &chapter_id, &section_id)
        .await?;
    Ok(Json(chapter))
}

pub async fn publish_section(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path((course_id, chapter_id, section_id)): Path<(String, String, String)>,
) -> Result<Json<Section>, AppError> {
    let section = CourseService::new(state.db.clone())
        .publish_section(&user.id, &course_id, &chapter_id, &section_id)
        .await?;
    Ok(Json(section))
}

pub async fn unpublish_section(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path((course_id, chapter_id, section_id)): Path<(String, String, String)>,
) -> Result<Json<Section>, AppError> {
    let section = CourseService::new(state.db.clone())
        .unpublish_section(&user.id, &course_id, &chapter_id, &section_id)
        .await?;
    Ok(Json(section))
}
