use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::auth::CurrentUser;
use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::services::CourseService;
use crate::state::AppState;

pub async fn list_courses(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = repository::fetch_courses_by_user(&state.db, &user.id).await?;
    Ok(Json(courses))
}

pub async fn create_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    payload: Result<Json<NewCourseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let Json(req) = payload?;
    let course = CourseService::new(state.db.clone())
        .create_course(&user.id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn get_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseOutline>, AppError> {
    let outline = CourseService::new(state.db.clone())
        .course_outline(&user.id, &course_id)
        .await?;
    Ok(Json(outline))
}

pub async fn update_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    payload: Result<Json<CourseUpdate>, JsonRejection>,
) -> Result<Json<Course>, AppError> {
    let Json(update) = payload?;
    let course = CourseService::new(state.db.clone())
        .update_course(&user.id, &course_id, update)
        .await?;
    Ok(Json(course))
}

pub async fn delete_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::new(state.db.clone())
        .delete_course(&user.id, &course_id)
        .await?;
    Ok(Json(course))
}

pub async fn publish_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::new(state.db.clone())
        .publish_course(&user.id, &course_id)
        .await?;
    Ok(Json(course))
}

pub async fn unpublish_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::new(state.db.clone())
        .unpublish_course(&user.id, &course_id)
        .await?;
    Ok(Json(course))
}
