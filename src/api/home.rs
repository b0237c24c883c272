use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use tracing::info;

use crate::auth::CurrentUser;
use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

pub async fn home(
    State(state): State<AppState>,
    Query(params): Query<HomeQuery>,
) -> Result<Json<HomePage>, AppError> {
    let title = params.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let category_id = params.category_id.as_deref().filter(|c| !c.is_empty());

    let categories = repository::fetch_categories(&state.db).await?;
    let courses = repository::fetch_published_course_cards(&state.db, title, category_id).await?;
    Ok(Json(HomePage { categories, courses }))
}

pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    let categories = repository::fetch_categories(&state.db).await?;
    Ok(Json(categories))
}

pub async fn create_category(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    payload: Result<Json<NewCategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let Json(req) = payload?;
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }

    let category = repository::insert_category(&state.db, name)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if duplicate {
                AppError::Conflict(format!("category '{}' already exists", name))
            } else {
                AppError::Database(e)
            }
        })?;

    info!(category_id = %category.id, user_id = %user.id, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}
