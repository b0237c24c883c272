use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::course::CourseCard;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategoryRequest {
    pub name: String,
}

/// Everything the public homepage renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomePage {
    pub categories: Vec<Category>,
    pub courses: Vec<CourseCard>,
}
