use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::chapter::ChapterOutline;
use super::nullable;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub is_published: bool,
    pub category_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Course {
    /// Names of the fields that still block publishing, in display order.
    pub fn missing_publish_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if is_blank(&self.description) {
            missing.push("description");
        }
        if is_blank(&self.image_url) {
            missing.push("imageUrl");
        }
        if is_blank(&self.category_id) {
            missing.push("categoryId");
        }
        missing
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or_default().is_empty()
}

/// Card shown on the public homepage.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CourseCard {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub chapters_count: i64,
    pub created_at: String,
}

/// An owned course with its full chapter tree, for the authoring dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseOutline {
    #[serde(flatten)]
    pub course: Course,
    pub chapters: Vec<ChapterOutline>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourseRequest {
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CourseUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
    pub price: Option<f64>,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeQuery {
    pub title: Option<String>,
    pub category_id: Option<String>,
}
