use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::nullable;
use super::section::Section;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub position: i64,
    pub is_published: bool,
    pub is_free: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterOutline {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChapterRequest {
    pub title: String,
}

/// Fields a caller may change through `PATCH .../chapters/{id}`.
/// Publication state, ownership and ordering have their own routes.
/// `null` clears `description` and `videoUrl`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChapterUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub video_url: Option<Option<String>>,
    pub is_free: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub list: Vec<ChapterPosition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterPosition {
    pub id: String,
    pub position: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_accepts_whitelisted_fields() {
        let update: ChapterUpdate =
            serde_json::from_str(r#"{"videoUrl":"https://x/video.mp4","title":"New"}"#).unwrap();
        assert_eq!(update.title.as_deref(), Some("New"));
        assert_eq!(update.video_url, Some(Some("https://x/video.mp4".to_string())));
        assert!(update.description.is_none());
        assert!(update.is_free.is_none());
    }

    #[test]
    fn update_tells_null_from_absent() {
        let update: ChapterUpdate = serde_json::from_str(r#"{"videoUrl":null}"#).unwrap();
        assert_eq!(update.video_url, Some(None));
        assert!(update.description.is_none());
    }

    #[test]
    fn update_rejects_mass_assignment() {
        for body in [
            r#"{"isPublished":true}"#,
            r#"{"courseId":"other"}"#,
            r#"{"title":"ok","position":3}"#,
        ] {
            assert!(serde_json::from_str::<ChapterUpdate>(body).is_err(), "{body}");
        }
    }
}
