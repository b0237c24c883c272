use std::collections::HashSet;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::db::{self, repository};
use crate::error::AppError;
use crate::models::*;
use crate::services::cascade;

/// Authoring operations on a course tree.
///
/// Methods on an existing course check that `user_id` owns it and do all of
/// their reads and writes in one transaction.
#[derive(Clone)]
pub struct CourseService {
    db: SqlitePool,
}

impl CourseService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create_course(&self, user_id: &str, req: NewCourseRequest) -> Result<Course, AppError> {
        let title = required_title(&req.title)?;
        let course = repository::insert_course(&self.db, user_id, title).await?;
        info!(course_id = %course.id, user_id, "course created");
        Ok(course)
    }

    pub async fn course_outline(&self, user_id: &str, course_id: &str) -> Result<CourseOutline, AppError> {
        let mut tx = self.db.begin().await?;
        let course = owned_course(&mut tx, course_id, user_id).await?;
        let chapters = repository::fetch_chapters_by_course(&mut *tx, course_id).await?;
        let sections = repository::fetch_sections_by_course(&mut *tx, course_id).await?;
        tx.commit().await?;

        let chapters = chapters
            .into_iter()
            .map(|chapter| {
                let sections = sections
                    .iter()
                    .filter(|s| s.chapter_id == chapter.id)
                    .cloned()
                    .collect();
                ChapterOutline { chapter, sections }
            })
            .collect();

        Ok(CourseOutline { course, chapters })
    }

    pub async fn update_course(
        &self,
        user_id: &str,
        course_id: &str,
        update: CourseUpdate,
    ) -> Result<Course, AppError> {
        let mut tx = db::begin_write(&self.db).await?;
        let mut course = owned_course(&mut tx, course_id, user_id).await?;

        if let Some(title) = update.title {
            course.title = required_title(&title)?.to_string();
        }
        if let Some(description) = update.description {
            course.description = description;
        }
        if let Some(image_url) = update.image_url {
            course.image_url = image_url
                .map(|url| validate_url("imageUrl", &url))
                .transpose()?;
        }
        if let Some(price) = update.price {
            if !price.is_finite() || price < 0.0 {
                return Err(AppError::BadRequest("price must be a non-negative number".to_string()));
            }
            course.price = Some(price);
        }
        if let Some(category_id) = update.category_id {
            if repository::find_category_by_id(&mut *tx, &category_id).await?.is_none() {
                return Err(AppError::BadRequest(format!("unknown category '{}'", category_id)));
            }
            course.category_id = Some(category_id);
        }
        course.updated_at = repository::now();

        repository::update_course(&mut *tx, &course).await?;
        tx.commit().await?;
        Ok(course)
    }

    pub async fn delete_course(&self, user_id: &str, course_id: &str) -> Result<Course, AppError> {
        let mut tx = db::begin_write(&self.db).await?;
        let course = owned_course(&mut tx, course_id, user_id).await?;

        let sections = repository::delete_sections_by_course(&mut *tx, course_id).await?;
        let chapters = repository::delete_chapters_by_course(&mut *tx, course_id).await?;
        repository::delete_course(&mut *tx, course_id).await?;
        tx.commit().await?;

        info!(course_id, chapters, sections, "course deleted");
        Ok(course)
    }

    pub async fn publish_course(&self, user_id: &str, course_id: &str) -> Result<Course, AppError> {
        let mut tx = db::begin_write(&self.db).await?;
        let mut course = owned_course(&mut tx, course_id, user_id).await?;

        let mut missing = course.missing_publish_fields();
        if repository::count_published_chapters(&mut *tx, course_id).await? == 0 {
            missing.push("a published chapter");
        }
        if !missing.is_empty() {
            return Err(AppError::BadRequest(format!(
                "course cannot be published, missing: {}",
                missing.join(", ")
            )));
        }

        repository::set_course_published(&mut *tx, course_id, true).await?;
        tx.commit().await?;

        info!(course_id, "course published");
        course.is_published = true;
        Ok(course)
    }

    pub async fn unpublish_course(&self, user_id: &str, course_id: &str) -> Result<Course, AppError> {
        let mut tx = db::begin_write(&self.db).await?;
        let mut course = owned_course(&mut tx, course_id, user_id).await?;
        repository::set_course_published(&mut *tx, course_id, false).await?;
        tx.commit().await?;

        info!(course_id, "course unpublished");
        course.is_published = false;
        Ok(course)
    }

    pub async fn create_chapter(
        &self,
        user_id: &str,
        course_id: &str,
        req: NewChapterRequest,
    ) -> Result<Chapter, AppError> {
        let title = required_title(&req.title)?;
        let mut tx = db::begin_write(&self.db).await?;
        owned_course(&mut tx, course_id, user_id).await?;

        let position = repository::next_chapter_position(&mut *tx, course_id).await?;
        let chapter = repository::insert_chapter(&mut *tx, course_id, title, position).await?;
        tx.commit().await?;
        Ok(chapter)
    }

    pub async fn reorder_chapters(
        &self,
        user_id: &str,
        course_id: &str,
        req: ReorderRequest,
    ) -> Result<Vec<Chapter>, AppError> {
        let mut tx = db::begin_write(&self.db).await?;
        owned_course(&mut tx, course_id, user_id).await?;
        validate_reorder(&req.list)?;

        for entry in &req.list {
            if !repository::set_chapter_position(&mut *tx, course_id, &entry.id, entry.position).await? {
                return Err(AppError::NotFound);
            }
        }

        // a partial list may still collide with a chapter it left out
        let chapters = repository::fetch_chapters_by_course(&mut *tx, course_id).await?;
        let mut taken = HashSet::new();
        if let Some(clash) = chapters.iter().find(|c| !taken.insert(c.position)) {
            return Err(AppError::BadRequest(format!(
                "position {} would be shared by more than one chapter",
                clash.position
            )));
        }
        tx.commit().await?;
        Ok(chapters)
    }

    /// Applies an allow-listed update to a chapter. Fields absent from
    /// `update` keep their current value.
    pub async fn update_chapter(
        &self,
        user_id: &str,
        course_id: &str,
        chapter_id: &str,
        update: ChapterUpdate,
    ) -> Result<Chapter, AppError> {
        let mut tx = db::begin_write(&self.db).await?;
        owned_course(&mut tx, course_id, user_id).await?;
        let mut chapter = repository::find_chapter_in_course(&mut *tx, course_id, chapter_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if let Some(title) = update.title {
            chapter.title = required_title(&title)?.to_string();
        }
        if let Some(description) = update.description {
            chapter.description = description;
        }
        if let Some(video_url) = update.video_url {
            chapter.video_url = video_url
                .map(|url| validate_url("videoUrl", &url))
                .transpose()?;
        }
        if let Some(is_free) = update.is_free {
            chapter.is_free = is_free;
        }
        chapter.updated_at = repository::now();

        repository::update_chapter(&mut *tx, &chapter).await?;
        tx.commit().await?;
        Ok(chapter)
    }

    /// Deletes a chapter together with all of its sections.
    pub async fn delete_chapter(
        &self,
        user_id: &str,
        course_id: &str,
        chapter_id: &str,
    ) -> Result<Chapter, AppError> {
        let mut tx = db::begin_write(&self.db).await?;
        owned_course(&mut tx, course_id, user_id).await?;
        let chapter = repository::find_chapter_in_course(&mut *tx, course_id, chapter_id)
            .await?
            .ok_or(AppError::NotFound)?;

        repository::delete_sections_by_chapter(&mut *tx, chapter_id).await?;
        repository::delete_chapter(&mut *tx, chapter_id).await?;
        cascade::recompute_course(&mut tx, course_id).await?;
        tx.commit().await?;

        info!(course_id, chapter_id, "chapter deleted");
        Ok(chapter)
    }

    /// Deletes a section and a chapter as one unit and returns the chapter.
    ///
    /// The section may live under a different chapter of the same course; that
    /// chapter stays and has its publish flag recomputed. Sections left under
    /// the deleted chapter go with it.
    pub async fn delete_chapter_section(
        &self,
        user_id: &str,
        course_id: &str,
        chapter_id: &str,
        section_id: &str,
    ) -> Result<Chapter, AppError> {
        let mut tx = db::begin_write(&self.db).await?;
        owned_course(&mut tx, course_id, user_id).await?;
        let chapter = repository::find_chapter_in_course(&mut *tx, course_id, chapter_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let section = repository::find_section_in_course(&mut *tx, course_id, section_id)
            .await?
            .ok_or(AppError::NotFound)?;

        repository::delete_section(&mut *tx, &section.id).await?;
        if section.chapter_id != chapter.id {
            cascade::recompute_chapter(&mut tx, &section.chapter_id).await?;
        }

        let orphans = repository::delete_sections_by_chapter(&mut *tx, &chapter.id).await?;
        repository::delete_chapter(&mut *tx, &chapter.id).await?;
        cascade::recompute_course(&mut tx, course_id).await?;
        tx.commit().await?;

        info!(course_id, chapter_id, section_id, orphans, "chapter and section deleted");
        Ok(chapter)
    }

    pub async fn publish_chapter(
        &self,
        user_id: &str,
        course_id: &str,
        chapter_id: &str,
    ) -> Result<Chapter, AppError> {
        let mut tx = db::begin_write(&self.db).await?;
        owned_course(&mut tx, course_id, user_id).await?;
        let mut chapter = repository::find_chapter_in_course(&mut *tx, course_id, chapter_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if repository::count_published_sections(&mut *tx, chapter_id).await? == 0 {
            return Err(AppError::BadRequest(
                "chapter cannot be published without a published section".to_string(),
            ));
        }

        repository::set_chapter_published(&mut *tx, chapter_id, true).await?;
        tx.commit().await?;

        chapter.is_published = true;
        Ok(chapter)
    }

    pub async fn unpublish_chapter(
        &self,
        user_id: &str,
        course_id: &str,
        chapter_id: &str,
    ) -> Result<Chapter, AppError> {
        let mut tx = db::begin_write(&self.db).await?;
        owned_course(&mut tx, course_id, user_id).await?;
        let mut chapter = repository::find_chapter_in_course(&mut *tx, course_id, chapter_id)
            .await?
            .ok_or(AppError::NotFound)?;

        repository::set_chapter_published(&mut *tx, chapter_id, false).await?;
        cascade::recompute_course(&mut tx, course_id).await?;
        tx.commit().await?;

        chapter.is_published = false;
        Ok(chapter)
    }

    pub async fn create_section(
        &self,
        user_id: &str,
        course_id: &str,
        chapter_id: &str,
        req: NewSectionRequest,
    ) -> Result<Section, AppError> {
        let title = required_title(&req.title)?;
        let mut tx = db::begin_write(&self.db).await?;
        owned_course(&mut tx, course_id, user_id).await?;
        repository::find_chapter_in_course(&mut *tx, course_id, chapter_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let position = repository::next_section_position(&mut *tx, chapter_id).await?;
        let section = repository::insert_section(&mut *tx, chapter_id, title, position).await?;
        tx.commit().await?;
        Ok(section)
    }

    pub async fn update_section(
        &self,
        user_id: &str,
        course_id: &str,
        chapter_id: &str,
        section_id: &str,
        update: SectionUpdate,
    ) -> Result<Section, AppError> {
        let mut tx = db::begin_write(&self.db).await?;
        let mut section = owned_section(&mut tx, user_id, course_id, chapter_id, section_id).await?;

        if let Some(title) = update.title {
            section.title = required_title(&title)?.to_string();
        }
        if let Some(description) = update.description {
            section.description = description;
        }
        section.updated_at = repository::now();

        repository::update_section(&mut *tx, &section).await?;
        tx.commit().await?;
        Ok(section)
    }

    pub async fn publish_section(
        &self,
        user_id: &str,
        course_id: &str,
        chapter_id: &str,
        section_id: &str,
    ) -> Result<Section, AppError> {
        let mut tx = db::begin_write(&self.db).await?;
        let mut section = owned_section(&mut tx, user_id, course_id, chapter_id, section_id).await?;
        repository::set_section_published(&mut *tx, section_id, true).await?;
        tx.commit().await?;

        section.is_published = true;
        Ok(section)
    }

    /// Unpublishes a section, demoting its chapter and then its course when
    /// they are left without published children.
    pub async fn unpublish_section(
        &self,
        user_id: &str,
        course_id: &str,
        chapter_id: &str,
        section_id: &str,
    ) -> Result<Section, AppError> {
        let mut tx = db::begin_write(&self.db).await?;
        let mut section = owned_section(&mut tx, user_id, course_id, chapter_id, section_id).await?;
        repository::set_section_published(&mut *tx, section_id, false).await?;
        cascade::recompute_from_chapter(&mut tx, course_id, chapter_id).await?;
        tx.commit().await?;

        section.is_published = false;
        Ok(section)
    }
}

/// Missing and foreign courses are indistinguishable to the caller.
async fn owned_course(conn: &mut SqliteConnection, course_id: &str, user_id: &str) -> Result<Course, AppError> {
    repository::find_owned_course(&mut *conn, course_id, user_id)
        .await?
        .ok_or(AppError::Unauthorized)
}

async fn owned_section(
    conn: &mut SqliteConnection,
    user_id: &str,
    course_id: &str,
    chapter_id: &str,
    section_id: &str,
) -> Result<Section, AppError> {
    owned_course(&mut *conn, course_id, user_id).await?;
    repository::find_chapter_in_course(&mut *conn, course_id, chapter_id)
        .await?
        .ok_or(AppError::NotFound)?;
    repository::find_section_in_chapter(&mut *conn, chapter_id, section_id)
        .await?
        .ok_or(AppError::NotFound)
}

fn validate_reorder(list: &[ChapterPosition]) -> Result<(), AppError> {
    let mut ids = HashSet::new();
    let mut positions = HashSet::new();
    for entry in list {
        if entry.position < 1 {
            return Err(AppError::BadRequest(format!(
                "position for chapter '{}' must be at least 1",
                entry.id
            )));
        }
        if !ids.insert(entry.id.as_str()) {
            return Err(AppError::BadRequest(format!("chapter '{}' is listed twice", entry.id)));
        }
        if !positions.insert(entry.position) {
            return Err(AppError::BadRequest(format!(
                "position {} is given to more than one chapter",
                entry.position
            )));
        }
    }
    Ok(())
}

fn required_title(title: &str) -> Result<&str, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }
    Ok(title)
}

fn validate_url(field: &str, raw: &str) -> Result<String, AppError> {
    let url = reqwest::Url::parse(raw.trim())
        .map_err(|e| AppError::BadRequest(format!("{} is not a valid URL: {}", field, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(AppError::BadRequest(format!(
            "{} must use http or https, got '{}'",
            field, other
        ))),
    }
}
