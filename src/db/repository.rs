use chrono::Utc;
use sqlx::SqliteExecutor;
use uuid::Uuid;

use crate::models::{Category, Chapter, Course, CourseCard, Section};

pub fn now() -> String {
    Utc::now().to_rfc3339()
}

pub async fn ping<'e, E>(db: E) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("SELECT 1").execute(db).await?;
    Ok(())
}

// ---- categories ----

pub async fn fetch_categories<'e, E>(db: E) -> Result<Vec<Category>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name ASC")
        .fetch_all(db)
        .await
}

pub async fn find_category_by_id<'e, E>(db: E, id: &str) -> Result<Option<Category>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert_category<'e, E>(db: E, name: &str) -> Result<Category, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = Uuid::new_v4().to_string();

    sqlx::query("INSERT INTO categories (id, name) VALUES (?1, ?2)")
        .bind(&id)
        .bind(name)
        .execute(db)
        .await?;

    Ok(Category {
        id,
        name: name.to_string(),
    })
}

// ---- courses ----

pub async fn fetch_published_course_cards<'e, E>(
    db: E,
    title: Option<&str>,
    category_id: Option<&str>,
) -> Result<Vec<CourseCard>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, CourseCard>(
        r#"
        SELECT
            c.id,
            c.title,
            c.description,
            c.image_url,
            c.price,
            c.category_id,
            cat.name AS category_name,
            (
                SELECT COUNT(*) FROM chapters ch
                WHERE ch.course_id = c.id AND ch.is_published = 1
            ) AS chapters_count,
            c.created_at
        FROM courses c
        LEFT JOIN categories cat ON cat.id = c.category_id
        WHERE c.is_published = 1
          AND (?1 IS NULL OR instr(lower(c.title), lower(?1)) > 0)
          AND (?2 IS NULL OR c.category_id = ?2)
        ORDER BY c.created_at DESC
        "#,
    )
    .bind(title)
    .bind(category_id)
    .fetch_all(db)
    .await
}

pub async fn fetch_courses_by_user<'e, E>(db: E, user_id: &str) -> Result<Vec<Course>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Course>(
        "SELECT id, user_id, title, description, image_url, price, is_published, category_id, created_at, updated_at FROM courses WHERE user_id = ? ORDER BY created_at DESC"
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn find_course_by_id<'e, E>(db: E, id: &str) -> Result<Option<Course>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Course>(
        "SELECT id, user_id, title, description, image_url, price, is_published, category_id, created_at, updated_at FROM courses WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Returns the course only when `user_id` owns it.
pub async fn find_owned_course<'e, E>(
    db: E,
    id: &str,
    user_id: &str,
) -> Result<Option<Course>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Course>(
        "SELECT id, user_id, title, description, image_url, price, is_published, category_id, created_at, updated_at FROM courses WHERE id = ? AND user_id = ?"
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn insert_course<'e, E>(db: E, user_id: &str, title: &str) -> Result<Course, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = Uuid::new_v4().to_string();
    let now = now();

    sqlx::query(
        r#"
        INSERT INTO courses
            (id, user_id, title, description, image_url, price,
            is_published, category_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, NULL, NULL, NULL, 0, NULL, ?4, ?4)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(title)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(Course {
        id,
        user_id: user_id.to_string(),
        title: title.to_string(),
        description: None,
        image_url: None,
        price: None,
        is_published: false,
        category_id: None,
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Writes the editable columns of `course`. Ownership and publish state are untouched.
pub async fn update_course<'e, E>(db: E, course: &Course) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE courses
        SET title = ?1,
            description = ?2,
            image_url = ?3,
            price = ?4,
            category_id = ?5,
            updated_at = ?6
        WHERE id = ?7
        "#,
    )
    .bind(&course.title)
    .bind(&course.description)
    .bind(&course.image_url)
    .bind(course.price)
    .bind(&course.category_id)
    .bind(&course.updated_at)
    .bind(&course.id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn set_course_published<'e, E>(db: E, id: &str, published: bool) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE courses SET is_published = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(published)
        .bind(now())
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn delete_course<'e, E>(db: E, id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

// ---- chapters ----

pub async fn fetch_chapters_by_course<'e, E>(db: E, course_id: &str) -> Result<Vec<Chapter>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Chapter>(
        "SELECT id, course_id, title, description, video_url, position, is_published, is_free, created_at, updated_at FROM chapters WHERE course_id = ? ORDER BY position ASC"
    )
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn find_chapter_in_course<'e, E>(
    db: E,
    course_id: &str,
    chapter_id: &str,
) -> Result<Option<Chapter>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Chapter>(
        "SELECT id, course_id, title, description, video_url, position, is_published, is_free, created_at, updated_at FROM chapters WHERE id = ? AND course_id = ?"
    )
    .bind(chapter_id)
    .bind(course_id)
    .fetch_optional(db)
    .await
}

pub async fn next_chapter_position<'e, E>(db: E, course_id: &str) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(MAX(position), 0) + 1 FROM chapters WHERE course_id = ?",
    )
    .bind(course_id)
    .fetch_one(db)
    .await
}

pub async fn insert_chapter<'e, E>(
    db: E,
    course_id: &str,
    title: &str,
    position: i64,
) -> Result<Chapter, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = Uuid::new_v4().to_string();
    let now = now();

    sqlx::query(
        r#"
        INSERT INTO chapters
            (id, course_id, title, description, video_url, position,
            is_published, is_free, created_at, updated_at)
        VALUES (?1, ?2, ?3, NULL, NULL, ?4, 0, 0, ?5, ?5)
        "#,
    )
    .bind(&id)
    .bind(course_id)
    .bind(title)
    .bind(position)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(Chapter {
        id,
        course_id: course_id.to_string(),
        title: title.to_string(),
        description: None,
        video_url: None,
        position,
        is_published: false,
        is_free: false,
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Writes the editable columns of `chapter`.
pub async fn update_chapter<'e, E>(db: E, chapter: &Chapter) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE chapters
        SET title = ?1,
            description = ?2,
            video_url = ?3,
            is_free = ?4,
            updated_at = ?5
        WHERE id = ?6
        "#,
    )
    .bind(&chapter.title)
    .bind(&chapter.description)
    .bind(&chapter.video_url)
    .bind(chapter.is_free)
    .bind(&chapter.updated_at)
    .bind(&chapter.id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn set_chapter_position<'e, E>(
    db: E,
    course_id: &str,
    chapter_id: &str,
    position: i64,
) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE chapters SET position = ?1, updated_at = ?2 WHERE id = ?3 AND course_id = ?4",
    )
    .bind(position)
    .bind(now())
    .bind(chapter_id)
    .bind(course_id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn set_chapter_published<'e, E>(db: E, id: &str, published: bool) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE chapters SET is_published = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(published)
        .bind(now())
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn count_published_chapters<'e, E>(db: E, course_id: &str) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM chapters WHERE course_id = ? AND is_published = 1",
    )
    .bind(course_id)
    .fetch_one(db)
    .await
}

pub async fn delete_chapter<'e, E>(db: E, id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM chapters WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_chapters_by_course<'e, E>(db: E, course_id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM chapters WHERE course_id = ?")
        .bind(course_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

// ---- sections ----

/// All sections under a course, ordered by chapter position then section position.
pub async fn fetch_sections_by_course<'e, E>(db: E, course_id: &str) -> Result<Vec<Section>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Section>(
        r#"
        SELECT
            s.id, s.chapter_id, s.title, s.description, s.position,
            s.is_published, s.created_at, s.updated_at
        FROM sections s
        JOIN chapters ch ON ch.id = s.chapter_id
        WHERE ch.course_id = ?
        ORDER BY ch.position ASC, s.position ASC
        "#,
    )
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn find_section_in_chapter<'e, E>(
    db: E,
    chapter_id: &str,
    section_id: &str,
) -> Result<Option<Section>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Section>(
        "SELECT id, chapter_id, title, description, position, is_published, created_at, updated_at FROM sections WHERE id = ? AND chapter_id = ?"
    )
    .bind(section_id)
    .bind(chapter_id)
    .fetch_optional(db)
    .await
}

/// Finds a section anywhere under the course, whichever chapter holds it.
pub async fn find_section_in_course<'e, E>(
    db: E,
    course_id: &str,
    section_id: &str,
) -> Result<Option<Section>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Section>(
        r#"
        SELECT
            s.id, s.chapter_id, s.title, s.description, s.position,
            s.is_published, s.created_at, s.updated_at
        FROM sections s
        JOIN chapters ch ON ch.id = s.chapter_id
        WHERE s.id = ? AND ch.course_id = ?
        "#,
    )
    .bind(section_id)
    .bind(course_id)
    .fetch_optional(db)
    .await
}

pub async fn next_section_position<'e, E>(db: E, chapter_id: &str) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(MAX(position), 0) + 1 FROM sections WHERE chapter_id = ?",
    )
    .bind(chapter_id)
    .fetch_one(db)
    .await
}

pub async fn insert_section<'e, E>(
    db: E,
    chapter_id: &str,
    title: &str,
    position: i64,
) -> Result<Section, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = Uuid::new_v4().to_string();
    let now = now();

    sqlx::query(
        r#"
        INSERT INTO sections
            (id, chapter_id, title, description, position,
            is_published, created_at, updated_at)
        VALUES (?1, ?2, ?3, NULL, ?4, 0, ?5, ?5)
        "#,
    )
    .bind(&id)
    .bind(chapter_id)
    .bind(title)
    .bind(position)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(Section {
        id,
        chapter_id: chapter_id.to_string(),
        title: title.to_string(),
        description: None,
        position,
        is_published: false,
        created_at: now.clone(),
        updated_at: now,
    })
}

pub async fn update_section<'e, E>(db: E, section: &Section) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE sections SET title = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
    )
    .bind(&section.title)
    .bind(&section.description)
    .bind(&section.updated_at)
    .bind(&section.id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn set_section_published<'e, E>(db: E, id: &str, published: bool) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE sections SET is_published = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(published)
        .bind(now())
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn count_published_sections<'e, E>(db: E, chapter_id: &str) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sections WHERE chapter_id = ? AND is_published = 1",
    )
    .bind(chapter_id)
    .fetch_one(db)
    .await
}

pub async fn delete_section<'e, E>(db: E, id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM sections WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_sections_by_chapter<'e, E>(db: E, chapter_id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM sections WHERE chapter_id = ?")
        .bind(chapter_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_sections_by_course<'e, E>(db: E, course_id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "DELETE FROM sections WHERE chapter_id IN (SELECT id FROM chapters WHERE course_id = ?)",
    )
    .bind(course_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}
