//! Publish-state invariants.
//!
//! A course may only be published while it has a published chapter, and a
//! chapter only while it has a published section. These helpers demote a
//! parent that no longer qualifies; they never publish anything. They take a
//! connection so callers run them inside the transaction that caused the
//! change.

use sqlx::SqliteConnection;
use tracing::info;

use crate::db::repository;

/// Unpublishes the chapter if none of its sections is published.
/// Returns `true` when the chapter was demoted.
pub async fn recompute_chapter(conn: &mut SqliteConnection, chapter_id: &str) -> Result<bool, sqlx::Error> {
    if repository::count_published_sections(&mut *conn, chapter_id).await? > 0 {
        return Ok(false);
    }

    let demoted = demote_chapter(&mut *conn, chapter_id).await?;
    if demoted {
        info!(chapter_id, "chapter unpublished: no published sections left");
    }
    Ok(demoted)
}

/// Unpublishes the course if none of its chapters is published.
/// Returns `true` when the course was demoted.
pub async fn recompute_course(conn: &mut SqliteConnection, course_id: &str) -> Result<bool, sqlx::Error> {
    if repository::count_published_chapters(&mut *conn, course_id).await? > 0 {
        return Ok(false);
    }

    let demoted = demote_course(&mut *conn, course_id).await?;
    if demoted {
        info!(course_id, "course unpublished: no published chapters left");
    }
    Ok(demoted)
}

/// Recomputes a chapter and, if it was demoted, its course.
pub async fn recompute_from_chapter(
    conn: &mut SqliteConnection,
    course_id: &str,
    chapter_id: &str,
) -> Result<(), sqlx::Error> {
    if recompute_chapter(&mut *conn, chapter_id).await? {
        recompute_course(&mut *conn, course_id).await?;
    }
    Ok(())
}

async fn demote_chapter(conn: &mut SqliteConnection, chapter_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE chapters SET is_published = 0, updated_at = ?1 WHERE id = ?2 AND is_published = 1",
    )
    .bind(repository::now())
    .bind(chapter_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

async fn demote_course(conn: &mut SqliteConnection, course_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE courses SET is_published = 0, updated_at = ?1 WHERE id = ?2 AND is_published = 1",
    )
    .bind(repository::now())
    .bind(course_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use sqlx::SqlitePool;

    use super::*;

    async fn pool() -> SqlitePool {
        crate::db::connect("sqlite::memory:", 1)
            .await
            .expect("Failed to create database")
    }

    async fn published_tree(pool: &SqlitePool) -> (String, String, String) {
        let course = repository::insert_course(pool, "u1", "Course").await.unwrap();
        let chapter = repository::insert_chapter(pool, &course.id, "Chapter", 1).await.unwrap();
        let section = repository::insert_section(pool, &chapter.id, "Section", 1).await.unwrap();
        repository::set_section_published(pool, &section.id, true).await.unwrap();
        repository::set_chapter_published(pool, &chapter.id, true).await.unwrap();
        repository::set_course_published(pool, &course.id, true).await.unwrap();
        (course.id, chapter.id, section.id)
    }

    #[tokio::test]
    async fn keeps_chapter_with_published_section() {
        let pool = pool().await;
        let (course_id, chapter_id, _) = published_tree(&pool).await;

        let mut conn = pool.acquire().await.unwrap();
        assert!(!recompute_chapter(&mut conn, &chapter_id).await.unwrap());
        assert!(!recompute_course(&mut conn, &course_id).await.unwrap());
    }

    #[tokio::test]
    async fn demotes_chapter_then_course() {
        let pool = pool().await;
        let (course_id, chapter_id, section_id) = published_tree(&pool).await;
        repository::set_section_published(&pool, &section_id, false).await.unwrap();

        {
            let mut conn = pool.acquire().await.unwrap();
            recompute_from_chapter(&mut conn, &course_id, &chapter_id).await.unwrap();
        }

        let chapter = repository::find_chapter_in_course(&pool, &course_id, &chapter_id)
            .await
            .unwrap()
            .unwrap();
        let course = repository::find_course_by_id(&pool, &course_id).await.unwrap().unwrap();
        assert!(!chapter.is_published);
        assert!(!course.is_published);
    }

    #[tokio::test]
    async fn demotion_never_promotes() {
        let pool = pool().await;
        let course = repository::insert_course(&pool, "u1", "Draft").await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        assert!(!recompute_course(&mut conn, &course.id).await.unwrap());
        drop(conn);

        let course = repository::find_course_by_id(&pool, &course.id).await.unwrap().unwrap();
        assert!(!course.is_published);
    }
}
