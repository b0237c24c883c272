pub mod category;
pub mod chapter;
pub mod course;
pub mod section;

pub use category::{Category, HomePage, NewCategoryRequest};
pub use chapter::{
    Chapter, ChapterOutline, ChapterPosition, ChapterUpdate, NewChapterRequest, ReorderRequest,
};
pub use course::{Course, CourseCard, CourseOutline, CourseUpdate, HomeQuery, NewCourseRequest};
pub use section::{NewSectionRequest, Section, SectionUpdate};

use serde::{Deserialize, Deserializer};

/// Deserializes a PATCH field so that an explicit `null` (`Some(None)`)
/// differs from an absent key (`None`, via `#[serde(default)]`).
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
