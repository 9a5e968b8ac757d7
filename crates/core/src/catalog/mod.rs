//! Built-in courses.

pub mod git_basics;
pub mod html_basics;

use crate::model::{CourseError, CourseOutline};

/// Ids of every built-in course, in menu order.
pub const COURSE_IDS: [&str; 2] = [git_basics::COURSE_ID, html_basics::COURSE_ID];

/// Builds the built-in course with the given id.
///
/// Returns `Ok(None)` for ids that are not built in.
///
/// # Errors
///
/// Returns `CourseError` if the course definition is inconsistent.
pub fn course(id: &str) -> Result<Option<CourseOutline>, CourseError> {
    match id {
        git_basics::COURSE_ID => git_basics::course().map(Some),
        html_basics::COURSE_ID => html_basics::course().map(Some),
        _ => Ok(None),
    }
}
