use crate::model::{
    Achievement, CodeExercise, CompletionPolicy, CourseError, CourseOutline, SectionDefinition,
    SectionRequirement, ValidationRule,
};

pub const COURSE_ID: &str = "html-basics";

fn first_page() -> CodeExercise {
    CodeExercise::new(
        "html-page",
        "Write your first page",
        vec![
            ValidationRule::matches("doctype", "<!doctype html>", "Start with <!DOCTYPE html>"),
            ValidationRule::balanced_tag("html", "html", "Wrap everything in <html>...</html>"),
            ValidationRule::balanced_tag("body", "body", "Put visible content inside <body>"),
        ],
    )
}

fn heading_and_paragraph() -> CodeExercise {
    CodeExercise::new(
        "html-text",
        "Headings and paragraphs",
        vec![
            ValidationRule::matches("h1", "<h1>.+</h1>", "Add a non-empty <h1> heading"),
            ValidationRule::contains("p", "<p>", "Add a paragraph with <p>"),
            ValidationRule::balanced_tag("p-closed", "p", "Close every <p> you open"),
        ],
    )
}

fn links_and_images() -> CodeExercise {
    CodeExercise::new(
        "html-media",
        "Links and images",
        vec![
            ValidationRule::matches("link", r#"<a href=["'][^"']+["']"#, "Link somewhere with <a href=\"...\">"),
            ValidationRule::matches("img", r#"<img [^>]*src=["'][^"']+["']"#, "Show an image with <img src=\"...\">"),
            ValidationRule::matches("alt", r#"<img [^>]*alt=["'][^"']+["']"#, "Describe the image with an alt attribute"),
        ],
    )
    .with_policy(CompletionPolicy::MinScore(2.0 / 3.0))
}

/// HTML exercises checked by the code validator.
///
/// # Errors
///
/// Returns `CourseError` if the definitions above are inconsistent.
pub fn course() -> Result<CourseOutline, CourseError> {
    CourseOutline::builder(COURSE_ID, "HTML Basics")
        .section(SectionDefinition::new(
            "structure",
            "Page Structure",
            SectionRequirement::all_of(["html-page", "html-text"]),
        ))
        .section(SectionDefinition::new(
            "media",
            "Links & Images",
            SectionRequirement::all_of(["html-media"]),
        ))
        .phase("structure", "Structure", "structure")
        .phase("media", "Media", "media")
        .exercise(first_page())
        .exercise(heading_and_paragraph())
        .exercise(links_and_images())
        .achievement(
            Achievement::new("hello-web", "Hello, Web", "html-page")
                .with_description("Wrote a complete HTML document"),
        )
        .build()
}
