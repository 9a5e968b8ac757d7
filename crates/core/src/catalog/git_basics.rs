use crate::model::{
    Achievement, ChecklistItem, CommandEntry, CommandPattern, CommandTable, Concept, CourseError,
    CourseOutline, SectionDefinition, SectionRequirement, SequenceExercise,
};

pub const COURSE_ID: &str = "git-basics";

/// Unit set once the command-ordering challenge is answered correctly.
pub const SEQUENCE_UNIT: &str = "sequence-challenge";

const STATUS_OUTPUT: &str = "On branch main

No commits yet

Untracked files:
  (use \"git add <file>...\" to include in what will be committed)
        index.html

nothing added to commit but untracked files present (use \"git add\" to track)";

const COMMIT_OUTPUT: &str = "[main (root-commit) a1b2c3d] {arg}
 1 file changed, 1 insertion(+)
 create mode 100644 index.html";

const LOG_OUTPUT: &str = "commit a1b2c3d4e5f6789012345678901234567890abcd (HEAD -> main)
Author: Your Name <your.email@example.com>
Date:   {date}

    Initial commit: Add homepage";

/// Simulated `git` for the hands-on practice section.
#[must_use]
pub fn practice_terminal() -> CommandTable {
    CommandTable::new()
        .for_program("git")
        .entry(
            CommandEntry::exact(
                "git init",
                "Initialized empty Git repository in ~/practice-repo/.git/",
            )
            .satisfies("ex1"),
        )
        .entry(CommandEntry::exact("git status", STATUS_OUTPUT).satisfies("ex2"))
        .entry(
            CommandEntry::new(
                CommandPattern::AnyOf(vec!["git add .".into(), "git add -A".into()]),
                "",
            )
            .satisfies("ex3"),
        )
        .entry(
            CommandEntry::new(
                CommandPattern::QuotedArgument {
                    prefix: "git commit -m".into(),
                    missing: "error: switch `m' requires a value".into(),
                },
                COMMIT_OUTPUT,
            )
            .satisfies("ex4"),
        )
        .entry(CommandEntry::exact("git log", LOG_OUTPUT).satisfies("ex5"))
        .describe("add", "Add file contents to the index")
        .describe("commit", "Record changes to the repository")
        .describe("init", "Create an empty Git repository")
        .describe("log", "Show commit logs")
        .describe("status", "Show the working tree status")
}

/// Drag-into-order challenge for the commands section.
#[must_use]
pub fn command_order() -> SequenceExercise {
    SequenceExercise::new(
        ["init", "create", "add", "commit", "push"]
            .into_iter()
            .map(String::from)
            .collect(),
    )
}

fn installation() -> SectionDefinition {
    SectionDefinition::new(
        "section0",
        "Installing Git",
        SectionRequirement::Checklist(vec![
            ChecklistItem::new("section0-0", "Downloaded and installed Git on my computer")
                .with_deps([
                    "install-choose-method",
                    "install-download-git",
                    "install-run-installer",
                ]),
            ChecklistItem::new("section0-1", "Verified Git is working with \"git --version\"")
                .with_deps(["install-verify-install"]),
            ChecklistItem::new("section0-2", "Configured my name with git config")
                .with_deps(["setup-name"]),
            ChecklistItem::new("section0-3", "Configured my email with git config")
                .with_deps(["setup-email"]),
        ]),
    )
}

fn version_control() -> SectionDefinition {
    SectionDefinition::new(
        "section1",
        "Version Control Basics",
        SectionRequirement::all_of(["section1-0", "section1-1", "section1-2", "section1-3"]),
    )
}

fn commands() -> SectionDefinition {
    SectionDefinition::new(
        "section2",
        "Git Commands",
        SectionRequirement::Every(vec![
            SectionRequirement::PrefixCount {
                prefix: "cmd-".into(),
                count: 3,
            },
            SectionRequirement::all_of([SEQUENCE_UNIT]),
        ]),
    )
}

fn repository() -> SectionDefinition {
    SectionDefinition::new(
        "section3",
        "GitHub Repository",
        SectionRequirement::all_of(
            ["folder", "html", "init", "add", "commit", "remote", "push"].map(|s| format!("step-{s}")),
        ),
    )
}

fn hands_on() -> SectionDefinition {
    SectionDefinition::new(
        "section4",
        "Hands-On Practice",
        SectionRequirement::all_of(["ex1", "ex2", "ex3", "ex4", "ex5"]),
    )
}

/// Web fundamentals read between setup and the first project.
#[must_use]
pub fn concepts() -> Vec<Concept> {
    vec![
        Concept::new("concept-0", "What is HTML?", "The Foundation of the Web").with_key_points([
            "HTML provides structure to web content",
            "Uses opening and closing tags: <tag>content</tag>",
            "Tells browsers how to display content",
            "Every website uses HTML as its foundation",
        ]),
        Concept::new(
            "concept-1",
            "HTML Document Structure",
            "The Basic Template Every Website Needs",
        )
        .with_key_points([
            "DOCTYPE declaration comes first",
            "<html> wraps the entire document",
            "<head> contains metadata (title, links to CSS)",
            "<body> contains all visible content",
        ]),
        Concept::new(
            "concept-2",
            "HTML Tags and Elements",
            "The Building Blocks of Web Content",
        )
        .with_key_points([
            "Opening tag: <tagname>",
            "Closing tag: </tagname> (note the slash)",
            "Self-closing tags: <img>, <br>, <hr>",
            "Content + tags = element",
        ]),
        Concept::new(
            "concept-3",
            "Essential HTML Elements",
            "The Most Important Tags You'll Use Daily",
        )
        .with_key_points([
            "h1-h6: Headings (h1 is most important)",
            "p: Paragraphs of text",
            "a: Links to other pages",
            "img: Images (needs src and alt attributes)",
        ]),
        Concept::new(
            "concept-4",
            "Attributes: Adding Details to Elements",
            "How to Customize and Configure HTML Elements",
        )
        .with_key_points([
            "Written as name='value' inside opening tags",
            "href: destination for links",
            "src: source file for images",
            "alt: description for images (accessibility)",
        ]),
    ]
}

/// The Git and GitHub beginner course.
///
/// # Errors
///
/// Returns `CourseError` if the definitions above are inconsistent.
pub fn course() -> Result<CourseOutline, CourseError> {
    let concepts = concepts();
    let concept_units: Vec<_> = concepts.iter().map(|c| c.unit.clone()).collect();
    CourseOutline::builder(COURSE_ID, "Git & GitHub Basics")
        .concepts(concepts)
        .units((0..5).map(|idx| format!("cmd-{idx}")))
        .section(installation())
        .section(version_control())
        .section(commands())
        .section(repository())
        .section(hands_on())
        .section(SectionDefinition::new(
            "concepts",
            "Core Concepts",
            SectionRequirement::AllOf(concept_units),
        ))
        .section(SectionDefinition::new(
            "first-project",
            "Your First Project",
            SectionRequirement::Manual,
        ))
        .phase("setup", "Setup", "section4")
        .phase("concepts", "Concepts", "concepts")
        .phase("getting-started", "Getting Started", "first-project")
        .commands(practice_terminal())
        .achievement(
            Achievement::new("repo-initialized", "Fresh Start", "ex1")
                .with_description("Initialized your first repository"),
        )
        .achievement(
            Achievement::new("first-commit", "First Commit", "ex4")
                .with_description("Recorded your first snapshot"),
        )
        .achievement(
            Achievement::new("time-traveler", "Time Traveler", "ex5")
                .with_description("Read your commit history"),
        )
        .achievement(
            Achievement::new("workflow-master", "Workflow Master", SEQUENCE_UNIT)
                .with_description("Put the Git workflow in the right order"),
        )
        .build()
}
