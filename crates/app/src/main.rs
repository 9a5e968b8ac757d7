use std::fmt;
use std::io::Write as _;

use lesson_core::catalog::{self, git_basics};
use lesson_core::model::{LearnerId, SequenceExercise, UnitId};
use lesson_core::{ProgressEvent, ResponseKind};
use services::{AppServices, Clock, LessonSession};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

mod render;
mod repl;

use repl::{Command, HELP};

const DEFAULT_DB_URL: &str = "sqlite://lesson-lab.sqlite3";
const DEFAULT_LEARNER: &str = "learner";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLearner { raw: String },
    InvalidDbUrl { raw: String },
    UnknownCourse { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLearner { raw } => write!(f, "invalid --learner value: {raw:?}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::UnknownCourse { raw } => write!(
                f,
                "unknown course: {raw} (available: {})",
                catalog::COURSE_IDS.join(", ")
            ),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subcommand {
    Learn,
    Courses,
    Reset,
}

impl Subcommand {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "learn" => Some(Self::Learn),
            "courses" => Some(Self::Courses),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

struct Args {
    db_url: Option<String>,
    learner: LearnerId,
    course: String,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  lesson-lab [learn]  [--db <sqlite_url> | --memory] [--learner <id>] [--course <id>]");
    eprintln!("  lesson-lab courses  [--db <sqlite_url>] [--learner <id>]");
    eprintln!("  lesson-lab reset    [--db <sqlite_url>] [--learner <id>] [--course <id>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --learner {DEFAULT_LEARNER}");
    eprintln!("  --course {}", git_basics::COURSE_ID);
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LESSON_DB_URL, LESSON_LEARNER, LESSON_COURSE, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = Some(
            std::env::var("LESSON_DB_URL")
                .ok()
                .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url),
        );
        let mut learner = std::env::var("LESSON_LEARNER")
            .ok()
            .and_then(|value| value.parse::<LearnerId>().ok())
            .unwrap_or_else(|| LearnerId::new(DEFAULT_LEARNER));
        let mut course = std::env::var("LESSON_COURSE")
            .unwrap_or_else(|_| git_basics::COURSE_ID.to_string());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = Some(normalize_sqlite_url(value));
                }
                "--memory" => db_url = None,
                "--learner" => {
                    let value = require_value(args, "--learner")?;
                    learner = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLearner { raw: value.clone() })?;
                }
                "--course" => course = require_value(args, "--course")?,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if !catalog::COURSE_IDS.contains(&course.as_str()) {
            return Err(ArgsError::UnknownCourse { raw: course });
        }
        Ok(Self {
            db_url,
            learner,
            course,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

//
// ─── SHELL ─────────────────────────────────────────────────────────────────────
//

fn say(text: &str) {
    if !text.is_empty() {
        println!("{text}");
    }
}

fn prompt(lesson: &LessonSession) {
    print!("[{}] > ", lesson.progress().current_phase().id);
    let _ = std::io::stdout().flush();
}

async fn read_code(lines: &mut Lines<BufReader<Stdin>>) -> std::io::Result<String> {
    println!("Enter your code; finish with a line containing only `.`");
    let mut code = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "." {
            break;
        }
        code.push(line);
    }
    Ok(code.join("\n"))
}

fn report(lesson: &LessonSession, events: &[ProgressEvent]) {
    say(&render::events(events));
    if lesson.last_save_failed() {
        eprintln!("warning: progress could not be saved; it is kept for this session only");
    }
}

async fn place_step(
    lesson: &mut LessonSession,
    order: &mut SequenceExercise,
    step: &str,
    slot: usize,
) {
    if let Err(err) = order.place(step, slot) {
        say(&lesson_core::Error::from(err).to_string());
        return;
    }
    say(&render::sequence(order));
    if order.is_correct() {
        let events = lesson
            .set_unit(&UnitId::new(git_basics::SEQUENCE_UNIT), true)
            .await;
        report(lesson, &events);
    }
}

async fn shell(mut lesson: LessonSession) -> Result<(), Box<dyn std::error::Error>> {
    let mut order = (lesson.key().course.as_str() == git_basics::COURSE_ID)
        .then(git_basics::command_order);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    say(&render::view(&lesson.view()));
    println!("\nType `help` for commands.");
    prompt(&lesson);

    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(repl::ParseError::Empty) => {
                prompt(&lesson);
                continue;
            }
            Err(err) => {
                say(&err.to_string());
                prompt(&lesson);
                continue;
            }
        };
        tracing::debug!(?command, "shell command");

        match command {
            Command::Help => say(HELP),
            Command::Status => say(&render::view(&lesson.view())),
            Command::Toggle(unit) => {
                let toggle = lesson.toggle_unit(&unit).await;
                if let Some(text) = render::toggle(unit.as_str(), toggle.outcome) {
                    say(&text);
                }
                report(&lesson, &toggle.events);
            }
            Command::Done(unit) => {
                let events = lesson.set_unit(&unit, true).await;
                report(&lesson, &events);
            }
            Command::Undo(unit) => {
                let events = lesson.set_unit(&unit, false).await;
                report(&lesson, &events);
            }
            Command::Complete(section) => {
                let events = lesson.complete_section(&section).await;
                if events.is_empty() {
                    say(&format!("nothing to do for section {section}"));
                }
                report(&lesson, &events);
            }
            Command::Finish(section) => {
                let events = lesson.complete_section_filling_units(&section).await;
                report(&lesson, &events);
            }
            Command::Code(unit) => {
                if lesson.progress().outline().exercise(&unit).is_none() {
                    say(&format!("no code exercise for {unit}"));
                } else {
                    let code = read_code(&mut lines).await?;
                    if let Some(submission) = lesson.submit_code(&unit, &code).await {
                        say(&render::validation(&submission.result, submission.accepted));
                        report(&lesson, &submission.events);
                    }
                }
            }
            Command::Shell(input) => {
                if let Some(submission) = lesson.run_command(&input).await {
                    match submission.result.kind {
                        ResponseKind::Clear => say("(terminal cleared)"),
                        _ => say(&submission.result.output),
                    }
                    report(&lesson, &submission.events);
                }
            }
            Command::Concept => say(&render::concept(&lesson.view())),
            Command::NextConcept => {
                let events = lesson.next_concept().await;
                say(&render::concept(&lesson.view()));
                report(&lesson, &events);
            }
            Command::PreviousConcept => {
                if !lesson.previous_concept() {
                    say("already at the first concept");
                }
                say(&render::concept(&lesson.view()));
            }
            Command::Advance => match lesson.advance().await {
                Ok(phase) => say(&format!("now in phase {phase}")),
                Err(err) => say(&render::gate_error(&err)),
            },
            Command::GoTo(phase) => match lesson.go_to(&phase).await {
                Ok(()) => say(&format!("now in phase {phase}")),
                Err(err) => say(&render::gate_error(&err)),
            },
            Command::Order => match &order {
                Some(exercise) => say(&render::sequence(exercise)),
                None => say("this course has no ordering challenge"),
            },
            Command::Place { step, slot } => match order.as_mut() {
                Some(exercise) => place_step(&mut lesson, exercise, &step, slot).await,
                None => say("this course has no ordering challenge"),
            },
            Command::ClearSlot(slot) => match order.as_mut() {
                Some(exercise) => {
                    exercise.clear_slot(slot);
                    say(&render::sequence(exercise));
                }
                None => say("this course has no ordering challenge"),
            },
            Command::Quit => break,
        }
        prompt(&lesson);
    }

    println!();
    Ok(())
}

//
// ─── ENTRY ─────────────────────────────────────────────────────────────────────
//

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Subcommand::Learn,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Subcommand::Learn,
        Some(first) => Subcommand::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let clock = Clock::default();
    let services = match &parsed.db_url {
        Some(db_url) => {
            // Open + migrate SQLite at startup; core and services stay storage-agnostic.
            prepare_sqlite_file(db_url)?;
            AppServices::new_sqlite(db_url, clock).await?
        }
        None => AppServices::in_memory(clock),
    };
    tracing::info!(
        learner = %parsed.learner,
        course = %parsed.course,
        persistent = parsed.db_url.is_some(),
        "lesson-lab starting"
    );
    let progress = services.progress();

    match cmd {
        Subcommand::Learn => {
            let lesson = progress.open_builtin(&parsed.learner, &parsed.course).await?;
            shell(lesson).await
        }
        Subcommand::Courses => {
            let entries = progress.progress_for(&parsed.learner).await?;
            if entries.is_empty() {
                println!("{} has not started any course yet.", parsed.learner);
            }
            for entry in entries {
                println!(
                    "{:<14} last saved {}",
                    entry.course,
                    entry.updated_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
            Ok(())
        }
        Subcommand::Reset => {
            let removed = progress.reset(&parsed.learner, &parsed.course).await?;
            if removed {
                println!("Progress in {} cleared.", parsed.course);
            } else {
                println!("No saved progress in {}.", parsed.course);
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
