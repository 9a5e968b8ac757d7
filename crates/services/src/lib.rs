#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod progress_service;
pub mod view;

pub use lesson_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ProgressServiceError};
pub use progress_service::{LessonSession, ProgressService};
pub use view::{AchievementView, ConceptView, LessonView, PhaseView, SectionView};
