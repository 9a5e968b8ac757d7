use thiserror::Error;

use crate::gate::GateError;
use crate::model::{CourseError, ParseIdError, SequenceError};

/// Any failure the engine reports to a host.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error(transparent)]
    InvalidId(#[from] ParseIdError),
}
