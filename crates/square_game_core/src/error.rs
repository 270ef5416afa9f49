//! Error types for grid construction and collaborator calls.

use derive_more::{Display, Error, From};
use tracing::instrument;

use crate::palette::Color;

/// A color palette that cannot be used to paint cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum PaletteError {
    /// The palette has no colors at all.
    #[display("Palette must contain at least one color")]
    Empty,

    /// The same color appears more than once.
    #[display("Palette lists {} more than once", _0)]
    Duplicate(#[error(not(source))] Color),
}

/// Failure to build a card grid.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum GridError {
    /// Grids smaller than 2x2 cannot hold a pair.
    #[display("Grid size {} is too small (minimum is 2)", _0)]
    #[from(skip)]
    TooSmall(#[error(not(source))] usize),

    /// The palette was rejected.
    #[display("Invalid palette: {}", _0)]
    Palette(PaletteError),
}

/// Failure reported by an external collaborator (profile service, score store).
///
/// The session logs these and carries on; they never alter round state.
#[derive(Debug, Clone, Display, Error)]
#[display("Collaborator error: {} at {}:{}", message, file, line)]
pub struct CollaboratorError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl CollaboratorError {
    /// Creates a new collaborator error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
