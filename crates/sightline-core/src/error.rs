//! Error types for sightline.

use thiserror::Error;

/// The main error type for sightline operations.
///
/// Only configuration and backend setup can fail. Per-frame computation
/// never errors: empty inputs and degenerate math resolve to empty results.
#[derive(Error, Debug)]
pub enum SightlineError {
    /// Field of view outside the open interval (0, 180) degrees.
    #[error("field of view must be within (0, 180) degrees, got {0}")]
    InvalidFieldOfView(f32),

    /// Aspect ratio that is not strictly positive.
    #[error("aspect ratio must be positive, got {0}")]
    InvalidAspectRatio(f32),

    /// Near/far clip distances that do not form a valid range.
    #[error("invalid clip range: near {near}, far {far}")]
    InvalidClipRange { near: f32, far: f32 },

    /// Forward and up vectors that are zero or parallel.
    #[error("viewer basis is degenerate (forward and up must be non-zero and not parallel)")]
    DegenerateViewerBasis,

    /// Batch processing context (worker pool) could not be created.
    #[error("failed to create batch context: {0}")]
    BatchContext(String),

    /// JSON options could not be parsed.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for sightline operations.
pub type Result<T> = std::result::Result<T, SightlineError>;
