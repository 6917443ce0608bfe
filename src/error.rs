use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the pipeline core.
///
/// Apart from `Config`, every variant is recoverable per-item: the pending
/// set is left unchanged and the caller may retry or move on.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Startup-only: missing or malformed configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The caller asked to categorize without supplying a category.
    #[error("no category selected for '{image}'")]
    CategoryMissing { image: String },

    /// A crop region that is unusable even after clamping.
    #[error("invalid crop region: {reason}")]
    InvalidRegion { reason: String },

    /// A filesystem operation failed; the source item is still pending.
    #[error("i/o failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image could not be decoded; the item is skipped, not fatal.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn decode(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Decode {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_region(reason: impl Into<String>) -> Self {
        Self::InvalidRegion {
            reason: reason.into(),
        }
    }

    /// True when the error should skip the current item and continue a batch.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Io { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
