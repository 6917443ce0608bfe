// Library exports for reuse by a selection UI or other applications
pub mod cli;
pub mod config_file;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use config_file::{Category, CuratorConfig};
pub use error::PipelineError;
pub use pipeline::{
    BatchProgress, CandidateOptions, CandidateSet, CropRect, CropWindow, NameAllocator,
    RotateSummary, Stage, StageStore,
};
