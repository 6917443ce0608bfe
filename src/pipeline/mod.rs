//! The stage pipeline engine: a directory-backed state machine over five
//! fixed directories, a restart-safe naming allocator, and the crop and
//! rotation generators that derive new images from a source image.

pub mod categorize;
pub mod crop;
pub mod multicrop;
pub mod naming;
pub mod progress;
pub mod rotate;
pub mod store;

pub use categorize::{categorize, reject};
pub use crop::{crop, CropRect};
pub use multicrop::{commit, generate_candidates, CandidateOptions, CandidateSet, CropWindow};
pub use naming::{derive_next_counter, NameAllocator};
pub use progress::BatchProgress;
pub use rotate::{rotate_all, rotate_stage, RotateSummary, ROTATION_BUCKETS};
pub use store::{Stage, StageStore, STAGE_DIRS};
