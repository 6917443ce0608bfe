use std::path::{Path, PathBuf};

use crate::config_file::CuratorConfig;
use crate::error::{PipelineError, Result};
use crate::utils::dotted_extension;

use super::naming::NameAllocator;
use super::store::{Stage, StageStore};

/// Relocate `image` from the ingest directory into `1_categorized` under the
/// next `<prefix>_<author>_<n><ext>` name.
///
/// The rename is the commit: once it succeeds the image is no longer pending
/// and the per-category counter has advanced. On failure the source is left
/// in place and stays pending.
pub fn categorize(
    store: &StageStore,
    allocator: &mut NameAllocator,
    config: &CuratorConfig,
    image: &Path,
    category_prefix: Option<&str>,
) -> Result<PathBuf> {
    let prefix = category_prefix.ok_or_else(|| PipelineError::CategoryMissing {
        image: image.display().to_string(),
    })?;

    let category = config.category(prefix).ok_or_else(|| {
        PipelineError::Config(format!("unknown category prefix '{}'", prefix))
    })?;

    let target_dir = store.output_dir(Stage::Categorize);
    let filename = allocator.allocate(
        &target_dir,
        &config.categorized_prefix(category),
        &dotted_extension(image),
    )?;

    store.commit_move(image, Stage::Categorize, &filename)
}

/// Delete a pending image outright. This is the only destructive operation
/// in the pipeline; every other stage leaves its input in place.
pub fn reject(store: &StageStore, image: &Path) -> Result<()> {
    store.reject(image)
}
