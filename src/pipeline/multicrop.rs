use std::path::{Path, PathBuf};

use image::imageops;
use rand::Rng;

use crate::error::{PipelineError, Result};
use crate::utils::{dotted_extension, file_stem};

use super::naming::NameAllocator;
use super::store::{write_image_atomic, Stage, StageStore};

/// How many windows one call to [`generate_candidates`] proposes.
pub const DEFAULT_CANDIDATE_COUNT: usize = 9;

/// Bounds on a candidate's side length, as fractions of the limiting source
/// dimension.
pub const DEFAULT_MIN_FRACTION: f64 = 0.40;
pub const DEFAULT_MAX_FRACTION: f64 = 0.60;

/// A square crop window in source pixel coordinates, fully in bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// Knobs for candidate generation. The defaults are the pipeline policy;
/// they exist as fields mainly so tests can pin small fractions.
#[derive(Debug, Clone, Copy)]
pub struct CandidateOptions {
    pub count: usize,
    pub min_fraction: f64,
    pub max_fraction: f64,
}

impl Default for CandidateOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_CANDIDATE_COUNT,
            min_fraction: DEFAULT_MIN_FRACTION,
            max_fraction: DEFAULT_MAX_FRACTION,
        }
    }
}

/// One batch of proposed windows for a single source image. Regenerating
/// simply produces a fresh value; derivatives committed from an earlier set
/// are unaffected.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    pub source: PathBuf,
    pub windows: Vec<CropWindow>,
}

/// Sample `options.count` square windows over `image`. Each side length is
/// drawn uniformly from the configured fraction band of the limiting
/// dimension, then the position is drawn uniformly among the placements that
/// keep the window in bounds. Windows may overlap; no deduplication.
///
/// Only the image header is read here; the pixels are decoded at commit
/// time.
pub fn generate_candidates<R: Rng + ?Sized>(
    image_path: &Path,
    options: CandidateOptions,
    rng: &mut R,
) -> Result<CandidateSet> {
    let reader = image::ImageReader::open(image_path)
        .map_err(|e| PipelineError::io(image_path, e))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| PipelineError::decode(image_path, e))?;

    let windows = (0..options.count)
        .map(|_| sample_window(width, height, options, rng))
        .collect::<Result<Vec<_>>>()?;

    Ok(CandidateSet {
        source: image_path.to_path_buf(),
        windows,
    })
}

fn sample_window<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    options: CandidateOptions,
    rng: &mut R,
) -> Result<CropWindow> {
    if width == 0 || height == 0 {
        return Err(PipelineError::invalid_region(format!(
            "cannot sample windows over a {}x{} image",
            width, height
        )));
    }

    let limit = f64::from(width.min(height));
    let min_side = (limit * options.min_fraction).round().max(1.0);
    let max_side = (limit * options.max_fraction).round().max(min_side);

    let side = rng.random_range(min_side..=max_side).round() as u32;
    let side = side.clamp(1, width.min(height));

    let x = rng.random_range(0..=(width - side));
    let y = rng.random_range(0..=(height - side));

    Ok(CropWindow { x, y, size: side })
}

/// Crop the selected windows out of the original, undownscaled image and
/// write them into `3_multi_cropped`. Selecting nothing is legal and writes
/// nothing; an index outside the candidate set is an error before anything
/// is written.
pub fn commit(
    store: &StageStore,
    allocator: &mut NameAllocator,
    candidates: &CandidateSet,
    selected_indices: &[usize],
) -> Result<Vec<PathBuf>> {
    for &index in selected_indices {
        if index >= candidates.windows.len() {
            return Err(PipelineError::invalid_region(format!(
                "selected index {} out of range ({} candidates)",
                index,
                candidates.windows.len()
            )));
        }
    }

    if selected_indices.is_empty() {
        return Ok(Vec::new());
    }

    let decoded = image::open(&candidates.source)
        .map_err(|e| PipelineError::decode(&candidates.source, e))?
        .to_rgb8();

    let target_dir = store.output_dir(Stage::MultiCrop);
    let prefix = format!("{}_crop", file_stem(&candidates.source));
    let extension = dotted_extension(&candidates.source);

    let mut written = Vec::with_capacity(selected_indices.len());
    for &index in selected_indices {
        let window = candidates.windows[index];
        let cropped =
            imageops::crop_imm(&decoded, window.x, window.y, window.size, window.size).to_image();

        let filename = allocator.allocate(&target_dir, &prefix, &extension)?;
        written.push(write_image_atomic(&cropped, &target_dir, &filename)?);
    }

    Ok(written)
}
