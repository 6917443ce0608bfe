use std::path::{Path, PathBuf};

use image::{imageops, Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use rand::Rng;

use crate::error::{PipelineError, Result};
use crate::utils::{dotted_extension, file_stem};

use super::progress::BatchProgress;
use super::store::{write_image_atomic, Stage, StageStore};

/// The four disjoint angle buckets, in degrees. Bucket index in filenames is
/// position + 1.
pub const ROTATION_BUCKETS: [(f32, f32); 4] =
    [(-35.0, -20.0), (-20.0, -5.0), (5.0, 20.0), (20.0, 35.0)];

/// What one whole-directory rotation run did. `failures` holds the items
/// that were skipped; re-invoking the stage retries them safely because
/// rotation outputs overwrite in place.
#[derive(Debug, Default)]
pub struct RotateSummary {
    pub completed: usize,
    pub failures: Vec<(PathBuf, PipelineError)>,
}

/// Produce the four rotated derivatives of one image, one per bucket, under
/// the fixed names `<base>_rot_<1..4><ext>`.
///
/// Unlike the crop stages this overwrites on re-run instead of appending;
/// the fixed grammar makes the whole stage idempotent and resumable.
pub fn rotate_all<R: Rng + ?Sized>(
    store: &StageStore,
    image_path: &Path,
    rng: &mut R,
) -> Result<Vec<PathBuf>> {
    let decoded = image::open(image_path)
        .map_err(|e| PipelineError::decode(image_path, e))?
        .to_rgb8();

    let target_dir = store.output_dir(Stage::Rotate);
    let base = file_stem(image_path);
    let extension = dotted_extension(image_path);

    let mut written = Vec::with_capacity(ROTATION_BUCKETS.len());
    for (index, &(low, high)) in ROTATION_BUCKETS.iter().enumerate() {
        let angle = rng.random_range(low..high);
        let rotated = rotate_expanded(&decoded, angle);

        let filename = format!("{}_rot_{}{}", base, index + 1, extension);
        written.push(write_image_atomic(&rotated, &target_dir, &filename)?);
    }

    Ok(written)
}

/// Rotate every pending image. Per-item failures are recorded and skipped so
/// the batch stays exhaustive; previously written outputs are never touched
/// by a failing item. The shared counter is incremented once per finished
/// image for poll-based progress display.
pub fn rotate_stage<R: Rng + ?Sized>(
    store: &StageStore,
    rng: &mut R,
    progress: &BatchProgress,
) -> Result<RotateSummary> {
    let pending = store.list_pending(Stage::Rotate)?;
    let mut summary = RotateSummary::default();

    for image_path in pending {
        match rotate_all(store, &image_path, rng) {
            Ok(_) => summary.completed += 1,
            Err(e) if e.is_skippable() => summary.failures.push((image_path, e)),
            Err(e) => return Err(e),
        }
        progress.increment();
    }

    Ok(summary)
}

/// Rotate around the center onto a canvas expanded to the bounding box of
/// the rotated content, so no corner is ever clipped. Bilinear resampling;
/// these outputs feed training downstream.
fn rotate_expanded(image: &RgbImage, angle_degrees: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let (canvas_w, canvas_h) = rotated_bounds(width, height, angle_degrees);

    let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, Rgb([0, 0, 0]));
    imageops::overlay(
        &mut canvas,
        image,
        i64::from((canvas_w - width) / 2),
        i64::from((canvas_h - height) / 2),
    );

    rotate_about_center(
        &canvas,
        angle_degrees.to_radians(),
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
    )
}

/// Bounding box of a `width`x`height` rectangle rotated by `angle_degrees`,
/// floored at the source dimensions so the canvas only ever grows.
fn rotated_bounds(width: u32, height: u32, angle_degrees: f32) -> (u32, u32) {
    let rad = angle_degrees.to_radians();
    let (sin, cos) = (rad.sin().abs(), rad.cos().abs());

    let w = width as f32;
    let h = height as f32;

    let bound_w = (w * cos + h * sin).ceil() as u32;
    let bound_h = (w * sin + h * cos).ceil() as u32;

    (bound_w.max(width), bound_h.max(height))
}
