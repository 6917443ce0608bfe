use std::path::{Path, PathBuf};

use image::imageops;

use crate::error::{PipelineError, Result};
use crate::utils::{dotted_extension, file_stem};

use super::naming::NameAllocator;
use super::store::{write_image_atomic, Stage, StageStore};

/// A user-confirmed crop rectangle in source pixel coordinates. Signed
/// fields so that a selection dragged past the image edge survives the trip
/// through the presentation layer and can be clamped here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl CropRect {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clamp to the bounds of a `width`x`height` image. Returns the usable
    /// `(x, y, w, h)` region, or an `InvalidRegion` error when nothing
    /// usable remains (zero width or height after clamping).
    pub fn clamped(&self, image_width: u32, image_height: u32) -> Result<(u32, u32, u32, u32)> {
        let iw = i64::from(image_width);
        let ih = i64::from(image_height);

        let x0 = self.x.clamp(0, iw);
        let y0 = self.y.clamp(0, ih);
        let x1 = (self.x + self.width).clamp(0, iw);
        let y1 = (self.y + self.height).clamp(0, ih);

        let w = x1 - x0;
        let h = y1 - y0;
        if w <= 0 || h <= 0 {
            return Err(PipelineError::invalid_region(format!(
                "{}x{} region at ({}, {}) is empty after clamping to {}x{}",
                self.width, self.height, self.x, self.y, image_width, image_height
            )));
        }

        Ok((x0 as u32, y0 as u32, w as u32, h as u32))
    }
}

/// Write one confirmed crop of `image` into `2_cropped`.
///
/// The rectangle is re-clamped to the source bounds; a selection that is out
/// of range but still overlaps the image is salvaged rather than refused.
/// The source image is left untouched so that further crops can be taken
/// from it.
pub fn crop(
    store: &StageStore,
    allocator: &mut NameAllocator,
    image_path: &Path,
    rect: CropRect,
) -> Result<PathBuf> {
    let decoded = image::open(image_path)
        .map_err(|e| PipelineError::decode(image_path, e))?
        .to_rgb8();

    let (x, y, w, h) = rect.clamped(decoded.width(), decoded.height())?;
    let cropped = imageops::crop_imm(&decoded, x, y, w, h).to_image();

    let target_dir = store.output_dir(Stage::Crop);
    let prefix = format!("{}_crop", file_stem(image_path));
    let filename = allocator.allocate(&target_dir, &prefix, &dotted_extension(image_path))?;

    write_image_atomic(&cropped, &target_dir, &filename)
}
