use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{PipelineError, Result};
use crate::utils::is_accepted_image;

/// The ordered stage directories. A file's presence in directory N and
/// absence from N+1 means it is pending for the stage that targets N+1.
pub const STAGE_DIRS: [&str; 5] = [
    "0_to_process",
    "1_categorized",
    "2_cropped",
    "3_multi_cropped",
    "4_rotated",
];

/// One directory-to-directory transformation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Categorize,
    Crop,
    MultiCrop,
    Rotate,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Categorize,
        Stage::Crop,
        Stage::MultiCrop,
        Stage::Rotate,
    ];

    /// Directory this stage reads from.
    pub fn input_dir(&self) -> &'static str {
        match self {
            Stage::Categorize => STAGE_DIRS[0],
            Stage::Crop => STAGE_DIRS[1],
            Stage::MultiCrop => STAGE_DIRS[2],
            Stage::Rotate => STAGE_DIRS[3],
        }
    }

    /// Directory this stage writes into.
    pub fn output_dir(&self) -> &'static str {
        match self {
            Stage::Categorize => STAGE_DIRS[1],
            Stage::Crop => STAGE_DIRS[2],
            Stage::MultiCrop => STAGE_DIRS[3],
            Stage::Rotate => STAGE_DIRS[4],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Categorize => "categorize",
            Stage::Crop => "crop",
            Stage::MultiCrop => "multicrop",
            Stage::Rotate => "rotate",
        }
    }
}

/// Filesystem-backed stage state. The directory tree is the only durable
/// state: there is no status field anywhere, a file's stage is the directory
/// that holds it.
#[derive(Debug, Clone)]
pub struct StageStore {
    root: PathBuf,
}

impl StageStore {
    /// Open the store under `root`, creating every stage directory that does
    /// not exist yet. Safe to call repeatedly.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in STAGE_DIRS {
            let path = root.join(dir);
            fs::create_dir_all(&path).map_err(|e| PipelineError::io(&path, e))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn input_dir(&self, stage: Stage) -> PathBuf {
        self.root.join(stage.input_dir())
    }

    pub fn output_dir(&self, stage: Stage) -> PathBuf {
        self.root.join(stage.output_dir())
    }

    /// The pending set for a stage, sorted for a stable processing order.
    ///
    /// For categorize the input directory shrinks as items are consumed, so
    /// the listing is exactly the pending set. The crop and rotate stages
    /// leave their sources untouched and therefore see the full input
    /// listing every run; their output numbering continues from disk instead
    /// of colliding.
    pub fn list_pending(&self, stage: Stage) -> Result<Vec<PathBuf>> {
        self.scan_dir(&self.input_dir(stage))
    }

    /// All committed outputs of a stage, sorted.
    pub fn list_outputs(&self, stage: Stage) -> Result<Vec<PathBuf>> {
        self.scan_dir(&self.output_dir(stage))
    }

    fn scan_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).max_depth(1).follow_links(false) {
            let entry = entry.map_err(|e| {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("walkdir loop"));
                PipelineError::io(dir, source)
            })?;
            let path = entry.path();
            if path.is_file() && is_accepted_image(path) {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Relocate a committed file into a stage's output directory under its
    /// allocated name. Same-filesystem rename, so a concurrent reader sees
    /// the file either fully at the source or fully at the destination.
    pub fn commit_move(&self, source: &Path, stage: Stage, filename: &str) -> Result<PathBuf> {
        let dest = self.output_dir(stage).join(filename);
        fs::rename(source, &dest).map_err(|e| PipelineError::io(source, e))?;
        Ok(dest)
    }

    /// Delete a source image outright. The categorization stage's reject is
    /// the only caller; no other stage destroys its input.
    pub fn reject(&self, image: &Path) -> Result<()> {
        fs::remove_file(image).map_err(|e| PipelineError::io(image, e))
    }
}

/// Save an image into `dir` under `filename` without ever exposing a
/// partially written file: the encode goes to a dot-prefixed temporary name
/// in the same directory, followed by a rename.
pub fn write_image_atomic(
    image: &image::RgbImage,
    dir: &Path,
    filename: &str,
) -> Result<PathBuf> {
    let final_path = dir.join(filename);
    let tmp_path = dir.join(format!(".{}.tmp", filename));

    let format = image::ImageFormat::from_path(&final_path)
        .map_err(|e| PipelineError::decode(&final_path, e))?;

    image.save_with_format(&tmp_path, format).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        match e {
            image::ImageError::IoError(io) => PipelineError::io(&tmp_path, io),
            other => PipelineError::decode(&tmp_path, other),
        }
    })?;

    fs::rename(&tmp_path, &final_path).map_err(|e| PipelineError::io(&tmp_path, e))?;
    Ok(final_path)
}
