//! Pre-processing collaborator: normalize proprietary photo containers in
//! the ingest directory into plain JPEG before the pipeline scans it.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{PipelineError, Result};
use crate::pipeline::{Stage, StageStore};
use crate::utils::get_file_extension;

/// Container extensions the pipeline itself refuses to scan but ingest will
/// try to convert.
const CONTAINER_EXTENSIONS: [&str; 1] = ["heic"];

#[derive(Debug, Default)]
pub struct NormalizeSummary {
    pub converted: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, PipelineError)>,
}

/// Convert every `.heic` container in `0_to_process` into a sibling `.jpg`,
/// removing the container on success. A container the installed codecs
/// cannot decode is reported and left in place; it simply stays invisible to
/// the pipeline scanner.
pub fn normalize_ingest(store: &StageStore) -> Result<NormalizeSummary> {
    let ingest_dir = store.input_dir(Stage::Categorize);
    let mut summary = NormalizeSummary::default();

    let mut containers = Vec::new();
    for entry in WalkDir::new(&ingest_dir).max_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| {
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("walkdir loop"));
            PipelineError::io(&ingest_dir, source)
        })?;
        let path = entry.path();
        let is_container = get_file_extension(path)
            .map(|ext| CONTAINER_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);
        if path.is_file() && is_container {
            containers.push(path.to_path_buf());
        }
    }
    containers.sort();

    for container in containers {
        match convert_container(&container) {
            Ok(jpeg) => {
                fs::remove_file(&container).map_err(|e| PipelineError::io(&container, e))?;
                summary.converted.push(jpeg);
            }
            Err(e) if e.is_skippable() => summary.skipped.push((container, e)),
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

fn convert_container(container: &Path) -> Result<PathBuf> {
    let target = container.with_extension("jpg");
    if target.exists() {
        return Err(PipelineError::io(
            &target,
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "refusing to overwrite an existing image",
            ),
        ));
    }

    let decoded = image::open(container)
        .map_err(|e| PipelineError::decode(container, e))?
        .to_rgb8();

    let tmp = container.with_extension("jpg.tmp");

    decoded
        .save_with_format(&tmp, image::ImageFormat::Jpeg)
        .map_err(|e| {
            let _ = fs::remove_file(&tmp);
            match e {
                image::ImageError::IoError(io) => PipelineError::io(&tmp, io),
                other => PipelineError::decode(&tmp, other),
            }
        })?;
    fs::rename(&tmp, &target).map_err(|e| PipelineError::io(&tmp, e))?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undecodable_container_is_skipped_in_place() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = StageStore::open(temp.path()).expect("open store");

        let container = store.input_dir(Stage::Categorize).join("photo.heic");
        fs::write(&container, b"not actually heif").unwrap();

        let summary = normalize_ingest(&store).expect("normalize");
        assert!(summary.converted.is_empty());
        assert_eq!(summary.skipped.len(), 1);
        assert!(container.exists(), "skipped containers stay in place");

        // Still invisible to the pipeline scanner.
        assert!(store.list_pending(Stage::Categorize).unwrap().is_empty());
    }

    #[test]
    fn regular_images_are_left_alone() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = StageStore::open(temp.path()).expect("open store");

        let jpg = store.input_dir(Stage::Categorize).join("a.jpg");
        fs::write(&jpg, b"x").unwrap();

        let summary = normalize_ingest(&store).expect("normalize");
        assert!(summary.converted.is_empty());
        assert!(summary.skipped.is_empty());
        assert!(jpg.exists());
    }
}
