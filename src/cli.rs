use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::crop::CropRect;

#[derive(Parser, Debug)]
#[command(
    name = "dataset-curator",
    about = "Stage-based image dataset curation pipeline",
    long_about = "
Dataset Curator - Image Pipeline (Rust Implementation)

Curates a training dataset through a sequence of directory-backed stages:
ingestion, categorization, single crop, multi-crop sampling and rotation
augmentation. Every stage is restart-safe: output numbering is derived from
the files already on disk, so an interrupted session can always be resumed
by simply re-running the command.

Stage directories (created on demand under the root):
  0_to_process -> 1_categorized -> 2_cropped -> 3_multi_cropped -> 4_rotated

Example Usage:
  # Show pending work per stage
  dataset-curator -c config.json status

  # Convert .heic containers in the ingest directory to .jpg
  dataset-curator -c config.json ingest

  # File an image under the 'stop' category (moves it out of 0_to_process)
  dataset-curator -c config.json categorize --image IMG_0042.jpg --category stop

  # Discard an ingested image
  dataset-curator -c config.json categorize --image IMG_0043.jpg --reject

  # Cut a confirmed 128x128 region at (32, 16)
  dataset-curator -c config.json crop --image stop_jdoe_1.jpg --region 32,16,128x128

  # Sample 9 candidate windows, inspect them, then commit two
  dataset-curator -c config.json multicrop --image stop_jdoe_1_crop_1.jpg --seed 7
  dataset-curator -c config.json multicrop --image stop_jdoe_1_crop_1.jpg --seed 7 --select 2,5

  # Rotate everything pending into the four angle buckets
  dataset-curator -c config.json rotate"
)]
pub struct Args {
    /// Configuration file (author tag + category list)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: PathBuf,

    /// Root directory holding the stage directories
    #[arg(short = 'r', long = "root", default_value = "images", value_name = "DIR")]
    pub root: PathBuf,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show per-stage pending counts
    Status,

    /// Normalize .heic containers in the ingest directory into .jpg
    Ingest,

    /// File one pending image under a category, or reject it
    Categorize {
        /// Image filename inside 0_to_process
        #[arg(long = "image", value_name = "FILE")]
        image: String,

        /// Category prefix from the configuration
        #[arg(long = "category", value_name = "PREFIX", conflicts_with = "reject")]
        category: Option<String>,

        /// Delete the image instead of filing it
        #[arg(long = "reject")]
        reject: bool,
    },

    /// Cut one confirmed rectangular region from a categorized image
    Crop {
        /// Image filename inside 1_categorized
        #[arg(long = "image", value_name = "FILE")]
        image: String,

        /// Region as X,Y,WxH (e.g. 32,16,128x128)
        #[arg(long = "region", value_name = "X,Y,WxH", value_parser = parse_region)]
        region: CropRect,
    },

    /// Sample candidate crop windows and commit a selection
    Multicrop {
        /// Image filename inside 2_cropped
        #[arg(long = "image", value_name = "FILE")]
        image: String,

        /// Number of candidate windows to sample
        #[arg(long = "count", default_value = "9", value_name = "N")]
        count: usize,

        /// Seed for the window sampler; omit for a fresh draw
        #[arg(long = "seed", value_name = "N")]
        seed: Option<u64>,

        /// Candidate indices to commit (e.g. 2,5); omit to only print the
        /// candidate geometry
        #[arg(long = "select", value_name = "I,J,...", value_delimiter = ',')]
        select: Option<Vec<usize>>,
    },

    /// Produce the four rotated derivatives for one image or all pending
    Rotate {
        /// Image filename inside 3_multi_cropped; omit to rotate everything
        #[arg(long = "image", value_name = "FILE")]
        image: Option<String>,

        /// Seed for the angle draw; omit for a fresh draw
        #[arg(long = "seed", value_name = "N")]
        seed: Option<u64>,
    },
}

/// Parse "X,Y,WxH" into a crop rectangle.
fn parse_region(s: &str) -> Result<CropRect, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("expected X,Y,WxH, got '{}'", s));
    }

    let x: i64 = parts[0]
        .trim()
        .parse()
        .map_err(|_| format!("invalid x coordinate '{}'", parts[0]))?;
    let y: i64 = parts[1]
        .trim()
        .parse()
        .map_err(|_| format!("invalid y coordinate '{}'", parts[1]))?;

    let (w, h) = parts[2]
        .trim()
        .split_once('x')
        .ok_or_else(|| format!("expected WxH, got '{}'", parts[2]))?;
    let width: i64 = w
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{}'", w))?;
    let height: i64 = h
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{}'", h))?;

    Ok(CropRect::new(x, y, width, height))
}
