use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::time::Instant;

mod cli;
mod config_file;
mod error;
mod ingest;
mod pipeline;
mod utils;

use cli::{Args, Command};
use config_file::CuratorConfig;
use error::PipelineError;
use pipeline::{
    categorize, crop, multicrop, BatchProgress, CandidateOptions, NameAllocator, Stage, StageStore,
};
use utils::{create_progress_bar, error_println, format_duration, verbose_println, warn_println};

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        error_println(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    // Configuration problems are startup-fatal; nothing below runs without
    // a valid author tag and category list.
    let config = CuratorConfig::load(&args.config_file)
        .with_context(|| format!("loading {}", args.config_file.display()))?;

    let store = StageStore::open(&args.root)
        .with_context(|| format!("opening stage directories under {}", args.root.display()))?;
    verbose_println(
        args.verbose,
        &format!("stage directories ready under {}", args.root.display()),
    );

    let mut allocator = NameAllocator::new();

    match &args.command {
        Command::Status => cmd_status(&store),
        Command::Ingest => cmd_ingest(&store, args.verbose),
        Command::Categorize {
            image,
            category,
            reject,
        } => cmd_categorize(
            &store,
            &mut allocator,
            &config,
            image,
            category.as_deref(),
            *reject,
        ),
        Command::Crop { image, region } => cmd_crop(&store, &mut allocator, image, *region),
        Command::Multicrop {
            image,
            count,
            seed,
            select,
        } => cmd_multicrop(&store, &mut allocator, image, *count, *seed, select.as_deref()),
        Command::Rotate { image, seed } => cmd_rotate(&store, image.as_deref(), *seed, args.verbose),
    }
}

/// Resolve a bare filename against a stage's input directory.
fn resolve_pending(store: &StageStore, stage: Stage, name: &str) -> Result<PathBuf> {
    let path = store.input_dir(stage).join(name);
    if !path.is_file() {
        anyhow::bail!(
            "'{}' is not pending for {} (looked in {})",
            name,
            stage.name(),
            store.input_dir(stage).display()
        );
    }
    Ok(path)
}

fn cmd_status(store: &StageStore) -> Result<()> {
    println!("{}", style("Pipeline status").bold().cyan());
    for stage in Stage::ALL {
        let pending = store.list_pending(stage)?;
        let outputs = store.list_outputs(stage)?;
        println!(
            "  {:<12} {} pending, {} committed",
            stage.name(),
            style(pending.len()).bold(),
            outputs.len()
        );
    }
    Ok(())
}

fn cmd_ingest(store: &StageStore, verbose: bool) -> Result<()> {
    let summary = ingest::normalize_ingest(store)?;

    for path in &summary.converted {
        verbose_println(verbose, &format!("converted {}", path.display()));
    }
    for (path, err) in &summary.skipped {
        warn_println(&format!("skipped {}: {}", path.display(), err));
    }

    println!(
        "{} {} container(s) converted, {} skipped",
        style("Ingest:").bold().green(),
        summary.converted.len(),
        summary.skipped.len()
    );
    Ok(())
}

fn cmd_categorize(
    store: &StageStore,
    allocator: &mut NameAllocator,
    config: &CuratorConfig,
    image: &str,
    category: Option<&str>,
    reject: bool,
) -> Result<()> {
    let path = resolve_pending(store, Stage::Categorize, image)?;

    if reject {
        categorize::reject(store, &path)?;
        println!("{} deleted {}", style("Rejected:").bold().red(), image);
        return Ok(());
    }

    match categorize::categorize(store, allocator, config, &path, category) {
        Ok(dest) => {
            println!(
                "{} {} -> {}",
                style("Categorized:").bold().green(),
                image,
                dest.file_name().unwrap_or_default().to_string_lossy()
            );
            Ok(())
        }
        Err(e @ PipelineError::CategoryMissing { .. }) => {
            // Recoverable: the image stays pending, the caller re-prompts.
            warn_println(&format!("{}", e));
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_crop(
    store: &StageStore,
    allocator: &mut NameAllocator,
    image: &str,
    region: crop::CropRect,
) -> Result<()> {
    let path = resolve_pending(store, Stage::Crop, image)?;

    match crop::crop(store, allocator, &path, region) {
        Ok(dest) => {
            println!(
                "{} {}",
                style("Cropped:").bold().green(),
                dest.file_name().unwrap_or_default().to_string_lossy()
            );
            Ok(())
        }
        Err(e @ PipelineError::InvalidRegion { .. }) => {
            warn_println(&format!("{}", e));
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_multicrop(
    store: &StageStore,
    allocator: &mut NameAllocator,
    image: &str,
    count: usize,
    seed: Option<u64>,
    select: Option<&[usize]>,
) -> Result<()> {
    let path = resolve_pending(store, Stage::MultiCrop, image)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let options = CandidateOptions {
        count,
        ..CandidateOptions::default()
    };
    let candidates = multicrop::generate_candidates(&path, options, &mut rng)?;

    println!(
        "{} {} window(s) over {}",
        style("Candidates:").bold().cyan(),
        candidates.windows.len(),
        image
    );
    for (index, window) in candidates.windows.iter().enumerate() {
        println!(
            "  [{}] {}x{} at ({}, {})",
            index, window.size, window.size, window.x, window.y
        );
    }

    let Some(selected) = select else {
        println!(
            "{}",
            style("No --select given; nothing committed.").dim()
        );
        return Ok(());
    };

    let written = multicrop::commit(store, allocator, &candidates, selected)?;
    println!(
        "{} {} crop(s) committed",
        style("Committed:").bold().green(),
        written.len()
    );
    Ok(())
}

fn cmd_rotate(
    store: &StageStore,
    image: Option<&str>,
    seed: Option<u64>,
    verbose: bool,
) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let pending = match image {
        Some(name) => vec![resolve_pending(store, Stage::Rotate, name)?],
        None => store.list_pending(Stage::Rotate)?,
    };

    if pending.is_empty() {
        println!("{}", style("Nothing to rotate.").dim());
        return Ok(());
    }

    let started = Instant::now();
    let progress = BatchProgress::new(pending.len());
    let pb = create_progress_bar(pending.len() as u64);

    let mut completed = 0usize;
    let mut failures = Vec::new();
    for path in &pending {
        match pipeline::rotate_all(store, path, &mut rng) {
            Ok(written) => {
                completed += 1;
                verbose_println(
                    verbose,
                    &format!("{} -> {} derivatives", path.display(), written.len()),
                );
            }
            Err(e) if e.is_skippable() => failures.push((path.clone(), e)),
            Err(e) => {
                pb.finish_and_clear();
                return Err(e.into());
            }
        }
        progress.increment();
        pb.set_position(progress.completed() as u64);
    }
    pb.finish_and_clear();

    for (path, err) in &failures {
        warn_println(&format!("skipped {}: {}", path.display(), err));
    }
    println!(
        "{} {} image(s) rotated, {} skipped in {}",
        style("Rotate:").bold().green(),
        completed,
        failures.len(),
        format_duration(started.elapsed())
    );
    Ok(())
}
