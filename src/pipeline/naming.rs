use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{PipelineError, Result};

/// Restart-safe, collision-free filename allocation.
///
/// Counters are keyed per (directory, prefix) and lazily derived from the
/// files already on disk the first time a key is seen; they are memoized for
/// the process lifetime only. A fresh process re-derives from disk, which is
/// what makes allocation consistent across restarts.
#[derive(Debug, Default)]
pub struct NameAllocator {
    counters: HashMap<(PathBuf, String), u32>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next unused `<prefix>_<n><extension>` in `directory`.
    ///
    /// The counter increments before each allocation and keeps incrementing
    /// until the candidate name does not exist, which also covers files that
    /// appeared between the initial scan and this call.
    pub fn allocate(&mut self, directory: &Path, prefix: &str, extension: &str) -> Result<String> {
        let key = (directory.to_path_buf(), prefix.to_string());
        let mut counter = match self.counters.get(&key) {
            Some(&n) => n,
            None => derive_next_counter(directory, prefix)?,
        };

        loop {
            counter += 1;
            let filename = format!("{}_{}{}", prefix, counter, extension);
            if !directory.join(&filename).exists() {
                self.counters.insert(key, counter);
                return Ok(filename);
            }
        }
    }
}

/// Scan `directory` for `<prefix>_<n>.*` and return the highest numeric
/// suffix found, or 0 when there is none. Non-numeric suffixes and unrelated
/// files are ignored rather than treated as errors.
pub fn derive_next_counter(directory: &Path, prefix: &str) -> Result<u32> {
    let pattern = Regex::new(&format!(r"^{}_(\d+)$", regex::escape(prefix)))
        .expect("escaped prefix always forms a valid pattern");

    let mut max = 0u32;
    let entries = fs::read_dir(directory).map_err(|e| PipelineError::io(directory, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(directory, e))?;
        let path = entry.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Some(caps) = pattern.captures(stem) {
            if let Ok(n) = caps[1].parse::<u32>() {
                max = max.max(n);
            }
        }
    }
    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").expect("touch file");
    }

    #[test]
    fn first_allocation_in_empty_dir_is_one() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut alloc = NameAllocator::new();

        let name = alloc.allocate(temp.path(), "stop", ".jpg").expect("allocate");
        assert_eq!(name, "stop_1.jpg");
    }

    #[test]
    fn counter_seeds_from_existing_files() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(temp.path(), "stop_1.jpg");
        touch(temp.path(), "stop_2.jpg");
        touch(temp.path(), "stop_7.png");

        let mut alloc = NameAllocator::new();
        let name = alloc.allocate(temp.path(), "stop", ".jpg").expect("allocate");
        assert_eq!(name, "stop_8.jpg");
    }

    #[test]
    fn malformed_suffixes_are_ignored() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(temp.path(), "stop_3.jpg");
        touch(temp.path(), "stop_abc.jpg");
        touch(temp.path(), "stop_.jpg");
        touch(temp.path(), "stopgap_9.jpg");

        assert_eq!(derive_next_counter(temp.path(), "stop").unwrap(), 3);
    }

    #[test]
    fn prefixes_do_not_share_a_namespace() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(temp.path(), "stop_5.jpg");

        let mut alloc = NameAllocator::new();
        assert_eq!(
            alloc.allocate(temp.path(), "yield", ".jpg").unwrap(),
            "yield_1.jpg"
        );
        assert_eq!(
            alloc.allocate(temp.path(), "stop", ".jpg").unwrap(),
            "stop_6.jpg"
        );
    }

    #[test]
    fn sequential_allocations_never_collide() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(temp.path(), "stop_2.jpg");

        let mut alloc = NameAllocator::new();
        let mut seen = std::collections::HashSet::new();
        seen.insert("stop_2.jpg".to_string());

        for _ in 0..20 {
            let name = alloc.allocate(temp.path(), "stop", ".jpg").expect("allocate");
            assert!(seen.insert(name.clone()), "collision on {}", name);
            touch(temp.path(), &name);
        }
    }

    #[test]
    fn allocator_skips_files_added_behind_its_back() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut alloc = NameAllocator::new();

        assert_eq!(
            alloc.allocate(temp.path(), "stop", ".jpg").unwrap(),
            "stop_1.jpg"
        );
        // Simulate an external writer grabbing the next two names before we
        // allocate again.
        touch(temp.path(), "stop_2.jpg");
        touch(temp.path(), "stop_3.jpg");

        assert_eq!(
            alloc.allocate(temp.path(), "stop", ".jpg").unwrap(),
            "stop_4.jpg"
        );
    }

    #[test]
    fn fresh_allocator_continues_after_restart() {
        let temp = tempfile::tempdir().expect("create temp dir");

        let mut first = NameAllocator::new();
        let name = first.allocate(temp.path(), "stop_jdoe", ".jpg").unwrap();
        assert_eq!(name, "stop_jdoe_1.jpg");
        touch(temp.path(), &name);
        drop(first);

        // A new allocator instance stands in for a process restart.
        let mut second = NameAllocator::new();
        let name = second.allocate(temp.path(), "stop_jdoe", ".jpg").unwrap();
        assert_eq!(name, "stop_jdoe_2.jpg");
    }

    #[test]
    fn regex_metacharacters_in_prefix_are_literal() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(temp.path(), "a.b_4.jpg");

        assert_eq!(derive_next_counter(temp.path(), "a.b").unwrap(), 4);
        // "axb" must not match the "a.b" files
        assert_eq!(derive_next_counter(temp.path(), "axb").unwrap(), 0);
    }
}
