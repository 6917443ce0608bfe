use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::utils::is_filename_safe;

/// Keyboard shortcuts in the selection surface map digits 0-9 to categories,
/// so the configuration caps out at ten.
pub const MAX_CATEGORIES: usize = 10;

/// One selectable category: a display label for the UI and a prefix that
/// becomes part of every categorized filename.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Category {
    pub label: String,
    pub prefix: String,
}

/// Curator configuration loaded once at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CuratorConfig {
    /// Author tag embedded in categorized filenames.
    pub author: String,
    /// Up to [`MAX_CATEGORIES`] categories, unique by prefix.
    pub categories: Vec<Category>,
}

impl CuratorConfig {
    /// Load and validate a configuration file. Any problem here is
    /// startup-fatal; there is no partial or default configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config: CuratorConfig = serde_json::from_str(&contents).map_err(|e| {
            PipelineError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_filename_safe(&self.author) {
            return Err(PipelineError::Config(format!(
                "author tag '{}' is not filesystem-safe (lowercase ascii, digits, '_', '-')",
                self.author
            )));
        }

        if self.categories.is_empty() {
            return Err(PipelineError::Config(
                "at least one category is required".into(),
            ));
        }

        if self.categories.len() > MAX_CATEGORIES {
            return Err(PipelineError::Config(format!(
                "at most {} categories are supported, got {}",
                MAX_CATEGORIES,
                self.categories.len()
            )));
        }

        for category in &self.categories {
            if category.label.trim().is_empty() {
                return Err(PipelineError::Config(format!(
                    "category with prefix '{}' has an empty label",
                    category.prefix
                )));
            }
            if !is_filename_safe(&category.prefix) {
                return Err(PipelineError::Config(format!(
                    "category prefix '{}' is not filesystem-safe (lowercase ascii, digits, '_', '-')",
                    category.prefix
                )));
            }
        }

        for (i, category) in self.categories.iter().enumerate() {
            if self.categories[..i].iter().any(|c| c.prefix == category.prefix) {
                return Err(PipelineError::Config(format!(
                    "duplicate category prefix '{}'",
                    category.prefix
                )));
            }
        }

        Ok(())
    }

    /// Look up a category by its prefix.
    pub fn category(&self, prefix: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.prefix == prefix)
    }

    /// The allocator prefix for a category: `<prefix>_<author>`, which the
    /// allocator extends to `<prefix>_<author>_<n><ext>`.
    pub fn categorized_prefix(&self, category: &Category) -> String {
        format!("{}_{}", category.prefix, self.author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> CuratorConfig {
        CuratorConfig {
            author: "jdoe".into(),
            categories: vec![
                Category {
                    label: "Stop".into(),
                    prefix: "stop".into(),
                },
                Category {
                    label: "Céder le passage".into(),
                    prefix: "ceder_le_passage".into(),
                },
            ],
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn load_parses_json_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(
            file,
            r#"{{"author":"jdoe","categories":[{{"label":"Stop","prefix":"stop"}}]}}"#
        )
        .expect("write config");

        let config = CuratorConfig::load(file.path()).expect("load config");
        assert_eq!(config.author, "jdoe");
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.category("stop").unwrap().label, "Stop");
        assert!(config.category("yield").is_none());
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = CuratorConfig::load(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn malformed_json_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(file, "{{not json").expect("write config");
        let err = CuratorConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn rejects_too_many_categories() {
        let mut config = sample();
        config.categories = (0..11)
            .map(|i| Category {
                label: format!("Category {}", i),
                prefix: format!("cat{}", i),
            })
            .collect();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_prefixes() {
        let mut config = sample();
        config.categories.push(Category {
            label: "Stop again".into(),
            prefix: "stop".into(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unsafe_prefix_and_author() {
        let mut config = sample();
        config.categories[0].prefix = "Stop Sign".into();
        assert!(config.validate().is_err());

        let mut config = sample();
        config.author = "J Doe".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn categorized_prefix_composes_author() {
        let config = sample();
        let stop = config.category("stop").unwrap().clone();
        assert_eq!(config.categorized_prefix(&stop), "stop_jdoe");
    }
}
