use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Extensions the pipeline accepts, lowercase without the dot.
pub const ACCEPTED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

/// Create a styled progress bar
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.blue} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg} ({eta})",
        )
        .unwrap()
        .progress_chars("#>-"),
    );
    pb
}

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Get file extension in lowercase
pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a file carries one of the pipeline's accepted extensions
pub fn is_accepted_image(path: &Path) -> bool {
    match get_file_extension(path) {
        Some(ext) => ACCEPTED_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/// File stem as an owned string, or "image" when the path has none
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string()
}

/// Extension with its leading dot, preserving the original casing on disk
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}

/// Check whether a string is safe to embed in a filename: lowercase ASCII
/// alphanumerics, underscores and dashes only.
pub fn is_filename_safe(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// Print verbose information if verbose mode is enabled
pub fn verbose_println(verbose: bool, message: &str) {
    if verbose {
        println!("{} {}", style("[VERBOSE]").dim(), message);
    }
}

/// Print warning message
pub fn warn_println(message: &str) {
    println!("{} {}", style("[WARNING]").yellow().bold(), message);
}

/// Print error message
pub fn error_println(message: &str) {
    eprintln!("{} {}", style("[ERROR]").red().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(1)), "1.000s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }

    #[test]
    fn test_is_accepted_image() {
        assert!(is_accepted_image(Path::new("a.jpg")));
        assert!(is_accepted_image(Path::new("a.JPEG")));
        assert!(is_accepted_image(Path::new("dir/b.Png")));
        assert!(is_accepted_image(Path::new("c.gif")));
        assert!(is_accepted_image(Path::new("c.bmp")));

        assert!(!is_accepted_image(Path::new("a.heic")));
        assert!(!is_accepted_image(Path::new("a.txt")));
        assert!(!is_accepted_image(Path::new("noext")));
        assert!(!is_accepted_image(Path::new(".hidden.tmp")));
    }

    #[test]
    fn test_stem_and_extension() {
        let p = PathBuf::from("images/1_categorized/stop_jdoe_3.JPG");
        assert_eq!(file_stem(&p), "stop_jdoe_3");
        assert_eq!(dotted_extension(&p), ".JPG");
        assert_eq!(get_file_extension(&p).as_deref(), Some("jpg"));
    }

    #[test]
    fn test_is_filename_safe() {
        assert!(is_filename_safe("stop"));
        assert!(is_filename_safe("ceder_le_passage"));
        assert!(is_filename_safe("sign-2"));

        assert!(!is_filename_safe(""));
        assert!(!is_filename_safe("Stop"));
        assert!(!is_filename_safe("with space"));
        assert!(!is_filename_safe("slash/y"));
    }
}
