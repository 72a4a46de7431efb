// src/pipeline/audit.rs

//! Build output minification audit.

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::services::{AuditReport, audit_tree};
use crate::utils::report;

/// Audit the built site under `audit.root`.
///
/// Fails before scanning when the output root does not exist. Unminified
/// and unreadable files are reported, not treated as errors.
pub fn run_audit(config: &Config) -> Result<AuditReport> {
    let root = &config.audit.root;
    if !root.is_dir() {
        return Err(AppError::config(format!(
            "Output directory {} does not exist. Build the site first.",
            root.display()
        )));
    }

    report::header("Checking minification");
    let audit = audit_tree(root, &config.audit.targets);

    for section in &audit.sections {
        log::info!("Checking {} files", section.description);
        if !section.present {
            log::info!(
                "No {} directory at {}",
                section.description,
                section.dir.display()
            );
            continue;
        }
        for path in &section.unreadable {
            report::sub_item(&format!("{} - Unreadable", path.display()));
        }
        if section.files.is_empty() {
            log::info!("No .{} files found", section.extension);
            continue;
        }

        for file in &section.files {
            report::sub_item(&format!(
                "{} ({}) - {}",
                file.path.display(),
                report::kilobytes(file.size),
                if file.minified { "Minified" } else { "Not minified" }
            ));
        }
        log::info!(
            "Total {} size: {}",
            section.extension,
            report::kilobytes(section.total_size())
        );
    }

    report::summary(
        "Minification",
        &[
            ("Files checked", audit.file_count().to_string()),
            ("Not minified", audit.unminified_count().to_string()),
            ("Unreadable", audit.unreadable_count().to_string()),
        ],
    );
    Ok(audit)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_root_fails_before_scanning() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.audit.root = tmp.path().join("public");

        let err = run_audit(&config).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn reports_unminified_files() {
        let tmp = TempDir::new().unwrap();
        let js = tmp.path().join("assets/js");
        fs::create_dir_all(&js).unwrap();
        fs::write(js.join("app.js"), "// entry\nrun();").unwrap();
        fs::write(tmp.path().join("index.html"), "<p>a</p>\n\n<p>b</p>").unwrap();

        let mut config = Config::default();
        config.audit.root = tmp.path().to_path_buf();

        let audit = run_audit(&config).unwrap();
        assert_eq!(audit.file_count(), 2);
        assert_eq!(audit.unminified_count(), 2);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn unreadable_file_does_not_abort_audit() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.html"), "<p>a</p>\n\n<p>b</p>").unwrap();
        std::os::unix::fs::symlink("/proc/self/mem", tmp.path().join("broken.html")).unwrap();

        let mut config = Config::default();
        config.audit.root = tmp.path().to_path_buf();

        let audit = run_audit(&config).unwrap();
        assert_eq!(audit.file_count(), 1);
        assert_eq!(audit.unminified_count(), 1);
        assert_eq!(audit.unreadable_count(), 1);
    }

    #[test]
    fn empty_html_is_reported_unminified() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("empty.html"), "").unwrap();

        let mut config = Config::default();
        config.audit.root = tmp.path().to_path_buf();

        let audit = run_audit(&config).unwrap();
        assert_eq!(audit.file_count(), 1);
        assert_eq!(audit.unminified_count(), 1);
    }
}
