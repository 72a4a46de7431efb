// src/services/audit.rs

//! Minification heuristics for build output.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::models::AuditTarget;

fn whitespace_run() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s{2,}").ok()).as_ref()
}

fn has_whitespace_run(content: &str) -> bool {
    whitespace_run().is_some_and(|re| re.is_match(content))
}

/// Whether `content` looks minified for a file of the given extension.
///
/// Empty HTML counts as a blank line. Unknown extensions are reported as
/// minified.
pub fn is_minified(extension: &str, content: &str) -> bool {
    match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => {
            !content.trim().is_empty() && !content.lines().any(|line| line.trim().is_empty())
        }
        "css" => !content.contains("/*") && !has_whitespace_run(content),
        "js" => !content.contains("//") && !has_whitespace_run(content),
        _ => true,
    }
}

/// Audit outcome of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    /// Path relative to the output root
    pub path: PathBuf,
    pub size: u64,
    pub minified: bool,
}

/// Audit outcome of one target extension.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionReport {
    pub extension: String,
    pub description: String,
    /// Directory scanned
    pub dir: PathBuf,
    /// Whether the target directory exists
    pub present: bool,
    pub files: Vec<FileReport>,
    /// Matching files that could not be read, relative to the output root
    pub unreadable: Vec<PathBuf>,
}

impl SectionReport {
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    pub fn unminified(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.minified)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditReport {
    pub sections: Vec<SectionReport>,
}

impl AuditReport {
    pub fn file_count(&self) -> usize {
        self.sections.iter().map(|s| s.files.len()).sum()
    }

    pub fn unminified_count(&self) -> usize {
        self.sections.iter().map(|s| s.unminified().count()).sum()
    }

    pub fn unreadable_count(&self) -> usize {
        self.sections.iter().map(|s| s.unreadable.len()).sum()
    }
}

/// Files under `dir` with the given extension, sorted by path.
fn matching_files(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Scan one target under `root`.
pub fn audit_target(root: &Path, target: &AuditTarget) -> SectionReport {
    let dir = root.join(&target.dir);
    let mut section = SectionReport {
        extension: target.extension.clone(),
        description: target.description.clone(),
        present: dir.is_dir(),
        dir,
        files: Vec::new(),
        unreadable: Vec::new(),
    };
    if !section.present {
        return section;
    }

    for path in matching_files(&section.dir, &target.extension) {
        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Cannot read {}: {}", path.display(), e);
                section.unreadable.push(relative);
                continue;
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        section.files.push(FileReport {
            path: relative,
            size: bytes.len() as u64,
            minified: is_minified(&target.extension, &content),
        });
    }
    section
}

/// Scan every target under `root`.
///
/// Unreadable files are recorded and skipped; the scan itself never fails.
pub fn audit_tree(root: &Path, targets: &[AuditTarget]) -> AuditReport {
    let sections = targets
        .iter()
        .map(|target| audit_target(root, target))
        .collect();
    AuditReport { sections }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::models::AuditConfig;

    #[test]
    fn css_heuristic() {
        assert!(is_minified("css", "a{color:red}"));
        assert!(!is_minified("css", "a { color: red; }\n\n  /* note */"));
        assert!(!is_minified("css", "a{color:red}/*x*/"));
    }

    #[test]
    fn js_heuristic() {
        assert!(is_minified("js", "let a=1;let b=2;"));
        assert!(!is_minified("js", "let a = 1; // one"));
        assert!(!is_minified("js", "let a=1;\n  let b=2;"));
    }

    #[test]
    fn html_heuristic_flags_blank_lines() {
        assert!(is_minified("html", "<html><body>hi</body></html>\n"));
        assert!(is_minified("html", "<p>a</p>\n<p>b</p>"));
        assert!(!is_minified("html", "<p>a</p>\n\n<p>b</p>"));
        assert!(!is_minified("html", "<p>a</p>\n   \n<p>b</p>"));
    }

    #[test]
    fn empty_html_is_not_minified() {
        assert!(!is_minified("html", ""));
        assert!(!is_minified("html", "  \n"));
    }

    #[test]
    fn unknown_extension_passes() {
        assert!(is_minified("txt", "a  b\n\n"));
    }

    #[test]
    fn audit_tree_reports_per_target() {
        let root = tempfile::tempdir().unwrap();
        let css = root.path().join("assets/css");
        fs::create_dir_all(&css).unwrap();
        let loose = "a { color: red; }\n\n  /* note */";
        let tight = "a{color:red}";
        fs::write(css.join("b.css"), loose).unwrap();
        fs::write(css.join("a.css"), tight).unwrap();
        fs::write(root.path().join("index.html"), "<p>x</p>").unwrap();

        let report = audit_tree(root.path(), &AuditConfig::default().targets);
        assert_eq!(report.sections.len(), 3);

        let html = &report.sections[0];
        assert_eq!(html.files.len(), 1);
        assert!(html.files[0].minified);

        let css = &report.sections[1];
        let names: Vec<_> = css.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            names,
            vec![PathBuf::from("assets/css/a.css"), PathBuf::from("assets/css/b.css")]
        );
        assert_eq!(css.unminified().count(), 1);
        assert_eq!(css.total_size(), (loose.len() + tight.len()) as u64);

        let js = &report.sections[2];
        assert!(!js.present);
        assert!(js.files.is_empty());
        assert_eq!(report.unminified_count(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn unreadable_files_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("index.html"), "<p>x</p>").unwrap();
        std::os::unix::fs::symlink("/proc/self/mem", root.path().join("broken.html")).unwrap();

        let report = audit_tree(root.path(), &AuditConfig::default().targets);
        let html = &report.sections[0];
        assert_eq!(html.files.len(), 1);
        assert_eq!(html.files[0].path, PathBuf::from("index.html"));
        assert_eq!(html.unreadable, vec![PathBuf::from("broken.html")]);
        assert_eq!(report.unreadable_count(), 1);
    }
}
