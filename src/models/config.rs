//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data and image locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Sheet synchronization behavior
    #[serde(default)]
    pub sync: SyncConfig,

    /// Local image mirroring and optimization
    #[serde(default)]
    pub images: ImageConfig,

    /// Content file generation
    #[serde(default)]
    pub generate: GenerateConfig,

    /// Build output audit
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config file at {}. Using defaults.", path.display());
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Config load failed from {:?}: {}. Using defaults.", path, e);
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.sync.default_image_column.trim().is_empty() {
            return Err(AppError::validation("sync.default_image_column is empty"));
        }
        if self.images.max_width == 0 {
            return Err(AppError::validation("images.max_width must be > 0"));
        }
        if !(1..=100).contains(&self.images.jpeg_quality) {
            return Err(AppError::validation(
                "images.jpeg_quality must be between 1 and 100",
            ));
        }
        if self.images.png_compression > 9 {
            return Err(AppError::validation(
                "images.png_compression must be between 0 and 9",
            ));
        }
        if self.audit.targets.is_empty() {
            return Err(AppError::validation("No audit targets defined"));
        }
        if let Some(target) = self
            .audit
            .targets
            .iter()
            .find(|t| t.extension.trim().is_empty())
        {
            return Err(AppError::validation(format!(
                "Audit target '{}' has no extension",
                target.description
            )));
        }
        Ok(())
    }
}

/// Where synced data and mirrored images live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory receiving one data file per synced sheet
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,

    /// Root for mirrored images, one subdirectory per sheet
    #[serde(default = "defaults::image_dir")]
    pub image_dir: PathBuf,

    /// Root for optimized image copies
    #[serde(default = "defaults::optimized_image_dir")]
    pub optimized_image_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
            image_dir: defaults::image_dir(),
            optimized_image_dir: defaults::optimized_image_dir(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// How image cells are handled during sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// Download images and point the field at the local copy
    Mirror,
    /// Rewrite Drive share links to direct-content URLs
    Rewrite,
    /// Leave image cells untouched
    Off,
}

/// Serialization of the per-sheet data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yml",
            OutputFormat::Json => "json",
        }
    }

    /// The alternative format, for reading files written by either.
    pub fn other(self) -> Self {
        match self {
            OutputFormat::Yaml => OutputFormat::Json,
            OutputFormat::Json => OutputFormat::Yaml,
        }
    }
}

/// Sheet synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "defaults::image_mode")]
    pub image_mode: ImageMode,

    #[serde(default = "defaults::output_format")]
    pub output_format: OutputFormat,

    /// Treat authorization failures on any sheet as fatal for the run
    #[serde(default = "defaults::strict")]
    pub strict: bool,

    /// Image column used when a sheet does not name one
    #[serde(default = "defaults::image_column")]
    pub default_image_column: String,

    /// Field a permalink is synthesized from
    #[serde(default = "defaults::name_field")]
    pub name_field: String,

    /// Sheets whose rows reference members by code
    #[serde(default = "defaults::reference_sheets")]
    pub reference_sheets: Vec<String>,

    /// Comma-separated code list resolved against the index
    #[serde(default = "defaults::reference_field")]
    pub reference_field: String,

    /// Data file key of the indexed table
    #[serde(default = "defaults::reference_index")]
    pub reference_index: String,

    /// Field of the indexed table holding the lookup code
    #[serde(default = "defaults::reference_key")]
    pub reference_key: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            image_mode: defaults::image_mode(),
            output_format: defaults::output_format(),
            strict: defaults::strict(),
            default_image_column: defaults::image_column(),
            name_field: defaults::name_field(),
            reference_sheets: defaults::reference_sheets(),
            reference_field: defaults::reference_field(),
            reference_index: defaults::reference_index(),
            reference_key: defaults::reference_key(),
        }
    }
}

impl SyncConfig {
    /// Whether rows of this sheet carry codes to resolve.
    pub fn resolves_references(&self, sheet: &str) -> bool {
        self.reference_sheets
            .iter()
            .any(|s| s.eq_ignore_ascii_case(sheet))
    }
}

/// Image optimization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Produce a resized/compressed copy after download
    #[serde(default = "defaults::optimize")]
    pub optimize: bool,

    /// ImageMagick executable used for optimization
    #[serde(default = "defaults::convert_bin")]
    pub convert_bin: String,

    #[serde(default = "defaults::max_width")]
    pub max_width: u32,

    #[serde(default = "defaults::jpeg_quality")]
    pub jpeg_quality: u8,

    #[serde(default = "defaults::png_compression")]
    pub png_compression: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            optimize: defaults::optimize(),
            convert_bin: defaults::convert_bin(),
            max_width: defaults::max_width(),
            jpeg_quality: defaults::jpeg_quality(),
            png_compression: defaults::png_compression(),
        }
    }
}

/// Content file generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    #[serde(default = "defaults::members_dir")]
    pub members_dir: PathBuf,

    #[serde(default = "defaults::groups_dir")]
    pub groups_dir: PathBuf,

    #[serde(default = "defaults::projects_dir")]
    pub projects_dir: PathBuf,

    /// Group-centric membership mapping
    #[serde(default = "defaults::relationships_file")]
    pub relationships_file: PathBuf,

    /// Data file key of the member/project contribution pairs
    #[serde(default = "defaults::contributors_key")]
    pub contributors_key: String,

    /// Extension of generated content files
    #[serde(default = "defaults::page_extension")]
    pub page_extension: String,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            members_dir: defaults::members_dir(),
            groups_dir: defaults::groups_dir(),
            projects_dir: defaults::projects_dir(),
            relationships_file: defaults::relationships_file(),
            contributors_key: defaults::contributors_key(),
            page_extension: defaults::page_extension(),
        }
    }
}

/// Build output audit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Build output root; the audit aborts when it is missing
    #[serde(default = "defaults::audit_root")]
    pub root: PathBuf,

    #[serde(default = "defaults::audit_targets")]
    pub targets: Vec<AuditTarget>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            root: defaults::audit_root(),
            targets: defaults::audit_targets(),
        }
    }
}

/// One file type to audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTarget {
    /// File extension without the dot
    pub extension: String,

    /// Directory relative to the audit root
    #[serde(default)]
    pub dir: PathBuf,

    /// Human-readable label
    pub description: String,
}

mod defaults {
    use std::path::PathBuf;

    use super::{AuditTarget, ImageMode, OutputFormat};

    // Path defaults
    pub fn data_dir() -> PathBuf {
        PathBuf::from("_data/new_remote")
    }
    pub fn image_dir() -> PathBuf {
        PathBuf::from("assets/images")
    }
    pub fn optimized_image_dir() -> PathBuf {
        PathBuf::from("images/compressed")
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; sitesync/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Sync defaults
    pub fn image_mode() -> ImageMode {
        ImageMode::Mirror
    }
    pub fn output_format() -> OutputFormat {
        OutputFormat::Yaml
    }
    pub fn strict() -> bool {
        true
    }
    pub fn image_column() -> String {
        "image".into()
    }
    pub fn name_field() -> String {
        "full name".into()
    }
    pub fn reference_sheets() -> Vec<String> {
        vec!["collaborators".into(), "collaborations".into()]
    }
    pub fn reference_field() -> String {
        "collaborators".into()
    }
    pub fn reference_index() -> String {
        "members".into()
    }
    pub fn reference_key() -> String {
        "member number".into()
    }

    // Image defaults
    pub fn optimize() -> bool {
        true
    }
    pub fn convert_bin() -> String {
        "convert".into()
    }
    pub fn max_width() -> u32 {
        1200
    }
    pub fn jpeg_quality() -> u8 {
        80
    }
    pub fn png_compression() -> u8 {
        8
    }

    // Generation defaults
    pub fn members_dir() -> PathBuf {
        PathBuf::from("_members")
    }
    pub fn groups_dir() -> PathBuf {
        PathBuf::from("_groups")
    }
    pub fn projects_dir() -> PathBuf {
        PathBuf::from("_projects")
    }
    pub fn relationships_file() -> PathBuf {
        PathBuf::from("_data/relationships.yml")
    }
    pub fn contributors_key() -> String {
        "project_contributors".into()
    }
    pub fn page_extension() -> String {
        "md".into()
    }

    // Audit defaults
    pub fn audit_root() -> PathBuf {
        PathBuf::from("public")
    }
    pub fn audit_targets() -> Vec<AuditTarget> {
        vec![
            AuditTarget {
                extension: "html".into(),
                dir: PathBuf::new(),
                description: "HTML".into(),
            },
            AuditTarget {
                extension: "css".into(),
                dir: PathBuf::from("assets/css"),
                description: "CSS".into(),
            },
            AuditTarget {
                extension: "js".into(),
                dir: PathBuf::from("assets/js"),
                description: "JavaScript".into(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_quality() {
        let mut config = Config::default();
        config.images.jpeg_quality = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.images.png_compression = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [sync]
            image_mode = "rewrite"
            output_format = "json"

            [audit]
            root = "_site"
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.image_mode, ImageMode::Rewrite);
        assert_eq!(config.sync.output_format, OutputFormat::Json);
        assert_eq!(config.sync.default_image_column, "image");
        assert_eq!(config.audit.root, PathBuf::from("_site"));
        assert_eq!(config.audit.targets.len(), 3);
        assert_eq!(config.paths.data_dir, PathBuf::from("_data/new_remote"));
    }

    #[test]
    fn reference_sheets_match_case_insensitively() {
        let sync = SyncConfig::default();
        assert!(sync.resolves_references("Collaborators"));
        assert!(!sync.resolves_references("members"));
    }

    #[test]
    fn load_or_default_without_file() {
        let config = Config::load_or_default("/definitely/not/here.toml");
        assert_eq!(config.http.timeout_secs, 30);
    }
}
