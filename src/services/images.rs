// src/services/images.rs

//! Local image mirroring.
//!
//! Downloads the image a record points at into a per-sheet directory and
//! optionally writes a resized/compressed copy next to it.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ImageConfig, PathsConfig, Record, SheetConfig};
use crate::utils::http::fetch_bytes;
use crate::utils::slug::sanitize_filename;
use crate::utils::url::{drive_file_id, mask_url, path_extension, path_stem};

const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const DEFAULT_EXTENSION: &str = ".jpg";

/// Downloads record images and rewrites them to site-relative paths.
pub struct ImageMirror {
    client: Client,
    access_token: Option<String>,
    paths: PathsConfig,
    images: ImageConfig,
    drive_api: String,
}

impl ImageMirror {
    pub fn new(
        client: Client,
        access_token: Option<String>,
        paths: PathsConfig,
        images: ImageConfig,
    ) -> Self {
        Self {
            client,
            access_token,
            paths,
            images,
            drive_api: DRIVE_FILES_API.to_string(),
        }
    }

    /// Point Drive downloads at a different `files` endpoint.
    pub fn with_drive_api(mut self, drive_api: impl Into<String>) -> Self {
        self.drive_api = drive_api.into();
        self
    }

    /// Download the image at `raw_url` for `record` and return the path the
    /// site should reference.
    pub async fn mirror(&self, record: &Record, sheet: &SheetConfig, raw_url: &str) -> Result<String> {
        let url = Url::parse(raw_url)?;
        let file_name = local_file_name(record, &sheet.key, &url);

        let local_dir = self.paths.image_dir.join(&sheet.image_subdir);
        tokio::fs::create_dir_all(&local_dir).await?;
        let local_path = local_dir.join(&file_name);

        let bytes = self.download(raw_url).await?;
        tokio::fs::write(&local_path, &bytes).await?;
        log::info!("Image saved to {}", local_path.display());

        if self.images.optimize {
            let optimized_path = self
                .paths
                .optimized_image_dir
                .join(&sheet.image_subdir)
                .join(optimized_name(&file_name));

            match self.optimize(&local_path, &optimized_path).await {
                Ok(()) if optimized_path.exists() => {
                    return Ok(site_path(&optimized_path));
                }
                Ok(()) => {}
                Err(e) => log::warn!("{}", e),
            }
        }

        Ok(site_path(&local_path))
    }

    /// Fetch image bytes, preferring the Drive API for share links.
    async fn download(&self, raw_url: &str) -> Result<Vec<u8>> {
        log::info!("Downloading image from {}", mask_url(raw_url));

        if let (Some(file_id), Some(token)) = (drive_file_id(raw_url), &self.access_token) {
            log::debug!("Detected Google Drive link");
            let api_url = format!(
                "{}/{file_id}?alt=media",
                self.drive_api.trim_end_matches('/')
            );
            match fetch_bytes(&self.client, &api_url, Some(token.as_str())).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => log::warn!(
                    "Drive download failed ({}), falling back to direct download",
                    e
                ),
            }
        }

        fetch_bytes(&self.client, raw_url, None).await
    }

    /// Resize/compress `input` into `output` with ImageMagick.
    async fn optimize(&self, input: &Path, output: &Path) -> Result<()> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let context = input.display().to_string();
        let status = tokio::process::Command::new(&self.images.convert_bin)
            .args(convert_args(input, output, &self.images))
            .status()
            .await
            .map_err(|e| AppError::image(&context, format!("cannot run {}: {e}", self.images.convert_bin)))?;

        if !status.success() {
            return Err(AppError::image(context, format!("optimizer exited with {status}")));
        }

        let original = tokio::fs::metadata(input).await?.len();
        let optimized = tokio::fs::metadata(output).await?.len();
        if optimized < original {
            let saved = original - optimized;
            log::info!(
                "Image optimized: {} - reduced by {:.2}% ({:.2} KB)",
                input.display(),
                saved as f64 / original as f64 * 100.0,
                saved as f64 / 1024.0
            );
        } else {
            log::info!("Image already optimized: {}", input.display());
        }
        Ok(())
    }
}

/// File name for a mirrored image.
///
/// The base name is the sanitized first usable candidate among the record's
/// permalink, its name-like fields, the URL basename, and a timestamp.
pub fn local_file_name(record: &Record, sheet_key: &str, url: &Url) -> String {
    let name_fields: &[&str] = if sheet_key == "projects" {
        &["name", "project_id", "title"]
    } else {
        &["name", "title"]
    };

    let from_record = std::iter::once("permalink")
        .chain(name_fields.iter().copied())
        .filter_map(|field| record.non_empty(field))
        .map(sanitize_filename)
        .find(|name| !name.is_empty());

    let base = from_record
        .or_else(|| {
            path_stem(url)
                .map(|stem| sanitize_filename(&stem))
                .filter(|name| !name.is_empty())
        })
        .unwrap_or_else(|| {
            let now = Utc::now();
            format!("image_{}_{}", now.timestamp(), now.timestamp_subsec_millis())
        });

    let extension = path_extension(url).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    format!("{base}{extension}")
}

/// `name.ext` → `name_optimized.ext`.
pub fn optimized_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_optimized.{ext}"),
        None => format!("{file_name}_optimized"),
    }
}

/// ImageMagick arguments for an optimized copy.
///
/// Images wider than the limit are scaled down; JPEGs get a quality setting
/// and PNGs a compression level.
pub fn convert_args(input: &Path, output: &Path, config: &ImageConfig) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        input.into(),
        "-resize".into(),
        format!("{}x>", config.max_width).into(),
    ];

    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => {
            args.push("-quality".into());
            args.push(config.jpeg_quality.to_string().into());
        }
        "png" => {
            args.push("-quality".into());
            args.push("100".into());
            args.push("-define".into());
            args.push(format!("png:compression-level={}", config.png_compression).into());
        }
        _ => {}
    }

    args.push(output.into());
    args
}

/// Root-relative site path for a file under the site root.
fn site_path(path: &Path) -> String {
    let relative: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    format!("/{}", relative.to_string_lossy().trim_start_matches('/'))
}
