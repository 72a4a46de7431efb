//! Environment-driven sync settings.
//!
//! Everything the sync stage needs from the process environment is read
//! once here and passed along explicitly.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Highest `SHEET<n>_*` index considered.
pub const MAX_SHEETS: usize = 10;

const DEFAULT_APPLICATION_NAME: &str = "GoogleSheetsSync";

/// Where the service account key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Key JSON passed inline (`SERVICE_ACCOUNT_JSON`)
    Inline(String),
    /// Path to a key file (`CREDENTIALS_PATH`)
    File(PathBuf),
}

/// One configured sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConfig {
    /// Output data file key, e.g. `members`
    pub key: String,
    /// Tab name in the spreadsheet
    pub sheet_name: String,
    /// Column holding the image URL (lower-cased)
    pub image_column: String,
    /// Subdirectory for mirrored images
    pub image_subdir: String,
}

/// Settings for talking to the spreadsheet.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub credentials: CredentialSource,
    pub application_name: String,
    pub spreadsheet_id: String,
    pub sheets: Vec<SheetConfig>,
}

impl SyncSettings {
    /// Read settings from the process environment.
    pub fn from_env(default_image_column: &str) -> Result<Self> {
        let cwd = env::current_dir()?;
        Self::from_lookup(|key| env::var(key).ok(), &cwd, default_image_column)
    }

    /// Build settings from an arbitrary variable lookup.
    ///
    /// A relative `CREDENTIALS_PATH` is resolved against `base_dir`.
    pub fn from_lookup<F>(lookup: F, base_dir: &Path, default_image_column: &str) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let credentials = if let Some(json) = value("SERVICE_ACCOUNT_JSON") {
            CredentialSource::Inline(json)
        } else if let Some(path) = value("CREDENTIALS_PATH") {
            CredentialSource::File(base_dir.join(path))
        } else {
            return Err(AppError::config(
                "No Google Sheets credentials found. Set CREDENTIALS_PATH (local) or SERVICE_ACCOUNT_JSON (CI).",
            ));
        };

        let spreadsheet_id = value("SPREADSHEET_ID")
            .ok_or_else(|| AppError::config("SPREADSHEET_ID is not set"))?;

        let application_name =
            value("APPLICATION_NAME").unwrap_or_else(|| DEFAULT_APPLICATION_NAME.to_string());

        let sheets = Self::read_sheets(&value, default_image_column);
        if sheets.is_empty() {
            return Err(AppError::config(
                "No valid sheets configured. Set SHEET1_FILENAME and SHEET1_NAME (and so on).",
            ));
        }

        Ok(Self {
            credentials,
            application_name,
            spreadsheet_id,
            sheets,
        })
    }

    /// Collect `SHEET<n>_*` entries, stopping at the first gap.
    fn read_sheets<F>(value: &F, default_image_column: &str) -> Vec<SheetConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut sheets = Vec::new();

        for i in 1..=MAX_SHEETS {
            let key = value(&format!("SHEET{i}_FILENAME"));
            let sheet_name = value(&format!("SHEET{i}_NAME"));

            let (key, sheet_name) = match (key, sheet_name) {
                (Some(key), Some(name)) => (key.trim().to_string(), name),
                (None, None) => break,
                _ => {
                    log::warn!(
                        "SHEET{i}_FILENAME and SHEET{i}_NAME must both be set; ignoring sheets from {i} on"
                    );
                    break;
                }
            };

            let image_column = value(&format!("SHEET{i}_IMAGE_COLUMN"))
                .unwrap_or_else(|| default_image_column.to_string())
                .to_lowercase();
            let image_subdir = value(&format!("SHEET{i}_IMAGE_SUBDIR"))
                .unwrap_or_else(|| format!("remote_{key}"));

            sheets.push(SheetConfig {
                key,
                sheet_name,
                image_column,
                image_subdir,
            });
        }

        sheets
    }
}

/// Load a `.env` file from the working directory when present.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => log::info!("Loaded env vars from {}", path.display()),
        Err(e) if e.not_found() => log::debug!("No .env file found"),
        Err(e) => log::warn!("Failed to load .env: {}", e),
    }
}
