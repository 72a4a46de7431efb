//! Local filesystem storage implementation.
//!
//! Data files live under `{root}/{data_dir}`; pages and the relationship
//! table are addressed relative to `{root}`. Every write goes to a temporary
//! file first and is renamed into place.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{ContributorLink, OutputFormat, Record, Relationships};
use crate::storage::SiteStorage;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    data_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Get the full path for a root-relative path.
    fn path(&self, relative: &Path) -> PathBuf {
        self.root_dir.join(relative)
    }

    /// Path of the data file for a sheet key.
    pub fn data_path(&self, key: &str, format: OutputFormat) -> PathBuf {
        self.root_dir
            .join(&self.data_dir)
            .join(format!("{key}.{}", format.extension()))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Decode a data file; blank or `null` content yields the default.
    fn decode<T: DeserializeOwned + Default>(bytes: &[u8], format: OutputFormat) -> Result<T> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        let value: Option<T> = match format {
            OutputFormat::Yaml => serde_yaml::from_slice(bytes)?,
            OutputFormat::Json => serde_json::from_slice(bytes)?,
        };
        Ok(value.unwrap_or_default())
    }

    /// Load a table from its data file in either format.
    async fn load_table<T: DeserializeOwned + Default>(
        &self,
        key: &str,
        preferred: OutputFormat,
    ) -> Result<Option<T>> {
        for format in [preferred, preferred.other()] {
            let path = self.data_path(key, format);
            if let Some(bytes) = self.read_bytes(&path).await? {
                log::debug!("Loading {}", path.display());
                return Self::decode(&bytes, format).map(Some);
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl SiteStorage for LocalStorage {
    async fn write_records(
        &self,
        key: &str,
        records: &[Record],
        format: OutputFormat,
    ) -> Result<PathBuf> {
        let bytes = match format {
            OutputFormat::Yaml => serde_yaml::to_string(records)?.into_bytes(),
            OutputFormat::Json => serde_json::to_vec_pretty(records)?,
        };
        let path = self.data_path(key, format);
        self.write_bytes(&path, &bytes).await?;
        Ok(path)
    }

    async fn load_records(
        &self,
        key: &str,
        preferred: OutputFormat,
    ) -> Result<Option<Vec<Record>>> {
        self.load_table(key, preferred).await
    }

    async fn load_contributors(
        &self,
        key: &str,
        preferred: OutputFormat,
    ) -> Result<Vec<ContributorLink>> {
        Ok(self.load_table(key, preferred).await?.unwrap_or_default())
    }

    async fn load_relationships(&self, path: &Path) -> Result<Relationships> {
        let full = self.path(path);
        match self.read_bytes(&full).await? {
            Some(bytes) => Self::decode(&bytes, OutputFormat::Yaml),
            None => {
                log::warn!("Relationship file {} not found", full.display());
                Ok(Relationships::default())
            }
        }
    }

    async fn write_page(
        &self,
        dir: &Path,
        slug: &str,
        extension: &str,
        content: &str,
    ) -> Result<PathBuf> {
        let path = self.path(dir).join(format!("{slug}.{extension}"));
        self.write_bytes(&path, content.as_bytes()).await?;
        Ok(path)
    }
}
