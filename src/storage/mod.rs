//! Storage abstractions for synced data and generated pages.
//!
//! ## Directory Structure
//!
//! ```text
//! {root}/
//! ├── _data/
//! │   ├── relationships.yml     # Group → members/projects (hand-maintained)
//! │   └── new_remote/           # Synced sheets, one file per sheet key
//! │       ├── members.yml
//! │       └── project_contributors.yml
//! ├── _members/<slug>.md        # Generated pages
//! ├── _groups/<slug>.md
//! └── _projects/<slug>.md
//! ```

pub mod local;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ContributorLink, OutputFormat, Record, Relationships};

pub use local::LocalStorage;

/// Trait for site content storage backends.
#[async_trait]
pub trait SiteStorage: Send + Sync {
    /// Overwrite the data file for a sheet key. Returns the written path.
    async fn write_records(
        &self,
        key: &str,
        records: &[Record],
        format: OutputFormat,
    ) -> Result<PathBuf>;

    /// Load a synced table, trying `preferred` first and then the other
    /// format. `None` when neither file exists.
    async fn load_records(&self, key: &str, preferred: OutputFormat)
    -> Result<Option<Vec<Record>>>;

    /// Load the contributor table; a missing or empty file is an empty table.
    async fn load_contributors(
        &self,
        key: &str,
        preferred: OutputFormat,
    ) -> Result<Vec<ContributorLink>>;

    /// Load the relationship table; a missing or empty file is an empty table.
    async fn load_relationships(&self, path: &Path) -> Result<Relationships>;

    /// Overwrite `<dir>/<slug>.<extension>`. Returns the written path.
    async fn write_page(
        &self,
        dir: &Path,
        slug: &str,
        extension: &str,
        content: &str,
    ) -> Result<PathBuf>;
}
