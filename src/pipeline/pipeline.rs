// src/pipeline/pipeline.rs

use crate::error::Result;
use crate::models::{Config, EntityKind, SyncSettings};
use crate::services::{ImageMirror, SheetSource};
use crate::storage::SiteStorage;
use crate::utils::report;

use super::audit::run_audit;
use super::generate::run_generate;
use super::sync::run_sync;

/// Run sync, generate and audit in sequence.
///
/// The site is rendered outside this tool, so the audit step is skipped
/// with a warning when no build output exists yet.
pub async fn run_pipeline(
    config: &Config,
    settings: &SyncSettings,
    source: &dyn SheetSource,
    storage: &dyn SiteStorage,
    mirror: Option<&ImageMirror>,
) -> Result<()> {
    report::header("Starting content pipeline");
    let total_steps = 3;

    report::step(1, total_steps, "Sync - Fetching sheets");
    run_sync(config, settings, source, storage, mirror).await?;

    report::step(2, total_steps, "Generate - Writing content pages");
    run_generate(config, storage, &EntityKind::ALL).await?;

    report::step(3, total_steps, "Audit - Checking build output");
    if config.audit.root.is_dir() {
        run_audit(config)?;
    } else {
        log::warn!(
            "Skipping audit: {} not found (build the site first)",
            config.audit.root.display()
        );
    }

    log::info!("Pipeline complete");
    Ok(())
}
