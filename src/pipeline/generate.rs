// src/pipeline/generate.rs

//! Content page generation pipeline.

use crate::error::{AppError, Result};
use crate::models::{Config, EntityKind};
use crate::services::{LinkTables, build_pages};
use crate::storage::SiteStorage;
use crate::utils::report;

/// Pages written per entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    pub pages: Vec<(EntityKind, usize)>,
}

impl GenerateSummary {
    pub fn total(&self) -> usize {
        self.pages.iter().map(|(_, count)| count).sum()
    }
}

/// Load the relationship and contributor tables.
pub async fn load_link_tables(config: &Config, storage: &dyn SiteStorage) -> Result<LinkTables> {
    let relationships = storage
        .load_relationships(&config.generate.relationships_file)
        .await?;
    let contributors = storage
        .load_contributors(&config.generate.contributors_key, config.sync.output_format)
        .await?;
    log::debug!(
        "Loaded {} relationship entries and {} contributor links",
        relationships.len(),
        contributors.len()
    );
    Ok(LinkTables {
        relationships,
        contributors,
    })
}

/// Generate the pages of one entity kind.
async fn generate_kind(
    config: &Config,
    storage: &dyn SiteStorage,
    kind: EntityKind,
    tables: &LinkTables,
) -> Result<usize> {
    let records = storage
        .load_records(kind.data_key(), config.sync.output_format)
        .await?
        .ok_or_else(|| {
            AppError::config(format!(
                "No {} data file in {}. Run sync first.",
                kind,
                config.paths.data_dir.display()
            ))
        })?;

    let dir = kind.output_dir(&config.generate);
    let pages = build_pages(kind, &records, tables);
    for page in &pages {
        let content = page.front_matter.render()?;
        let path = storage
            .write_page(dir, &page.slug, &config.generate.page_extension, &content)
            .await?;
        log::debug!("Wrote {}", path.display());
    }

    report::sub_item(&format!(
        "Generated {} {} pages in {}",
        pages.len(),
        kind,
        dir.display()
    ));
    Ok(pages.len())
}

/// Generate pages for the requested kinds, in order.
///
/// A missing data file for any kind aborts the pass.
pub async fn run_generate(
    config: &Config,
    storage: &dyn SiteStorage,
    kinds: &[EntityKind],
) -> Result<GenerateSummary> {
    report::header("Generating content pages");
    let tables = load_link_tables(config, storage).await?;

    let mut summary = GenerateSummary::default();
    for (i, &kind) in kinds.iter().enumerate() {
        report::step(i + 1, kinds.len(), &format!("Generating {kind}"));
        let count = generate_kind(config, storage, kind, &tables).await?;
        summary.pages.push((kind, count));
    }

    report::summary(
        "Generate",
        &summary
            .pages
            .iter()
            .map(|(kind, count)| (kind.data_key(), count.to_string()))
            .collect::<Vec<_>>(),
    );
    Ok(summary)
}
