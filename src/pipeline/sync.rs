// src/pipeline/sync.rs

//! Sheet synchronization pipeline.

use crate::error::Result;
use crate::models::{Config, SheetConfig, SyncSettings};
use crate::services::{
    Enricher, ImageMirror, ReferenceIndex, SheetRows, SheetSource, records_from_values,
};
use crate::storage::SiteStorage;
use crate::utils::report;

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Sheet keys written, with their record counts
    pub written: Vec<(String, usize)>,
    /// Sheet keys skipped because of errors or missing data
    pub skipped: Vec<String>,
}

/// Load the reference index for a sheet that resolves codes.
///
/// A missing or unreadable index disables resolution for the sheet.
async fn load_index(config: &Config, storage: &dyn SiteStorage) -> Option<ReferenceIndex> {
    let sync = &config.sync;
    match storage
        .load_records(&sync.reference_index, sync.output_format)
        .await
    {
        Ok(Some(records)) => {
            let index = ReferenceIndex::build(records, &sync.reference_key);
            log::debug!("Indexed {} {} records", index.len(), sync.reference_index);
            Some(index)
        }
        Ok(None) => {
            log::warn!(
                "No {} data to resolve references against; skipping resolution",
                sync.reference_index
            );
            None
        }
        Err(e) => {
            log::warn!(
                "Could not read {} data ({}); skipping resolution",
                sync.reference_index,
                e
            );
            None
        }
    }
}

/// Fetch, enrich and write a single sheet.
///
/// Returns the number of records written, or `None` when the sheet had no
/// usable data.
async fn sync_sheet(
    config: &Config,
    settings: &SyncSettings,
    sheet: &SheetConfig,
    source: &dyn SheetSource,
    storage: &dyn SiteStorage,
    mirror: Option<&ImageMirror>,
) -> Result<Option<usize>> {
    let values = source
        .fetch_values(&settings.spreadsheet_id, &sheet.sheet_name)
        .await?;

    let mut records = match records_from_values(values) {
        SheetRows::Rows(records) => records,
        SheetRows::Empty => {
            log::warn!("No data found in sheet '{}'", sheet.sheet_name);
            return Ok(None);
        }
        SheetRows::MissingHeaders => {
            log::warn!("No headers found in sheet '{}'", sheet.sheet_name);
            return Ok(None);
        }
    };

    let index = if config.sync.resolves_references(&sheet.key) {
        load_index(config, storage).await
    } else {
        None
    };

    let enricher = Enricher::new(sheet, &config.sync)
        .with_mirror(mirror)
        .with_index(index.as_ref());
    for record in &mut records {
        enricher.enrich(record).await;
    }

    let path = storage
        .write_records(&sheet.key, &records, config.sync.output_format)
        .await?;
    report::sub_item(&format!(
        "Saved {} records to {}",
        records.len(),
        path.display()
    ));
    Ok(Some(records.len()))
}

/// Sync every configured sheet in order.
///
/// Errors on one sheet skip that sheet; with `sync.strict` an authorization
/// error aborts the run.
pub async fn run_sync(
    config: &Config,
    settings: &SyncSettings,
    source: &dyn SheetSource,
    storage: &dyn SiteStorage,
    mirror: Option<&ImageMirror>,
) -> Result<SyncSummary> {
    report::header("Syncing Google Sheets");
    let total = settings.sheets.len();
    let mut summary = SyncSummary::default();

    for (i, sheet) in settings.sheets.iter().enumerate() {
        report::step(
            i + 1,
            total,
            &format!("{} -> {}", sheet.sheet_name, sheet.key),
        );

        match sync_sheet(config, settings, sheet, source, storage, mirror).await {
            Ok(Some(count)) => summary.written.push((sheet.key.clone(), count)),
            Ok(None) => summary.skipped.push(sheet.key.clone()),
            Err(e) if e.is_auth() && config.sync.strict => {
                log::error!("Authorization failed for '{}': {}", sheet.sheet_name, e);
                return Err(e);
            }
            Err(e) => {
                log::error!("Error processing sheet '{}': {}", sheet.sheet_name, e);
                summary.skipped.push(sheet.key.clone());
            }
        }
    }

    report::summary(
        "Sync",
        &[
            ("Sheets written", summary.written.len().to_string()),
            ("Sheets skipped", summary.skipped.len().to_string()),
        ],
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::error::AppError;
    use crate::models::{CredentialSource, Field, ImageMode, OutputFormat};
    use crate::storage::LocalStorage;

    /// Sheets served from memory; unknown names fail with the mapped status.
    struct MemorySheets {
        sheets: HashMap<String, Vec<Vec<String>>>,
        missing_status: u16,
    }

    impl MemorySheets {
        fn new(missing_status: u16) -> Self {
            Self {
                sheets: HashMap::new(),
                missing_status,
            }
        }

        fn with(mut self, name: &str, rows: &[&[&str]]) -> Self {
            let grid = rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect();
            self.sheets.insert(name.to_string(), grid);
            self
        }
    }

    #[async_trait]
    impl SheetSource for MemorySheets {
        async fn fetch_values(
            &self,
            _spreadsheet_id: &str,
            sheet_name: &str,
        ) -> Result<Vec<Vec<String>>> {
            self.sheets
                .get(sheet_name)
                .cloned()
                .ok_or_else(|| AppError::api(sheet_name, self.missing_status, "unavailable"))
        }
    }

    fn sheet(key: &str, name: &str) -> SheetConfig {
        SheetConfig {
            key: key.to_string(),
            sheet_name: name.to_string(),
            image_column: "image".to_string(),
            image_subdir: format!("remote_{key}"),
        }
    }

    fn settings(sheets: Vec<SheetConfig>) -> SyncSettings {
        SyncSettings {
            credentials: CredentialSource::Inline("{}".to_string()),
            application_name: "test".to_string(),
            spreadsheet_id: "sheet-id".to_string(),
            sheets,
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.sync.image_mode = ImageMode::Rewrite;
        config
    }

    #[tokio::test]
    async fn syncs_sheets_in_order_and_resolves_references() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), "_data/new_remote");
        let source = MemorySheets::new(404)
            .with(
                "Members",
                &[
                    &["Full Name", "Member Number", "Image"],
                    &["Ada Lovelace", "M1", "https://drive.google.com/file/d/XYZ123/view"],
                    &["Alan Turing", "M2"],
                ],
            )
            .with(
                "Collaborations",
                &[&["Title", "Collaborators"], &["Engine", "M2, M1, M9"]],
            )
            .with("Empty", &[]);
        let settings = settings(vec![
            sheet("members", "Members"),
            sheet("empty", "Empty"),
            sheet("missing", "Missing"),
            sheet("collaborations", "Collaborations"),
        ]);

        let summary = run_sync(&config(), &settings, &source, &storage, None)
            .await
            .unwrap();
        assert_eq!(
            summary.written,
            vec![("members".to_string(), 2), ("collaborations".to_string(), 1)]
        );
        assert_eq!(summary.skipped, vec!["empty", "missing"]);

        let members = storage
            .load_records("members", OutputFormat::Yaml)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(members[0].text("permalink"), Some("/members/ada-lovelace/"));
        assert!(members[0].text("image").unwrap().contains("XYZ123"));
        assert!(members[1].contains_key("image"));

        let collaborations = storage
            .load_records("collaborations", OutputFormat::Yaml)
            .await
            .unwrap()
            .unwrap();
        let Some(Field::Records(people)) = collaborations[0].get("collaborators") else {
            panic!("collaborators should be resolved");
        };
        let names: Vec<_> = people.iter().filter_map(|p| p.text("full name")).collect();
        assert_eq!(names, vec!["Alan Turing", "Ada Lovelace"]);
    }

    #[tokio::test]
    async fn auth_errors_are_fatal_when_strict() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), "_data/new_remote");
        let source = MemorySheets::new(403).with("Groups", &[&["name"], &["G1"]]);
        let settings = settings(vec![sheet("members", "Members"), sheet("groups", "Groups")]);

        let err = run_sync(&config(), &settings, &source, &storage, None)
            .await
            .unwrap_err();
        assert!(err.is_auth());

        let mut lenient = config();
        lenient.sync.strict = false;
        let summary = run_sync(&lenient, &settings, &source, &storage, None)
            .await
            .unwrap();
        assert_eq!(summary.written, vec![("groups".to_string(), 1)]);
        assert_eq!(summary.skipped, vec!["members"]);
    }

    #[tokio::test]
    async fn json_output_format() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), "data");
        let source = MemorySheets::new(404).with("Groups", &[&["name"], &["G1"]]);
        let mut config = config();
        config.sync.output_format = OutputFormat::Json;

        run_sync(&config, &settings(vec![sheet("groups", "Groups")]), &source, &storage, None)
            .await
            .unwrap();
        assert!(tmp.path().join("data/groups.json").exists());
        assert!(!tmp.path().join("data/groups.yml").exists());
    }
}
