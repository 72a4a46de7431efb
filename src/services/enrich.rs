// src/services/enrich.rs

//! Per-record enrichment applied between fetching a sheet and writing it.
//!
//! Steps run in a fixed order: image handling, permalink synthesis, then
//! reference resolution.

use std::collections::HashMap;

use crate::models::{ImageMode, Record, SheetConfig, SyncConfig};
use crate::services::images::ImageMirror;
use crate::utils::slug::permalink_for_name;
use crate::utils::url::{direct_image_url, mask_url};

/// Records of a previously synced table, keyed by an identifying code.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    entries: HashMap<String, Record>,
}

impl ReferenceIndex {
    /// Index `records` by the trimmed value of `key`.
    ///
    /// Records without the key are not indexed; on duplicate codes the first
    /// record wins.
    pub fn build(records: Vec<Record>, key: &str) -> Self {
        let mut entries = HashMap::new();
        for record in records {
            if let Some(code) = record.non_empty(key).map(str::to_string) {
                entries.entry(code).or_insert(record);
            }
        }
        Self { entries }
    }

    pub fn get(&self, code: &str) -> Option<&Record> {
        self.entries.get(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rewrite a Drive share link in `field` to a direct-content URL.
///
/// Returns whether the field changed.
pub fn rewrite_share_link(record: &mut Record, field: &str) -> bool {
    let Some(direct) = record.text(field).and_then(direct_image_url) else {
        return false;
    };
    record.set(field, direct);
    true
}

/// Derive a permalink from the name field when the record has none.
///
/// Returns whether a permalink was added.
pub fn synthesize_permalink(record: &mut Record, name_field: &str, entity: &str) -> bool {
    if record.non_empty("permalink").is_some() {
        return false;
    }
    let Some(permalink) = record
        .non_empty(name_field)
        .and_then(|name| permalink_for_name(entity, name))
    else {
        return false;
    };
    record.set("permalink", permalink);
    true
}

/// Replace a comma-separated code list in `field` with the records it names.
///
/// Unknown codes are dropped. Returns the number of resolved records; a
/// field that is absent or not text is left alone and yields zero.
pub fn resolve_references(record: &mut Record, field: &str, index: &ReferenceIndex) -> usize {
    let Some(codes) = record.text(field) else {
        return 0;
    };

    let mut resolved = Vec::new();
    for code in codes.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        match index.get(code) {
            Some(found) => resolved.push(found.clone()),
            None => log::debug!("Unresolved reference '{}' in {}", code, field),
        }
    }

    let count = resolved.len();
    record.set_records(field, resolved);
    count
}

/// Applies the enrichment steps configured for one sheet.
pub struct Enricher<'a> {
    sheet: &'a SheetConfig,
    sync: &'a SyncConfig,
    mirror: Option<&'a ImageMirror>,
    index: Option<&'a ReferenceIndex>,
}

impl<'a> Enricher<'a> {
    pub fn new(sheet: &'a SheetConfig, sync: &'a SyncConfig) -> Self {
        Self {
            sheet,
            sync,
            mirror: None,
            index: None,
        }
    }

    pub fn with_mirror(mut self, mirror: Option<&'a ImageMirror>) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn with_index(mut self, index: Option<&'a ReferenceIndex>) -> Self {
        self.index = index;
        self
    }

    pub async fn enrich(&self, record: &mut Record) {
        self.process_image(record).await;
        synthesize_permalink(record, &self.sync.name_field, &self.sheet.key);
        if let Some(index) = self.index {
            resolve_references(record, &self.sync.reference_field, index);
        }
    }

    async fn process_image(&self, record: &mut Record) {
        let column = self.sheet.image_column.as_str();
        match self.sync.image_mode {
            ImageMode::Off => {}
            ImageMode::Rewrite => {
                rewrite_share_link(record, column);
            }
            ImageMode::Mirror => {
                let Some(mirror) = self.mirror else {
                    return;
                };
                let Some(raw_url) = record.non_empty(column).map(str::to_string) else {
                    return;
                };
                if !raw_url.starts_with("http://") && !raw_url.starts_with("https://") {
                    return;
                }

                let outcome = mirror.mirror(record, self.sheet, &raw_url).await;
                match outcome {
                    Ok(path) => record.set(column, path),
                    Err(e) => {
                        log::warn!(
                            "Failed to process image {}: {}",
                            mask_url(&raw_url),
                            e
                        );
                        record.clear(column);
                    }
                }
            }
        }
    }
}
