// src/services/pages.rs

//! Content pages for members, groups and projects.
//!
//! Each entity record becomes one page whose YAML front matter carries the
//! descriptive fields plus back-references computed from the relationship
//! and contributor tables.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::Result;
use crate::models::{
    ContributorLink, EntityKind, Record, Relationships, contributors_of_project,
    projects_of_member,
};
use crate::utils::slug::{sanitize_slug, slug_from_permalink};

const LEADING_FIELDS: [&str; 3] = ["name", "bio", "details"];
const TRAILING_FIELDS: [&str; 5] = ["image", "twitter", "website", "linkedin", "permalink"];

/// Front matter of a generated page, serialized in field order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontMatter {
    pub layout: String,
    #[serde(flatten)]
    pub fields: IndexMap<String, Option<String>>,
    #[serde(flatten)]
    pub references: IndexMap<String, Vec<String>>,
}

impl FrontMatter {
    /// `---` fenced YAML block.
    pub fn render(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(self)?;
        Ok(format!("---\n{yaml}---\n"))
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_deref())
    }

    pub fn references(&self, key: &str) -> &[String] {
        self.references.get(key).map(Vec::as_slice).unwrap_or_default()
    }
}

/// A page ready to be written as `<slug>.<ext>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub kind: EntityKind,
    pub slug: String,
    pub front_matter: FrontMatter,
}

/// Tables the back-references are computed from.
#[derive(Debug, Clone, Default)]
pub struct LinkTables {
    pub relationships: Relationships,
    pub contributors: Vec<ContributorLink>,
}

/// Slug and permalink of a record.
///
/// The slug comes from the permalink's last segment, falling back to the
/// sanitized name; the permalink defaults to `/<type>/<slug>`.
pub fn identify(kind: EntityKind, record: &Record) -> Option<(String, String)> {
    if let Some(permalink) = record.non_empty("permalink") {
        if let Some(slug) = slug_from_permalink(permalink) {
            return Some((slug.to_string(), permalink.to_string()));
        }
    }

    let name = record.non_empty("name")?;
    let slug = sanitize_slug(name);
    if slug.is_empty() {
        return None;
    }
    log::info!("No permalink for {} '{}', using slug '{}'", kind, name, slug);
    let permalink = kind.path_for(&slug);
    Some((slug, permalink))
}

/// Back-reference lists for one entity, in front matter order.
fn references(
    kind: EntityKind,
    slug: &str,
    permalink: &str,
    tables: &LinkTables,
) -> IndexMap<String, Vec<String>> {
    let rel = &tables.relationships;
    let links = &tables.contributors;

    let lists = match kind {
        EntityKind::Member => [
            ("groups", rel.groups_with_member(slug)),
            ("projects", projects_of_member(links, permalink)),
        ],
        EntityKind::Group => [
            ("members", rel.members_of(slug)),
            ("projects", rel.projects_of(slug)),
        ],
        EntityKind::Project => [
            ("contributors", contributors_of_project(links, permalink)),
            ("groups", rel.groups_with_project(slug)),
        ],
    };

    lists
        .into_iter()
        .map(|(key, values)| (key.to_string(), values))
        .collect()
}

/// Front matter for a record with a known slug and permalink.
pub fn front_matter(
    kind: EntityKind,
    record: &Record,
    slug: &str,
    permalink: &str,
    tables: &LinkTables,
) -> FrontMatter {
    let text = |key: &str| record.text(key).map(str::to_string);

    let mut fields = IndexMap::new();
    for key in LEADING_FIELDS {
        fields.insert(key.to_string(), text(key));
    }
    if kind == EntityKind::Group {
        fields.insert("short_description".to_string(), text("bio"));
        fields.insert("long_description".to_string(), text("details"));
    }
    for key in TRAILING_FIELDS {
        fields.insert(key.to_string(), text(key));
    }
    fields.insert("permalink".to_string(), Some(permalink.to_string()));

    FrontMatter {
        layout: kind.layout().to_string(),
        fields,
        references: references(kind, slug, permalink, tables),
    }
}

/// Build pages for every identifiable record of a table.
///
/// Records without permalink or name are skipped. When two records share a
/// slug the first one is kept and the later one reported.
pub fn build_pages(kind: EntityKind, records: &[Record], tables: &LinkTables) -> Vec<Page> {
    let mut seen = HashSet::new();
    let mut pages = Vec::with_capacity(records.len());

    for (row, record) in records.iter().enumerate() {
        let Some((slug, permalink)) = identify(kind, record) else {
            log::warn!("Skipping {} row {}: no permalink or name", kind, row + 1);
            continue;
        };
        if !seen.insert(slug.clone()) {
            log::warn!(
                "Duplicate {} slug '{}' at row {}, keeping the first record",
                kind,
                slug,
                row + 1
            );
            continue;
        }

        let front_matter = front_matter(kind, record, &slug, &permalink, tables);
        pages.push(Page {
            kind,
            slug,
            front_matter,
        });
    }

    pages
}
