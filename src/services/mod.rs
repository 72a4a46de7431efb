//! Service layer for the content pipeline.
//!
//! This module contains the business logic for:
//! - Google API authorization (`auth`)
//! - Sheet fetching (`GoogleSheetsClient`)
//! - Image mirroring (`ImageMirror`)
//! - Record enrichment (`Enricher`)
//! - Page generation (`build_pages`)
//! - Minification audit (`audit_tree`)

pub mod audit;
pub mod auth;
pub mod enrich;
pub mod images;
pub mod pages;
pub mod sheets;

pub use audit::{AuditReport, FileReport, SectionReport, audit_tree, is_minified};
pub use auth::{AccessToken, DRIVE_SCOPE, SHEETS_SCOPE, ServiceAccountKey, authorize};
pub use enrich::{Enricher, ReferenceIndex};
pub use images::ImageMirror;
pub use pages::{FrontMatter, LinkTables, Page, build_pages};
pub use sheets::{GoogleSheetsClient, SheetRows, SheetSource, records_from_values};
