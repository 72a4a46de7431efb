// src/models/mod.rs

//! Domain models for the content pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod entity;
mod record;
mod settings;

// Re-export all public types
pub use config::{
    AuditConfig, AuditTarget, Config, GenerateConfig, HttpConfig, ImageConfig, ImageMode,
    OutputFormat, PathsConfig, SyncConfig,
};
pub use entity::{
    ContributorLink, EntityKind, GroupRelations, Relationships, contributors_of_project,
    projects_of_member,
};
pub use record::{Field, Record};
pub use settings::{CredentialSource, MAX_SHEETS, SheetConfig, SyncSettings, load_dotenv};
