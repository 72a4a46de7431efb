// src/lib.rs

//! sitesync: spreadsheet-backed content pipeline for a static site.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
