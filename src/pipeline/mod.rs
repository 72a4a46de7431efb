//! Pipeline entry points for content operations.
//!
//! - `run_sync`: Fetch sheets, enrich records and write data files
//! - `run_generate`: Write member, group and project pages
//! - `run_audit`: Check build output for minification
//! - `run_pipeline`: All of the above in sequence
//! - `run_validate`: Check configuration offline

pub mod audit;
pub mod generate;
pub mod pipeline;
pub mod sync;
pub mod validate;

pub use audit::run_audit;
pub use generate::{GenerateSummary, run_generate};
pub use pipeline::run_pipeline;
pub use sync::{SyncSummary, run_sync};
pub use validate::run_validate;
