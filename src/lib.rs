pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::google::{DocsEditor, DriveStore, GoogleClient, GoogleEndpoints, SheetsLedger};
pub use adapters::storage::LocalStorage;
pub use config::QuoteConfig;
pub use core::{engine::QuoteEngine, pipeline::QuotationPipeline};
pub use utils::error::{QuoteError, Result};
