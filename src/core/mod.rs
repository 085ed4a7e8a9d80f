pub mod allocator;
pub mod engine;
pub mod normalizer;
pub mod pipeline;

pub use crate::domain::model::{LedgerRow, QuoteIdentifier, RenderedQuote, ReplacementSet};
pub use crate::domain::ports::{
    ConfigProvider, DocumentEditor, DocumentStore, Ledger, Pipeline, Storage,
};
pub use crate::utils::error::Result;
pub use engine::QuoteEngine;
