use crate::domain::model::{LedgerRow, QuoteIdentifier, RenderedQuote, ReplacementSet};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn parent_folder_id(&self) -> &str;
    fn template_doc_id(&self) -> &str;
    fn sheet_name(&self) -> &str;
    fn data(&self) -> &HashMap<String, String>;
}

/// Tabular ledger with one row per generated quotation. Rows and columns
/// are 1-based and 0-based respectively, matching spreadsheet conventions.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn ensure_table(&self, name: &str, headers: &[&str]) -> Result<()>;
    async fn next_empty_row(&self, name: &str) -> Result<usize>;
    async fn read_cell(&self, name: &str, row: usize, column: usize) -> Result<Option<String>>;
    /// Returns the row the ledger reports having written, when it says so.
    async fn append_row(&self, name: &str, row: &LedgerRow) -> Result<Option<usize>>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_or_create_folder(&self, name: &str, parent_id: &str) -> Result<String>;
    async fn copy_template(&self, template_id: &str, name: &str, folder_id: &str) -> Result<String>;
    async fn export_pdf(&self, file_id: &str) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait DocumentEditor: Send + Sync {
    async fn substitute_placeholders(
        &self,
        document_id: &str,
        replacements: &ReplacementSet,
    ) -> Result<String>;
}

pub trait EmailClassifier: Send + Sync {
    fn is_public(&self, email: &str) -> bool;
}

pub trait CountryLookup: Send + Sync {
    fn country(&self, tel: &str) -> Option<String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn prepare(&self, now: DateTime<Utc>) -> Result<ReplacementSet>;
    async fn record(
        &self,
        replacements: &ReplacementSet,
        now: DateTime<Utc>,
    ) -> Result<QuoteIdentifier>;
    async fn render(&self, replacements: &ReplacementSet) -> Result<RenderedQuote>;
    async fn store(&self, rendered: RenderedQuote) -> Result<String>;
}
