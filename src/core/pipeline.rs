use crate::core::allocator::allocate;
use crate::core::normalizer::{normalize, EMAIL_KEY, QUOTE_KEY};
use crate::core::{
    ConfigProvider, DocumentEditor, DocumentStore, Ledger, Pipeline, Storage,
};
use crate::domain::email::{folder_name, PublicEmailProviders};
use crate::domain::model::{
    LedgerRow, QuoteIdentifier, RenderedQuote, ReplacementSet, LEDGER_HEADERS,
};
use crate::domain::phone::CallingCodeTable;
use crate::domain::ports::{CountryLookup, EmailClassifier};
use crate::utils::error::{QuoteError, Result};
use crate::utils::validation::validate_path_component;
use chrono::{DateTime, Utc};

pub struct QuotationPipeline<C, L, D, E, S>
where
    C: ConfigProvider,
    L: Ledger,
    D: DocumentStore,
    E: DocumentEditor,
    S: Storage,
{
    config: C,
    ledger: L,
    store: D,
    editor: E,
    storage: S,
    classifier: Box<dyn EmailClassifier>,
    lookup: Box<dyn CountryLookup>,
}

impl<C, L, D, E, S> QuotationPipeline<C, L, D, E, S>
where
    C: ConfigProvider,
    L: Ledger,
    D: DocumentStore,
    E: DocumentEditor,
    S: Storage,
{
    pub fn new(config: C, ledger: L, store: D, editor: E, storage: S) -> Self {
        Self {
            config,
            ledger,
            store,
            editor,
            storage,
            classifier: Box::new(PublicEmailProviders),
            lookup: Box::new(CallingCodeTable),
        }
    }

    pub fn with_country_lookup(mut self, lookup: impl CountryLookup + 'static) -> Self {
        self.lookup = Box::new(lookup);
        self
    }

    pub fn with_email_classifier(mut self, classifier: impl EmailClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Customer folder for the quote; one directory below the output root.
    fn folder(&self, replacements: &ReplacementSet) -> Result<String> {
        let email = replacements
            .get(EMAIL_KEY)
            .ok_or_else(|| QuoteError::MissingConfig {
                field: EMAIL_KEY.to_string(),
            })?;
        let folder = folder_name(email, self.classifier.as_ref());
        validate_path_component(EMAIL_KEY, email, &folder)?;
        Ok(folder)
    }
}

#[async_trait::async_trait]
impl<C, L, D, E, S> Pipeline for QuotationPipeline<C, L, D, E, S>
where
    C: ConfigProvider,
    L: Ledger,
    D: DocumentStore,
    E: DocumentEditor,
    S: Storage,
{
    async fn prepare(&self, now: DateTime<Utc>) -> Result<ReplacementSet> {
        let replacements = normalize(
            self.config.data(),
            now,
            self.classifier.as_ref(),
            self.lookup.as_ref(),
        )?;
        // Reject an unusable folder before anything is written to the ledger.
        self.folder(&replacements)?;
        Ok(replacements)
    }

    async fn record(
        &self,
        replacements: &ReplacementSet,
        now: DateTime<Utc>,
    ) -> Result<QuoteIdentifier> {
        let sheet = self.config.sheet_name();

        self.ledger.ensure_table(sheet, &LEDGER_HEADERS).await?;

        let next_row = self.ledger.next_empty_row(sheet).await?;
        let last_quote = if next_row > 1 {
            self.ledger.read_cell(sheet, next_row - 1, 0).await?
        } else {
            None
        };
        tracing::debug!("Last recorded quotation: {:?}", last_quote);

        let quote = allocate(last_quote.as_deref(), now)?;
        let row = LedgerRow::from_replacements(&quote, replacements, self.config.template_doc_id());

        match self.ledger.append_row(sheet, &row).await? {
            Some(written) if written != next_row => tracing::warn!(
                "⚠️ Quotation {} landed on row {} instead of {}; another run may have written to the ledger concurrently",
                quote,
                written,
                next_row
            ),
            _ => tracing::debug!("Logged quotation {} on row {}", quote, next_row),
        }

        Ok(quote)
    }

    async fn render(&self, replacements: &ReplacementSet) -> Result<RenderedQuote> {
        let folder = self.folder(replacements)?;
        let quote = replacements
            .get(QUOTE_KEY)
            .ok_or_else(|| QuoteError::Config {
                message: "quotation number must be allocated before rendering".to_string(),
            })?;

        let folder_id = self
            .store
            .find_or_create_folder(&folder, self.config.parent_folder_id())
            .await?;
        tracing::info!("📂 Using domain folder id: {}", folder_id);

        let doc_name = format!("{} QUOTE #{}", folder, quote);
        let copy_id = self
            .store
            .copy_template(self.config.template_doc_id(), &doc_name, &folder_id)
            .await?;
        tracing::info!("Copied template to doc id: {}", copy_id);

        let document_id = self
            .editor
            .substitute_placeholders(&copy_id, replacements)
            .await?;

        let content = self.store.export_pdf(&document_id).await?;

        Ok(RenderedQuote {
            folder_name: folder,
            file_name: format!("{}.pdf", doc_name),
            content,
        })
    }

    async fn store(&self, rendered: RenderedQuote) -> Result<String> {
        let path = rendered.relative_path();
        tracing::debug!("Writing {} bytes to {}", rendered.content.len(), path);
        self.storage.write_file(&path, &rendered.content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::QuoteEngine;
    use crate::domain::model::LEDGER_SHEET_NAME;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct MockConfig {
        data: HashMap<String, String>,
    }

    impl MockConfig {
        fn new(pairs: &[(&str, &str)]) -> Self {
            Self {
                data: pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn parent_folder_id(&self) -> &str {
            "parent-1"
        }

        fn template_doc_id(&self) -> &str {
            "template-1"
        }

        fn sheet_name(&self) -> &str {
            LEDGER_SHEET_NAME
        }

        fn data(&self) -> &HashMap<String, String> {
            &self.data
        }
    }

    #[derive(Clone, Default)]
    struct MockLedger {
        rows: Arc<Mutex<Vec<Vec<String>>>>,
        concurrent_insert: Option<Vec<String>>,
    }

    impl MockLedger {
        fn with_rows(rows: Vec<Vec<&str>>) -> Self {
            Self {
                rows: Arc::new(Mutex::new(
                    rows.into_iter()
                        .map(|r| r.into_iter().map(String::from).collect())
                        .collect(),
                )),
                concurrent_insert: None,
            }
        }

        fn rows(&self) -> Vec<Vec<String>> {
            self.rows.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Ledger for MockLedger {
        async fn ensure_table(&self, _name: &str, headers: &[&str]) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            if rows.is_empty() {
                rows.push(headers.iter().map(|h| h.to_string()).collect());
            }
            Ok(())
        }

        async fn next_empty_row(&self, _name: &str) -> Result<usize> {
            Ok(self.rows.lock().unwrap().len() + 1)
        }

        async fn read_cell(&self, _name: &str, row: usize, column: usize) -> Result<Option<String>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.get(row - 1).and_then(|r| r.get(column)).cloned())
        }

        async fn append_row(&self, _name: &str, row: &LedgerRow) -> Result<Option<usize>> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(other) = &self.concurrent_insert {
                rows.push(other.clone());
            }
            rows.push(row.cells().to_vec());
            Ok(Some(rows.len()))
        }
    }

    #[derive(Clone, Default)]
    struct MockStore {
        folders: Arc<Mutex<Vec<(String, String)>>>,
        copies: Arc<Mutex<Vec<(String, String, String)>>>,
    }

    #[async_trait::async_trait]
    impl DocumentStore for MockStore {
        async fn find_or_create_folder(&self, name: &str, parent_id: &str) -> Result<String> {
            self.folders
                .lock()
                .unwrap()
                .push((name.to_string(), parent_id.to_string()));
            Ok(format!("folder-{}", name))
        }

        async fn copy_template(&self, template_id: &str, name: &str, folder_id: &str) -> Result<String> {
            self.copies.lock().unwrap().push((
                template_id.to_string(),
                name.to_string(),
                folder_id.to_string(),
            ));
            Ok("copy-1".to_string())
        }

        async fn export_pdf(&self, file_id: &str) -> Result<Vec<u8>> {
            Ok(format!("%PDF {}", file_id).into_bytes())
        }
    }

    /// Applies replacements to an in-memory template in a chosen order.
    #[derive(Clone)]
    struct MockEditor {
        template: String,
        reverse: bool,
        rendered: Arc<Mutex<Option<String>>>,
    }

    impl MockEditor {
        fn new(template: &str, reverse: bool) -> Self {
            Self {
                template: template.to_string(),
                reverse,
                rendered: Arc::new(Mutex::new(None)),
            }
        }

        fn rendered(&self) -> String {
            self.rendered.lock().unwrap().clone().unwrap_or_default()
        }
    }

    #[async_trait::async_trait]
    impl DocumentEditor for MockEditor {
        async fn substitute_placeholders(
            &self,
            document_id: &str,
            replacements: &ReplacementSet,
        ) -> Result<String> {
            let mut pairs: Vec<(&str, &str)> = replacements.iter().collect();
            pairs.sort();
            if self.reverse {
                pairs.reverse();
            }
            let mut text = self.template.clone();
            for (key, value) in pairs {
                text = text.replace(key, value);
            }
            *self.rendered.lock().unwrap() = Some(text);
            Ok(document_id.to_string())
        }
    }

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            self.files.lock().unwrap().get(path).cloned().ok_or_else(|| {
                QuoteError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), data.to_vec());
            Ok(format!("out/{}", path))
        }
    }

    fn july_9() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 9, 8, 0, 0).unwrap()
    }

    const TEMPLATE: &str = "Quote {{quote}} for {{name}} ({{company}}, {{website}}) tel {{tel}} valid until {{expiry-date}}";

    #[tokio::test]
    async fn test_record_increments_last_quote() {
        let ledger = MockLedger::with_rows(vec![
            LEDGER_HEADERS.to_vec(),
            vec!["AC2407005", "Bob"],
        ]);
        let pipeline = QuotationPipeline::new(
            MockConfig::new(&[("email", "alice@example.com"), ("name", "Alice")]),
            ledger.clone(),
            MockStore::default(),
            MockEditor::new(TEMPLATE, false),
            MockStorage::default(),
        );

        let replacements = pipeline.prepare(july_9()).await.unwrap();
        let quote = pipeline.record(&replacements, july_9()).await.unwrap();

        assert_eq!(quote.to_string(), "AC2407006");
        let rows = ledger.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][0], "AC2407006");
        assert_eq!(rows[2][1], "Alice");
        assert_eq!(rows[2][6], "example.com");
        assert_eq!(rows[2][8], "template-1");
    }

    #[tokio::test]
    async fn test_record_on_fresh_ledger_writes_headers_first() {
        let ledger = MockLedger::default();
        let pipeline = QuotationPipeline::new(
            MockConfig::new(&[("email", "alice@example.com")]),
            ledger.clone(),
            MockStore::default(),
            MockEditor::new(TEMPLATE, false),
            MockStorage::default(),
        );

        let replacements = pipeline.prepare(july_9()).await.unwrap();
        let quote = pipeline.record(&replacements, july_9()).await.unwrap();

        assert_eq!(quote.to_string(), "AC2407001");
        let rows = ledger.rows();
        assert_eq!(rows[0][0], "Quotation #");
        assert_eq!(rows[1][0], "AC2407001");
    }

    #[tokio::test]
    async fn test_record_tolerates_concurrent_writer() {
        let mut ledger = MockLedger::with_rows(vec![LEDGER_HEADERS.to_vec()]);
        ledger.concurrent_insert = Some(vec!["AC2407001".to_string()]);
        let pipeline = QuotationPipeline::new(
            MockConfig::new(&[("email", "alice@example.com")]),
            ledger.clone(),
            MockStore::default(),
            MockEditor::new(TEMPLATE, false),
            MockStorage::default(),
        );

        let replacements = pipeline.prepare(july_9()).await.unwrap();
        let quote = pipeline.record(&replacements, july_9()).await.unwrap();

        // Race is accepted: both rows carry the same number.
        assert_eq!(quote.to_string(), "AC2407001");
        assert_eq!(ledger.rows().len(), 3);
    }

    #[tokio::test]
    async fn test_record_fails_on_malformed_last_quote() {
        let ledger = MockLedger::with_rows(vec![LEDGER_HEADERS.to_vec(), vec!["AC24xx005"]]);
        let pipeline = QuotationPipeline::new(
            MockConfig::new(&[("email", "alice@example.com")]),
            ledger.clone(),
            MockStore::default(),
            MockEditor::new(TEMPLATE, false),
            MockStorage::default(),
        );

        let replacements = pipeline.prepare(july_9()).await.unwrap();
        let err = pipeline.record(&replacements, july_9()).await.unwrap_err();

        assert!(matches!(err, QuoteError::QuoteFormat { .. }));
        assert_eq!(ledger.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_end_to_end_with_mocks() {
        let store = MockStore::default();
        let storage = MockStorage::default();
        let pipeline = QuotationPipeline::new(
            MockConfig::new(&[
                ("email", "alice@gmail.com"),
                ("name", "Alice"),
                ("Company", "Acme"),
                ("phone", "434 284 0668"),
            ]),
            MockLedger::with_rows(vec![LEDGER_HEADERS.to_vec(), vec!["AC2407005"]]),
            store.clone(),
            MockEditor::new(TEMPLATE, false),
            storage.clone(),
        );

        let path = QuoteEngine::new(pipeline).run(july_9()).await.unwrap();

        assert_eq!(path, "out/alice@gmail.com/alice@gmail.com QUOTE #AC2407006.pdf");
        assert_eq!(
            store.folders.lock().unwrap()[0],
            ("alice@gmail.com".to_string(), "parent-1".to_string())
        );
        assert_eq!(
            store.copies.lock().unwrap()[0],
            (
                "template-1".to_string(),
                "alice@gmail.com QUOTE #AC2407006".to_string(),
                "folder-alice@gmail.com".to_string()
            )
        );
        let pdf = storage
            .read_file("alice@gmail.com/alice@gmail.com QUOTE #AC2407006.pdf")
            .await
            .unwrap();
        assert_eq!(pdf, b"%PDF copy-1".to_vec());
    }

    #[tokio::test]
    async fn test_substitution_order_does_not_matter() {
        let mut outputs = Vec::new();
        for reverse in [false, true] {
            let editor = MockEditor::new(TEMPLATE, reverse);
            let pipeline = QuotationPipeline::new(
                MockConfig::new(&[
                    ("email", "alice@example.com"),
                    ("name", "Alice"),
                    ("company", "Acme"),
                    ("tel", "4342840668"),
                ]),
                MockLedger::default(),
                MockStore::default(),
                editor.clone(),
                MockStorage::default(),
            );
            QuoteEngine::new(pipeline).run(july_9()).await.unwrap();
            outputs.push(editor.rendered());
        }

        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(
            outputs[0],
            "Quote AC2407001 for Alice (Acme, example.com) tel +14342840668 valid until Aug 8, 2024"
        );
    }

    #[tokio::test]
    async fn test_render_requires_allocated_quote() {
        let pipeline = QuotationPipeline::new(
            MockConfig::new(&[("email", "alice@example.com")]),
            MockLedger::default(),
            MockStore::default(),
            MockEditor::new(TEMPLATE, false),
            MockStorage::default(),
        );

        let replacements = pipeline.prepare(july_9()).await.unwrap();
        assert!(pipeline.render(&replacements).await.is_err());
    }

    #[tokio::test]
    async fn test_folder_outside_out_dir_is_rejected_before_ledger_write() {
        for email in ["bob@..", "bob@.", "a/b@gmail.com", "bob@"] {
            let ledger = MockLedger::with_rows(vec![LEDGER_HEADERS.to_vec()]);
            let storage = MockStorage::default();
            let pipeline = QuotationPipeline::new(
                MockConfig::new(&[("email", email)]),
                ledger.clone(),
                MockStore::default(),
                MockEditor::new(TEMPLATE, false),
                storage.clone(),
            );

            let err = QuoteEngine::new(pipeline).run(july_9()).await.unwrap_err();

            assert!(
                matches!(err, QuoteError::InvalidConfigValue { ref field, .. } if field == "{{email}}"),
                "{email}: {err}"
            );
            assert_eq!(err.exit_code(), 2);
            assert_eq!(ledger.rows().len(), 1);
            assert!(storage.files.lock().unwrap().is_empty());
        }
    }
}
