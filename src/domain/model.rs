use std::collections::HashMap;
use std::fmt;

/// Name of the worksheet inside the ledger spreadsheet.
pub const LEDGER_SHEET_NAME: &str = "Quotation Log";

pub const LEDGER_HEADERS: [&str; 11] = [
    "Quotation #",
    "Name",
    "Designation",
    "Email",
    "Telephone",
    "Company",
    "Website",
    "Country",
    "Pricing Template",
    "Preparation Date",
    "Expiration Date",
];

pub const QUOTE_PREFIX: &str = "AC";

/// `AC` + YY + MM + serial, e.g. `AC2407006`.
///
/// The serial is zero padded to three digits and simply widens once it
/// passes 999.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteIdentifier {
    pub year: u32,
    pub month: u32,
    pub serial: u64,
}

impl QuoteIdentifier {
    pub fn new(year: u32, month: u32, serial: u64) -> Self {
        Self {
            year: year % 100,
            month,
            serial,
        }
    }
}

impl fmt::Display for QuoteIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:02}{:02}{:03}",
            QUOTE_PREFIX, self.year, self.month, self.serial
        )
    }
}

/// Placeholder key (`{{name}}`) to replacement text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementSet {
    entries: HashMap<String, String>,
}

impl ReplacementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Value for a ledger cell; absent placeholders become empty cells.
    pub fn cell(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One ledger row, ordered like [`LEDGER_HEADERS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    cells: Vec<String>,
}

impl LedgerRow {
    pub fn from_replacements(
        quote: &QuoteIdentifier,
        replacements: &ReplacementSet,
        template_doc_id: &str,
    ) -> Self {
        let cells = vec![
            quote.to_string(),
            replacements.cell("{{name}}"),
            replacements.cell("{{designation}}"),
            replacements.cell("{{email}}"),
            replacements.cell("{{tel}}"),
            replacements.cell("{{company}}"),
            replacements.cell("{{website}}"),
            replacements.cell("{{country}}"),
            template_doc_id.to_string(),
            replacements.cell("{{prep-date}}"),
            replacements.cell("{{expiry-date}}"),
        ];
        Self { cells }
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// Exported PDF plus where it belongs.
#[derive(Debug, Clone)]
pub struct RenderedQuote {
    pub folder_name: String,
    pub file_name: String,
    pub content: Vec<u8>,
}

impl RenderedQuote {
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.folder_name, self.file_name)
    }
}
