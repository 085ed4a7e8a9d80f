use super::{check_status, GoogleClient};
use crate::core::{Ledger, LedgerRow};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

const SERVICE: &str = "Sheets";

#[derive(Debug, Default, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: i64,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(default)]
    major_dimension: Option<String>,
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct AppendResponse {
    updates: Option<UpdatedValues>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatedValues {
    updated_range: Option<String>,
}

/// Quotation ledger kept in one worksheet of a Google spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetsLedger {
    client: GoogleClient,
    spreadsheet_id: String,
}

impl SheetsLedger {
    pub fn new(client: GoogleClient, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            client,
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    fn url(&self, tail: &[&str]) -> Result<url::Url> {
        let mut segments = vec!["spreadsheets"];
        segments.extend_from_slice(tail);
        self.client.url(&self.client.endpoints().sheets_url, &segments)
    }

    async fn find_sheet(&self, name: &str) -> Result<Option<i64>> {
        let url = self.url(&[&self.spreadsheet_id])?;
        let response = self
            .client
            .get(url)
            .query(&[("fields", "sheets.properties(sheetId,title)")])
            .send()
            .await?;
        let spreadsheet: Spreadsheet = check_status(SERVICE, response).await?.json().await?;

        Ok(spreadsheet
            .sheets
            .into_iter()
            .find(|s| s.properties.title == name)
            .map(|s| s.properties.sheet_id))
    }

    async fn add_sheet(&self, name: &str) -> Result<()> {
        let url = self.url(&[&format!("{}:batchUpdate", self.spreadsheet_id)])?;
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": name } } }]
        });
        let response = self.client.post(url).json(&body).send().await?;
        check_status(SERVICE, response).await?;
        Ok(())
    }

    async fn write_headers(&self, name: &str, headers: &[&str]) -> Result<()> {
        let range = a1_range(name, "A1");
        let url = self.url(&[&self.spreadsheet_id, "values", &range])?;
        let body = ValueRange {
            range: Some(range),
            major_dimension: Some("ROWS".to_string()),
            values: vec![headers.iter().map(|h| h.to_string()).collect()],
        };
        let response = self
            .client
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await?;
        check_status(SERVICE, response).await?;
        Ok(())
    }

    async fn values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.url(&[&self.spreadsheet_id, "values", range])?;
        let response = self
            .client
            .get(url)
            .query(&[("majorDimension", "ROWS")])
            .send()
            .await?;
        let value_range: ValueRange = check_status(SERVICE, response).await?.json().await?;
        Ok(value_range.values)
    }
}

#[async_trait]
impl Ledger for SheetsLedger {
    async fn ensure_table(&self, name: &str, headers: &[&str]) -> Result<()> {
        if let Some(sheet_id) = self.find_sheet(name).await? {
            tracing::debug!("Found sheet '{}' (id {})", name, sheet_id);
            return Ok(());
        }

        tracing::info!("Creating sheet '{}' in spreadsheet {}", name, self.spreadsheet_id);
        self.add_sheet(name).await?;
        self.write_headers(name, headers).await
    }

    async fn next_empty_row(&self, name: &str) -> Result<usize> {
        let column = self.values(&a1_range(name, "A:A")).await?;
        Ok(column.len() + 1)
    }

    async fn read_cell(&self, name: &str, row: usize, column: usize) -> Result<Option<String>> {
        let cell = format!("{}{}", column_letters(column), row);
        let values = self.values(&a1_range(name, &cell)).await?;
        Ok(values.into_iter().next().and_then(|r| r.into_iter().next()))
    }

    async fn append_row(&self, name: &str, row: &LedgerRow) -> Result<Option<usize>> {
        let range = a1_range(name, "A1");
        let url = self.url(&[&self.spreadsheet_id, "values", &format!("{}:append", range)])?;
        let body = ValueRange {
            range: None,
            major_dimension: Some("ROWS".to_string()),
            values: vec![row.cells().to_vec()],
        };
        let response = self
            .client
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&body)
            .send()
            .await?;
        let appended: AppendResponse = check_status(SERVICE, response).await?.json().await?;

        Ok(appended
            .updates
            .and_then(|u| u.updated_range)
            .and_then(|r| first_row_of_range(&r)))
    }
}

/// `'Sheet Name'!A1`, quoting embedded apostrophes.
pub fn a1_range(sheet: &str, cells: &str) -> String {
    format!("'{}'!{}", sheet.replace('\'', "''"), cells)
}

/// Zero-based column index to spreadsheet letters (0 -> A, 26 -> AA).
pub fn column_letters(mut column: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (column % 26) as u8) as char);
        if column < 26 {
            break;
        }
        column = column / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Row number of the first cell in a range like `'Quotation Log'!A7:K7`.
fn first_row_of_range(range: &str) -> Option<usize> {
    let cells = range.rsplit('!').next()?;
    let first = cells.split(':').next()?;
    first
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .ok()
}
