//! Google Workspace REST adapters for the ledger, document store, and
//! document editor ports.

pub mod auth;
pub mod docs;
pub mod drive;
pub mod sheets;

use crate::utils::error::{QuoteError, Result};
use crate::utils::validation::{validate_url, Validate};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use url::Url;

pub use auth::{Authenticator, ClientSecret, Token, TokenStore};
pub use docs::DocsEditor;
pub use drive::DriveStore;
pub use sheets::SheetsLedger;

pub const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/documents",
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/spreadsheets",
];

/// Base URLs of the REST APIs; overridable for proxies and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleEndpoints {
    pub sheets_url: String,
    pub drive_url: String,
    pub docs_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            sheets_url: "https://sheets.googleapis.com/v4".to_string(),
            drive_url: "https://www.googleapis.com/drive/v3".to_string(),
            docs_url: "https://docs.googleapis.com/v1".to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// All three APIs served from one host, as a mock server does.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            sheets_url: format!("{}/v4", base),
            drive_url: format!("{}/drive/v3", base),
            docs_url: format!("{}/v1", base),
        }
    }
}

impl Validate for GoogleEndpoints {
    fn validate(&self) -> Result<()> {
        validate_url("google.sheets_url", &self.sheets_url)?;
        validate_url("google.drive_url", &self.drive_url)?;
        validate_url("google.docs_url", &self.docs_url)?;
        Ok(())
    }
}

/// Authorized HTTP client shared by the adapters.
#[derive(Debug, Clone)]
pub struct GoogleClient {
    http: Client,
    access_token: String,
    endpoints: GoogleEndpoints,
}

impl GoogleClient {
    pub fn new(access_token: String, endpoints: GoogleEndpoints) -> Self {
        Self {
            http: Client::new(),
            access_token,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &GoogleEndpoints {
        &self.endpoints
    }

    /// `base` followed by each segment, percent-encoded.
    pub(crate) fn url(&self, base: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(base).map_err(|e| QuoteError::InvalidConfigValue {
            field: "google endpoint".to_string(),
            value: base.to_string(),
            reason: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| QuoteError::InvalidConfigValue {
                field: "google endpoint".to_string(),
                value: base.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        self.http.get(url).bearer_auth(&self.access_token)
    }

    pub(crate) fn post(&self, url: Url) -> RequestBuilder {
        self.http.post(url).bearer_auth(&self.access_token)
    }

    pub(crate) fn put(&self, url: Url) -> RequestBuilder {
        self.http.put(url).bearer_auth(&self.access_token)
    }
}

/// Turns a non-2xx response into [`QuoteError::Service`] carrying the body.
pub(crate) async fn check_status(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!("{} error body: {}", service, body);
    Err(QuoteError::service(service, status.as_u16(), body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encodes_segments() {
        let client = GoogleClient::new("t".to_string(), GoogleEndpoints::default());
        let url = client
            .url(
                &client.endpoints().sheets_url,
                &["spreadsheets", "abc", "values", "'Quotation Log'!A:A"],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/'Quotation%20Log'!A:A"
        );
    }

    #[test]
    fn test_with_base_endpoints() {
        let endpoints = GoogleEndpoints::with_base("http://127.0.0.1:9000/");
        assert_eq!(endpoints.drive_url, "http://127.0.0.1:9000/drive/v3");
        assert!(endpoints.validate().is_ok());
    }

    #[test]
    fn test_default_endpoints_are_valid() {
        assert!(GoogleEndpoints::default().validate().is_ok());
    }
}
