use super::{check_status, GoogleClient};
use crate::core::{DocumentEditor, ReplacementSet};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "Docs";

#[derive(Debug, Serialize)]
struct BatchUpdateRequest {
    requests: Vec<Request>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Request {
    replace_all_text: ReplaceAllText,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplaceAllText {
    contains_text: SubstringMatch,
    replace_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubstringMatch {
    text: String,
    match_case: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateResponse {
    document_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DocsEditor {
    client: GoogleClient,
}

impl DocsEditor {
    pub fn new(client: GoogleClient) -> Self {
        Self { client }
    }
}

/// One replaceAllText request per placeholder. The requests are independent
/// so their order is irrelevant.
fn replacement_requests(replacements: &ReplacementSet) -> BatchUpdateRequest {
    let requests = replacements
        .iter()
        .map(|(key, value)| Request {
            replace_all_text: ReplaceAllText {
                contains_text: SubstringMatch {
                    text: key.to_string(),
                    match_case: true,
                },
                replace_text: value.to_string(),
            },
        })
        .collect();
    BatchUpdateRequest { requests }
}

#[async_trait]
impl DocumentEditor for DocsEditor {
    async fn substitute_placeholders(
        &self,
        document_id: &str,
        replacements: &ReplacementSet,
    ) -> Result<String> {
        let url = self.client.url(
            &self.client.endpoints().docs_url,
            &["documents", &format!("{}:batchUpdate", document_id)],
        )?;
        let body = replacement_requests(replacements);
        tracing::debug!("Replacing {} placeholders in {}", body.requests.len(), document_id);

        let response = self.client.post(url).json(&body).send().await?;
        let updated: BatchUpdateResponse = check_status(SERVICE, response).await?.json().await?;

        Ok(updated
            .document_id
            .unwrap_or_else(|| document_id.to_string()))
    }
}
