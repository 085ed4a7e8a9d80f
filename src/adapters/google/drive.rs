use super::{check_status, GoogleClient};
use crate::core::DocumentStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const SERVICE: &str = "Drive";
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Clone)]
pub struct DriveStore {
    client: GoogleClient,
}

impl DriveStore {
    pub fn new(client: GoogleClient) -> Self {
        Self { client }
    }

    fn url(&self, segments: &[&str]) -> Result<url::Url> {
        self.client.url(&self.client.endpoints().drive_url, segments)
    }

    async fn find_folder(&self, name: &str, parent_id: &str) -> Result<Option<String>> {
        let query = folder_query(name, parent_id);
        tracing::debug!("Searching Drive: {}", query);

        let response = self
            .client
            .get(self.url(&["files"])?)
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", "files(id,name)"),
            ])
            .send()
            .await?;
        let list: FileList = check_status(SERVICE, response).await?.json().await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String> {
        let body = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent_id],
        });
        let response = self
            .client
            .post(self.url(&["files"])?)
            .query(&[("fields", "id")])
            .json(&body)
            .send()
            .await?;
        let folder: DriveFile = check_status(SERVICE, response).await?.json().await?;
        Ok(folder.id)
    }
}

#[async_trait]
impl DocumentStore for DriveStore {
    async fn find_or_create_folder(&self, name: &str, parent_id: &str) -> Result<String> {
        if let Some(id) = self.find_folder(name, parent_id).await? {
            return Ok(id);
        }
        tracing::info!("Creating Drive folder '{}'", name);
        self.create_folder(name, parent_id).await
    }

    async fn copy_template(&self, template_id: &str, name: &str, folder_id: &str) -> Result<String> {
        let body = json!({
            "name": name,
            "parents": [folder_id],
        });
        let response = self
            .client
            .post(self.url(&["files", template_id, "copy"])?)
            .query(&[("fields", "id,parents")])
            .json(&body)
            .send()
            .await?;
        let copy: DriveFile = check_status(SERVICE, response).await?.json().await?;
        Ok(copy.id)
    }

    async fn export_pdf(&self, file_id: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.url(&["files", file_id, "export"])?)
            .query(&[("mimeType", PDF_MIME_TYPE)])
            .send()
            .await?;
        let bytes = check_status(SERVICE, response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// Drive search query for a folder directly under `parent_id`.
pub fn folder_query(name: &str, parent_id: &str) -> String {
    format!(
        "name = '{}' and mimeType = '{}' and '{}' in parents and trashed = false",
        escape_query_value(name),
        FOLDER_MIME_TYPE,
        escape_query_value(parent_id)
    )
}

fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_query() {
        assert_eq!(
            folder_query("example.com", "parent-1"),
            "name = 'example.com' and mimeType = 'application/vnd.google-apps.folder' and 'parent-1' in parents and trashed = false"
        );
    }

    #[test]
    fn test_folder_query_escapes_quotes() {
        let query = folder_query("o'brien@gmail.com", "p");
        assert!(query.starts_with("name = 'o\\'brien@gmail.com'"));
    }
}
