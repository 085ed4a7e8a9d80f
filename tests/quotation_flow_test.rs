use chrono::{TimeZone, Utc};
use httpmock::prelude::*;
use quotegen::adapters::google::drive::folder_query;
use quotegen::{
    DocsEditor, DriveStore, GoogleClient, GoogleEndpoints, LocalStorage, QuotationPipeline,
    QuoteConfig, QuoteEngine, QuoteError, SheetsLedger,
};
use std::collections::HashMap;
use tempfile::TempDir;

const TOKEN: &str = "test-token";

fn config(server: &MockServer, out_dir: &str, email: &str) -> QuoteConfig {
    let mut data = HashMap::new();
    data.insert("email".to_string(), email.to_string());
    data.insert("Name".to_string(), "Alice Smith".to_string());
    data.insert("company".to_string(), "Acme".to_string());
    data.insert("phone".to_string(), "+1 (434) 284-0668".to_string());

    QuoteConfig {
        parent_folder_id: "parent-1".to_string(),
        template_doc_id: "template-doc".to_string(),
        out_dir: out_dir.to_string(),
        spreadsheet_id: "sheet-1".to_string(),
        sheet_name: "Quotation Log".to_string(),
        credentials_file: "credentials.json".to_string(),
        token_file: "token.json".to_string(),
        endpoints: GoogleEndpoints::with_base(&server.base_url()),
        data,
    }
}

fn engine(
    config: QuoteConfig,
) -> QuoteEngine<QuotationPipeline<QuoteConfig, SheetsLedger, DriveStore, DocsEditor, LocalStorage>>
{
    let google = GoogleClient::new(TOKEN.to_string(), config.endpoints.clone());
    let ledger = SheetsLedger::new(google.clone(), config.spreadsheet_id.clone());
    let storage = LocalStorage::new(config.out_dir.clone());
    let pipeline = QuotationPipeline::new(
        config,
        ledger,
        DriveStore::new(google.clone()),
        DocsEditor::new(google),
        storage,
    );
    QuoteEngine::new(pipeline)
}

/// Ledger already holds two July 2024 quotations.
fn mock_existing_ledger(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET)
            .path("/v4/spreadsheets/sheet-1")
            .header("Authorization", "Bearer test-token");
        then.status(200).json_body(serde_json::json!({
            "sheets": [
                { "properties": { "sheetId": 7, "title": "Archive" } },
                { "properties": { "sheetId": 0, "title": "Quotation Log" } }
            ]
        }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path_contains("/v4/spreadsheets/sheet-1/values/")
            .path_contains("A:A");
        then.status(200).json_body(serde_json::json!({
            "range": "'Quotation Log'!A1:A3",
            "majorDimension": "ROWS",
            "values": [["Quotation #"], ["AC2407004"], ["AC2407005"]]
        }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path_contains("/v4/spreadsheets/sheet-1/values/")
            .path_contains("!A3");
        then.status(200).json_body(serde_json::json!({
            "range": "'Quotation Log'!A3",
            "majorDimension": "ROWS",
            "values": [["AC2407005"]]
        }));
    });
}

#[tokio::test]
async fn test_end_to_end_quotation() {
    let temp_dir = TempDir::new().unwrap();
    let out_dir = temp_dir.path().to_str().unwrap().to_string();
    let server = MockServer::start();
    mock_existing_ledger(&server);

    let append_mock = server.mock(|when, then| {
        when.method(POST)
            .path_contains(":append")
            .query_param("valueInputOption", "RAW")
            .query_param("insertDataOption", "INSERT_ROWS")
            .body_contains("AC2407006")
            .body_contains("+14342840668")
            .body_contains("template-doc");
        then.status(200).json_body(serde_json::json!({
            "spreadsheetId": "sheet-1",
            "updates": { "updatedRange": "'Quotation Log'!A4:K4", "updatedRows": 1 }
        }));
    });

    let search_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/drive/v3/files")
            .query_param("q", folder_query("example.com", "parent-1"))
            .query_param("spaces", "drive");
        then.status(200).json_body(serde_json::json!({ "files": [] }));
    });
    let create_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/drive/v3/files")
            .body_contains("\"name\":\"example.com\"")
            .body_contains("application/vnd.google-apps.folder")
            .body_contains("parent-1");
        then.status(200).json_body(serde_json::json!({ "id": "folder-9" }));
    });
    let copy_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/drive/v3/files/template-doc/copy")
            .body_contains("example.com QUOTE #AC2407006")
            .body_contains("folder-9");
        then.status(200)
            .json_body(serde_json::json!({ "id": "copy-7", "parents": ["folder-9"] }));
    });
    let docs_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/documents/copy-7:batchUpdate")
            .body_contains("{{quote}}")
            .body_contains("AC2407006")
            .body_contains("{{name}}")
            .body_contains("{{country}}")
            .body_contains("\"matchCase\":true");
        then.status(200).json_body(serde_json::json!({ "documentId": "copy-7", "replies": [] }));
    });
    let export_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/drive/v3/files/copy-7/export")
            .query_param("mimeType", "application/pdf");
        then.status(200)
            .header("Content-Type", "application/pdf")
            .body("%PDF-1.4 quotation");
    });

    let now = Utc.with_ymd_and_hms(2024, 7, 9, 8, 0, 0).unwrap();
    let output_path = engine(config(&server, &out_dir, "alice@example.com"))
        .run(now)
        .await
        .unwrap();

    append_mock.assert();
    search_mock.assert();
    create_mock.assert();
    copy_mock.assert();
    docs_mock.assert();
    export_mock.assert();

    let expected = temp_dir
        .path()
        .join("example.com")
        .join("example.com QUOTE #AC2407006.pdf");
    assert_eq!(output_path, expected.display().to_string());
    assert_eq!(std::fs::read(&expected).unwrap(), b"%PDF-1.4 quotation");
}

#[tokio::test]
async fn test_existing_folder_is_reused_for_public_email() {
    let temp_dir = TempDir::new().unwrap();
    let out_dir = temp_dir.path().to_str().unwrap().to_string();
    let server = MockServer::start();
    mock_existing_ledger(&server);

    server.mock(|when, then| {
        when.method(POST).path_contains(":append");
        then.status(200).json_body(serde_json::json!({}));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/drive/v3/files")
            .query_param("q", folder_query("alice@gmail.com", "parent-1"));
        then.status(200)
            .json_body(serde_json::json!({ "files": [{ "id": "folder-1", "name": "alice@gmail.com" }] }));
    });
    let create_mock = server.mock(|when, then| {
        when.method(POST).path("/drive/v3/files");
        then.status(200).json_body(serde_json::json!({ "id": "unexpected" }));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/drive/v3/files/template-doc/copy")
            .body_contains("folder-1");
        then.status(200).json_body(serde_json::json!({ "id": "copy-1" }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/v1/documents/copy-1:batchUpdate");
        then.status(200).json_body(serde_json::json!({ "documentId": "copy-1" }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/drive/v3/files/copy-1/export");
        then.status(200).body("%PDF");
    });

    let now = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();
    let output_path = engine(config(&server, &out_dir, "alice@gmail.com"))
        .run(now)
        .await
        .unwrap();

    create_mock.assert_hits(0);
    assert!(output_path.ends_with("alice@gmail.com QUOTE #AC2408001.pdf"));
    assert!(temp_dir.path().join("alice@gmail.com").is_dir());
}

#[tokio::test]
async fn test_service_failure_stops_run_without_local_output() {
    let temp_dir = TempDir::new().unwrap();
    let out_dir = temp_dir.path().to_str().unwrap().to_string();
    let server = MockServer::start();
    mock_existing_ledger(&server);

    server.mock(|when, then| {
        when.method(POST).path_contains(":append");
        then.status(200).json_body(serde_json::json!({}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/drive/v3/files");
        then.status(200).json_body(serde_json::json!({ "files": [{ "id": "folder-1" }] }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/drive/v3/files/template-doc/copy");
        then.status(404).body(r#"{"error":{"message":"File not found: template-doc"}}"#);
    });
    let docs_mock = server.mock(|when, then| {
        when.method(POST).path_contains(":batchUpdate");
        then.status(200).json_body(serde_json::json!({}));
    });

    let now = Utc.with_ymd_and_hms(2024, 7, 9, 8, 0, 0).unwrap();
    let err = engine(config(&server, &out_dir, "alice@example.com"))
        .run(now)
        .await
        .unwrap_err();

    match err {
        QuoteError::Service {
            service,
            status,
            message,
        } => {
            assert_eq!(service, "Drive");
            assert_eq!(status, 404);
            assert!(message.contains("File not found"));
        }
        other => panic!("unexpected error: {other}"),
    }
    docs_mock.assert_hits(0);
    assert!(!temp_dir.path().join("example.com").exists());
}

#[tokio::test]
async fn test_malformed_ledger_value_stops_before_append() {
    let temp_dir = TempDir::new().unwrap();
    let out_dir = temp_dir.path().to_str().unwrap().to_string();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/v4/spreadsheets/sheet-1");
        then.status(200).json_body(serde_json::json!({
            "sheets": [{ "properties": { "sheetId": 0, "title": "Quotation Log" } }]
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path_contains("A:A");
        then.status(200)
            .json_body(serde_json::json!({ "values": [["Quotation #"], ["AC24Q7005"]] }));
    });
    server.mock(|when, then| {
        when.method(GET).path_contains("!A2");
        then.status(200).json_body(serde_json::json!({ "values": [["AC24Q7005"]] }));
    });
    let append_mock = server.mock(|when, then| {
        when.method(POST).path_contains(":append");
        then.status(200).json_body(serde_json::json!({}));
    });

    let now = Utc.with_ymd_and_hms(2024, 7, 9, 8, 0, 0).unwrap();
    let err = engine(config(&server, &out_dir, "alice@example.com"))
        .run(now)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("month"));
    assert!(err.to_string().contains("AC24Q7005"));
    append_mock.assert_hits(0);
}
