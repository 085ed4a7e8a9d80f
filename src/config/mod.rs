#[cfg(feature = "cli")]
pub mod cli;
pub mod templates;
pub mod toml_config;

use crate::adapters::google::GoogleEndpoints;
use crate::core::normalizer::{placeholder_key, EMAIL_KEY};
use crate::core::ConfigProvider;
use crate::domain::model::LEDGER_SHEET_NAME;
use crate::utils::error::{QuoteError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_required_field, validate_required_key,
    Validate,
};
use std::collections::HashMap;

pub use templates::TemplateAliases;
pub use toml_config::FileConfig;

pub const DEFAULT_PARENT_FOLDER_ID: &str = "1MW9ElMPDupVRohXqit-j6Wls-Cvq7DmN";
pub const DEFAULT_SPREADSHEET_ID: &str = "1evwv2ON94R38M-Lkrw8b6dpVSkRYHUWsNOuI7X0_-zA";
pub const DEFAULT_OUT_DIR: &str = "/personal/AppsCode/quotes";
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";
pub const DEFAULT_TOKEN_FILE: &str = "token.json";

/// Values given explicitly for this run; each one beats the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub parent_folder_id: Option<String>,
    pub template_doc_id: Option<String>,
    pub out_dir: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub credentials_file: Option<String>,
    pub token_file: Option<String>,
    pub data: Vec<(String, String)>,
}

/// Fully resolved settings for one quotation run.
#[derive(Debug, Clone)]
pub struct QuoteConfig {
    pub parent_folder_id: String,
    pub template_doc_id: String,
    pub out_dir: String,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub credentials_file: String,
    pub token_file: String,
    pub endpoints: GoogleEndpoints,
    pub data: HashMap<String, String>,
}

impl QuoteConfig {
    /// Layers overrides over the config file over built-in defaults and
    /// resolves the template alias.
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Result<Self> {
        file.validate()?;
        let defaults = file.defaults();

        let template = validate_required_field("--template-doc-id", &overrides.template_doc_id)?;
        let aliases = match &file.templates {
            Some(extra) => TemplateAliases::with_overrides(extra),
            None => TemplateAliases::default(),
        };
        let template_doc_id = aliases.resolve(template);
        if template_doc_id != *template {
            tracing::debug!("Template alias {} resolved to {}", template, template_doc_id);
        }

        let data = merge_data(file.data.as_ref(), overrides.data)?;

        Ok(Self {
            parent_folder_id: overrides
                .parent_folder_id
                .or(defaults.parent_folder_id)
                .unwrap_or_else(|| DEFAULT_PARENT_FOLDER_ID.to_string()),
            template_doc_id,
            out_dir: overrides
                .out_dir
                .or(defaults.out_dir)
                .unwrap_or_else(|| DEFAULT_OUT_DIR.to_string()),
            spreadsheet_id: overrides
                .spreadsheet_id
                .or(defaults.spreadsheet_id)
                .unwrap_or_else(|| DEFAULT_SPREADSHEET_ID.to_string()),
            sheet_name: file
                .sheet_name()
                .unwrap_or(LEDGER_SHEET_NAME)
                .to_string(),
            credentials_file: overrides
                .credentials_file
                .or(defaults.credentials_file)
                .unwrap_or_else(|| DEFAULT_CREDENTIALS_FILE.to_string()),
            token_file: overrides
                .token_file
                .or(defaults.token_file)
                .unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string()),
            endpoints: file.google.clone().unwrap_or_default(),
            data,
        })
    }
}

/// Folds `[data]` and `--data` keys into placeholder keys. Two file keys
/// naming the same placeholder are rejected; flags then apply in command
/// line order over the file, so the last explicit value wins.
fn merge_data(
    file: Option<&HashMap<String, String>>,
    flags: Vec<(String, String)>,
) -> Result<HashMap<String, String>> {
    let mut data = HashMap::new();
    let mut sources: HashMap<String, &str> = HashMap::new();

    let mut entries: Vec<(&String, &String)> = file.into_iter().flatten().collect();
    entries.sort();
    for (raw, value) in entries {
        let key = placeholder_key(raw);
        if let Some(previous) = sources.insert(key.clone(), raw.as_str()) {
            return Err(QuoteError::InvalidConfigValue {
                field: "[data]".to_string(),
                value: raw.clone(),
                reason: format!("`{}` and `{}` both fill {}", previous, raw, key),
            });
        }
        data.insert(key, value.clone());
    }

    for (raw, value) in flags {
        let key = placeholder_key(&raw);
        if data.insert(key.clone(), value).is_some() {
            tracing::debug!("--data {} replaces an earlier value for {}", raw, key);
        }
    }
    Ok(data)
}

impl ConfigProvider for QuoteConfig {
    fn parent_folder_id(&self) -> &str {
        &self.parent_folder_id
    }

    fn template_doc_id(&self) -> &str {
        &self.template_doc_id
    }

    fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    fn data(&self) -> &HashMap<String, String> {
        &self.data
    }
}

impl Validate for QuoteConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("--parent-folder-id", &self.parent_folder_id)?;
        validate_non_empty_string("--template-doc-id", &self.template_doc_id)?;
        validate_non_empty_string("--spreadsheet-id", &self.spreadsheet_id)?;
        validate_path("--out-dir", &self.out_dir)?;
        validate_path("--credentials", &self.credentials_file)?;
        validate_path("--token-file", &self.token_file)?;
        self.endpoints.validate()?;
        validate_required_key(&self.data, EMAIL_KEY)
    }
}
