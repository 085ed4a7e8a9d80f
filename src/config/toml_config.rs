use crate::adapters::google::GoogleEndpoints;
use crate::utils::error::{QuoteError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Optional file-based configuration. Command line flags take precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub defaults: Option<DefaultsConfig>,
    pub ledger: Option<LedgerConfig>,
    pub templates: Option<HashMap<String, String>>,
    pub google: Option<GoogleEndpoints>,
    pub data: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    pub parent_folder_id: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub out_dir: Option<String>,
    pub credentials_file: Option<String>,
    pub token_file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub sheet_name: Option<String>,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(&path).map_err(|e| QuoteError::InvalidConfigValue {
                field: "--config".to_string(),
                value: path.as_ref().display().to_string(),
                reason: format!("unable to read config file: {}", e),
            })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| QuoteError::InvalidConfigValue {
            field: "config file".to_string(),
            value: String::new(),
            reason: format!("TOML parsing error: {}", e),
        })
    }

    /// Expands `${VAR}` references from the environment; unknown ones stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| QuoteError::Config {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn defaults(&self) -> DefaultsConfig {
        self.defaults.clone().unwrap_or_default()
    }

    pub fn sheet_name(&self) -> Option<&str> {
        self.ledger.as_ref().and_then(|l| l.sheet_name.as_deref())
    }
}

impl Validate for FileConfig {
    fn validate(&self) -> Result<()> {
        if let Some(google) = &self.google {
            google.validate()?;
        }
        if let Some(name) = self.sheet_name() {
            crate::utils::validation::validate_non_empty_string("ledger.sheet_name", name)?;
        }
        Ok(())
    }
}
