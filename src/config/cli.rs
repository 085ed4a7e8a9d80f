use crate::config::{FileConfig, Overrides, QuoteConfig};
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "quotegen")]
#[command(about = "Generate a sales quotation from a Google Docs template")]
pub struct CliConfig {
    #[arg(
        long,
        help = "Parent folder id where generated docs are stored under a folder with matching email domain"
    )]
    pub parent_folder_id: Option<String>,

    #[arg(long, help = "Template document id or alias (e.g. kubedb-30)")]
    pub template_doc_id: Option<String>,

    #[arg(long, help = "Path to directory where output files are stored")]
    pub out_dir: Option<String>,

    #[arg(
        long = "data",
        value_name = "KEY=VALUE",
        value_parser = parse_key_val,
        help = "Key-value pair for text replacement; repeat for more"
    )]
    pub data: Vec<(String, String)>,

    #[arg(long, help = "Google Spreadsheet id used to store the quotation log")]
    pub spreadsheet_id: Option<String>,

    #[arg(long, help = "Optional TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "OAuth client secret file [default: credentials.json]")]
    pub credentials: Option<String>,

    #[arg(long, help = "Cached OAuth token file [default: token.json]")]
    pub token_file: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    pub fn resolve(self) -> Result<QuoteConfig> {
        let file = match &self.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path);
                FileConfig::from_file(path)?
            }
            None => FileConfig::default(),
        };

        let overrides = Overrides {
            parent_folder_id: self.parent_folder_id,
            template_doc_id: self.template_doc_id,
            out_dir: self.out_dir,
            spreadsheet_id: self.spreadsheet_id,
            credentials_file: self.credentials,
            token_file: self.token_file,
            data: self.data,
        };
        QuoteConfig::resolve(overrides, file)
    }
}

/// Splits `key=value` at the first `=`; the value may itself contain `=`.
fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{}`", s))?;
    if key.trim().is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{}`", s));
    }
    Ok((key.trim().to_string(), value.to_string()))
}
