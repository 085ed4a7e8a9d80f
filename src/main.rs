use chrono::Utc;
use clap::Parser;
use quotegen::adapters::google::{Authenticator, ClientSecret, TokenStore, GOOGLE_SCOPES};
use quotegen::utils::logger::{self, LogFormat};
use quotegen::utils::validation::Validate;
use quotegen::{
    CliConfig, DocsEditor, DriveStore, GoogleClient, LocalStorage, QuotationPipeline, QuoteEngine,
    QuoteError, SheetsLedger,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    logger::init_logger(LogFormat::from_flag(cli.log_json), cli.verbose);

    tracing::info!("Starting quotegen CLI");
    tracing::debug!("CLI config: {:?}", cli);

    match run(cli).await {
        Ok(output_path) => {
            tracing::info!("✅ Quotation generated successfully!");
            println!("✅ Quotation generated successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Quotation run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: CliConfig) -> Result<String, QuoteError> {
    let config = cli.resolve()?;
    config.validate()?;

    let secret = ClientSecret::from_file(&config.credentials_file)?;
    let authenticator = Authenticator::new(
        secret,
        TokenStore::new(config.token_file.clone()),
        GOOGLE_SCOPES,
    );
    let access_token = authenticator.access_token().await?;

    let google = GoogleClient::new(access_token, config.endpoints.clone());
    let ledger = SheetsLedger::new(google.clone(), config.spreadsheet_id.clone());
    let store = DriveStore::new(google.clone());
    let editor = DocsEditor::new(google);
    let storage = LocalStorage::new(config.out_dir.clone());

    let pipeline = QuotationPipeline::new(config, ledger, store, editor, storage);
    QuoteEngine::new(pipeline).run(Utc::now()).await
}
