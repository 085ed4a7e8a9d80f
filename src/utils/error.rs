use std::fmt;
use thiserror::Error;

/// Which fixed-width component of a quotation identifier failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteField {
    Year,
    Month,
    Serial,
}

impl fmt::Display for QuoteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteField::Year => write!(f, "year (YY)"),
            QuoteField::Month => write!(f, "month (MM)"),
            QuoteField::Serial => write!(f, "serial#"),
        }
    }
}

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("API request failed: {0}")]
    Api(#[from] reqwest::Error),

    #[error("{service} request failed with status {status}: {message}")]
    Service {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Authorization failed: {message}")]
    Auth { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("failed to detect {field} from quote {quote}")]
    QuoteFormat { field: QuoteField, quote: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Ledger,
    ExternalService,
    LocalIo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    High,
    Critical,
}

impl QuoteError {
    pub fn service(service: &str, status: u16, message: impl Into<String>) -> Self {
        QuoteError::Service {
            service: service.to_string(),
            status,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            QuoteError::Config { .. }
            | QuoteError::MissingConfig { .. }
            | QuoteError::InvalidConfigValue { .. } => ErrorCategory::Configuration,
            QuoteError::QuoteFormat { .. } => ErrorCategory::Ledger,
            QuoteError::Api(_) | QuoteError::Service { .. } | QuoteError::Auth { .. } => {
                ErrorCategory::ExternalService
            }
            QuoteError::Io(_) | QuoteError::Serialization(_) => ErrorCategory::LocalIo,
        }
    }

    /// Configuration mistakes are fixable by the caller; everything else
    /// means the run stopped midway and remote state may need inspection.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            _ => ErrorSeverity::Critical,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 2,
            _ => 1,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            QuoteError::MissingConfig { field } => format!("Missing required value: {}", field),
            QuoteError::InvalidConfigValue { field, reason, .. } => {
                format!("Invalid {}: {}", field, reason)
            }
            QuoteError::Config { message } => message.clone(),
            QuoteError::QuoteFormat { field, quote } => format!(
                "The last quotation number in the ledger ({}) has an unreadable {}",
                quote, field
            ),
            QuoteError::Api(e) => format!("Could not reach Google APIs: {}", e),
            QuoteError::Service {
                service, status, ..
            } => format!("{} rejected the request (HTTP {})", service, status),
            QuoteError::Auth { message } => format!("Google authorization failed: {}", message),
            QuoteError::Io(e) => format!("Local file operation failed: {}", e),
            QuoteError::Serialization(e) => format!("Could not read or write JSON: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            QuoteError::MissingConfig { .. } | QuoteError::InvalidConfigValue { .. } => {
                "Check the command line flags and --data values, then run again"
            }
            QuoteError::Config { .. } => "Check the configuration file and command line flags",
            QuoteError::QuoteFormat { .. } => {
                "Fix the last value in the 'Quotation #' column of the ledger so it reads ACYYMMSSS"
            }
            QuoteError::Api(_) => "Check the network connection and try again",
            QuoteError::Service { status, .. } if *status == 401 || *status == 403 => {
                "Delete the cached token file and authorize again"
            }
            QuoteError::Service { status, .. } if *status == 404 => {
                "Verify the folder, template, and spreadsheet ids"
            }
            QuoteError::Service { .. } => {
                "Inspect the ledger and Drive folder; a partial quotation may have been created"
            }
            QuoteError::Auth { .. } => {
                "Check credentials.json and delete the cached token file to re-authorize"
            }
            QuoteError::Io(_) => "Check that the output directory is writable",
            QuoteError::Serialization(_) => "Check that the credentials and token files are valid JSON",
        }
    }
}

pub type Result<T> = std::result::Result<T, QuoteError>;
