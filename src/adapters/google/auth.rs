//! OAuth 2.0 installed-application flow with a cached token file.

use crate::utils::error::{QuoteError, Result};
use chrono::{DateTime, Datelike, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_REDIRECT_URI: &str = "http://localhost";
const AUTH_STATE: &str = "state-token";
const EXPIRY_LEEWAY_SECS: i64 = 60;

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

/// OAuth client registration as downloaded from the Google Cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl ClientSecret {
    /// A missing or malformed file is a configuration error naming `--credentials`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let invalid = |reason: String| QuoteError::InvalidConfigValue {
            field: "--credentials".to_string(),
            value: path.as_ref().display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| invalid(format!("unable to read client secret file: {}", e)))?;
        Self::from_json(&content).map_err(|e| invalid(e.to_string()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(content)?;
        file.installed
            .or(file.web)
            .ok_or_else(|| QuoteError::Auth {
                message: "client secret file has neither an 'installed' nor a 'web' section"
                    .to_string(),
            })
    }

    fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REDIRECT_URI)
    }
}

/// Cached credential, compatible with the `token.json` written by other
/// Google client libraries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Token {
    /// Year 1 is the zero time some writers use for "never expires".
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        match self.expiry {
            None => true,
            Some(expiry) if expiry.year() <= 1 => true,
            Some(expiry) => expiry - Duration::seconds(EXPIRY_LEEWAY_SECS) > now,
        }
    }

    fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    fn into_token(self, now: DateTime<Utc>, previous_refresh: Option<&str>) -> Token {
        Token {
            access_token: self.access_token,
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            expiry: self.expires_in.map(|secs| now + Duration::seconds(secs)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Option<Token>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, token: &Token) -> Result<()> {
        tracing::info!("Saving credential file to: {}", self.path.display());
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        file.write_all(serde_json::to_string(token)?.as_bytes())?;
        Ok(())
    }
}

pub struct Authenticator {
    secret: ClientSecret,
    store: TokenStore,
    scopes: Vec<String>,
    http: Client,
}

impl Authenticator {
    pub fn new(secret: ClientSecret, store: TokenStore, scopes: &[&str]) -> Self {
        Self {
            secret,
            store,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            http: Client::new(),
        }
    }

    /// Cached token when still valid, refreshed token when possible,
    /// otherwise a fresh consent from the terminal.
    pub async fn access_token(&self) -> Result<String> {
        let now = Utc::now();
        if let Some(token) = self.cached_or_refreshed(now).await? {
            return Ok(token.access_token);
        }

        let code = self.prompt_for_code().await?;
        let token = self.exchange_code(&code, Utc::now()).await?;
        self.store.save(&token)?;
        Ok(token.access_token)
    }

    /// Token usable without user interaction, if any.
    pub async fn cached_or_refreshed(&self, now: DateTime<Utc>) -> Result<Option<Token>> {
        let Some(cached) = self.store.load()? else {
            return Ok(None);
        };
        if cached.is_valid_at(now) {
            tracing::debug!("Using cached OAuth token");
            return Ok(Some(cached));
        }
        if cached.refresh_token().is_none() {
            return Ok(None);
        }

        tracing::debug!("Refreshing expired OAuth token");
        let refreshed = self.refresh(&cached, now).await?;
        self.store.save(&refreshed)?;
        Ok(Some(refreshed))
    }

    pub fn authorization_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.secret.auth_uri).map_err(|e| QuoteError::Auth {
            message: format!("invalid auth_uri {}: {}", self.secret.auth_uri, e),
        })?;
        url.query_pairs_mut()
            .append_pair("access_type", "offline")
            .append_pair("client_id", &self.secret.client_id)
            .append_pair("redirect_uri", self.secret.redirect_uri())
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", AUTH_STATE);
        Ok(url)
    }

    pub async fn exchange_code(&self, code: &str, now: DateTime<Utc>) -> Result<Token> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("redirect_uri", self.secret.redirect_uri()),
        ];
        let response = self.token_request(&form).await?;
        Ok(response.into_token(now, None))
    }

    pub async fn refresh(&self, token: &Token, now: DateTime<Utc>) -> Result<Token> {
        let refresh_token = token.refresh_token().ok_or_else(|| QuoteError::Auth {
            message: "cached token has no refresh token".to_string(),
        })?;
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
        ];
        let response = self.token_request(&form).await?;
        Ok(response.into_token(now, Some(refresh_token)))
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.secret.token_uri)
            .form(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuoteError::Auth {
                message: format!("token endpoint returned {}: {}", status, body),
            });
        }
        Ok(response.json().await?)
    }

    async fn prompt_for_code(&self) -> Result<String> {
        let url = self.authorization_url()?;
        println!(
            "Go to the following link in your browser then type the authorization code: \n{}",
            url
        );

        let mut code = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut code)
            .await?;
        let code = code.trim().to_string();
        if code.is_empty() {
            return Err(QuoteError::Auth {
                message: "no authorization code entered".to_string(),
            });
        }
        Ok(code)
    }
}
