//! OAuth2 access to the Sheets API for an installed application.
//!
//! The client secrets come from `credentials.json`. The user token is kept
//! in `token.json` next to it. A stored token is refreshed when it carries a
//! refresh token. Otherwise the interactive consent flow runs once on the
//! terminal and persists the result.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const OOB_REDIRECT: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Tokens expiring within this window are treated as expired.
const EXPIRY_MARGIN_MS: i64 = 60_000;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("credentials file not found at {0}")]
    MissingCredentials(PathBuf),
    #[error("token endpoint returned {status}: {body}")]
    TokenExchange {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("no authorization code entered")]
    MissingCode,
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: InstalledApp,
}

/// The `installed` section of a downloaded OAuth client.
#[derive(Debug, Clone, Deserialize)]
pub struct InstalledApp {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl InstalledApp {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AuthError::MissingCredentials(path.to_path_buf()).into());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: CredentialsFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(file.installed)
    }

    fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(OOB_REDIRECT)
    }

    fn token_url(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(TOKEN_URL)
    }

    /// URL the user opens to grant offline spreadsheet access.
    pub fn consent_url(&self) -> String {
        let params = [
            ("access_type", "offline"),
            ("scope", SHEETS_SCOPE),
            ("response_type", "code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri()),
        ];
        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect();
        format!("{AUTH_URL}?{}", query.join("&"))
    }
}

/// Contents of `token.json`. `expiry_date` is in epoch millis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl StoredToken {
    /// A token without an expiry date is assumed valid.
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        self.expiry_date
            .map_or(true, |expiry| expiry - EXPIRY_MARGIN_MS > now_ms)
    }

    fn from_response(response: TokenResponse, previous_refresh: Option<String>, now_ms: i64) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expiry_date: response.expires_in.map(|secs| now_ms + secs.saturating_mul(1000)),
            scope: response.scope,
            token_type: response.token_type,
        }
    }

    fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(token) => Some(token),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ignoring unreadable token file");
                None
            }
        }
    }

    fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
}

pub struct Authentication {
    credentials_path: PathBuf,
    token_path: PathBuf,
    client: reqwest::Client,
}

impl Authentication {
    pub fn new(credentials_path: PathBuf, token_path: PathBuf) -> Self {
        Self {
            credentials_path,
            token_path,
            client: reqwest::Client::new(),
        }
    }

    /// A valid access token, refreshing or prompting for consent as needed.
    pub async fn access_token(&self) -> Result<String> {
        let app = InstalledApp::load(&self.credentials_path)?;
        let now = Utc::now().timestamp_millis();

        if let Some(stored) = StoredToken::load(&self.token_path) {
            if stored.is_fresh(now) {
                return Ok(stored.access_token);
            }
            if let Some(refresh) = stored.refresh_token.clone() {
                debug!("refreshing stored access token");
                let token = self.refresh(&app, &refresh).await?;
                token.save(&self.token_path)?;
                return Ok(token.access_token);
            }
        }

        let token = self.consent(&app).await?;
        token.save(&self.token_path)?;
        info!(path = %self.token_path.display(), "token stored");
        Ok(token.access_token)
    }

    async fn refresh(&self, app: &InstalledApp, refresh_token: &str) -> Result<StoredToken> {
        let response = self
            .exchange(
                app,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                ],
            )
            .await?;
        Ok(StoredToken::from_response(
            response,
            Some(refresh_token.to_string()),
            Utc::now().timestamp_millis(),
        ))
    }

    async fn consent(&self, app: &InstalledApp) -> Result<StoredToken> {
        eprintln!("Authorize this app by visiting this url: {}", app.consent_url());
        eprint!("Enter the code from that page here: ");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .context("Failed to read authorization code")?;
        let code = line.trim();
        if code.is_empty() {
            return Err(AuthError::MissingCode.into());
        }

        let response = self
            .exchange(
                app,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", app.redirect_uri()),
                ],
            )
            .await?;
        Ok(StoredToken::from_response(
            response,
            None,
            Utc::now().timestamp_millis(),
        ))
    }

    async fn exchange(&self, app: &InstalledApp, grant: &[(&str, &str)]) -> Result<TokenResponse> {
        let mut form: Vec<(&str, &str)> = vec![
            ("client_id", app.client_id.as_str()),
            ("client_secret", app.client_secret.as_str()),
        ];
        form.extend_from_slice(grant);

        let resp = self
            .client
            .post(app.token_url())
            .form(&form)
            .send()
            .await
            .context("Token request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchange { status, body }.into());
        }

        resp.json()
            .await
            .context("Failed to parse token response")
    }
}
