use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::teams::tables::TEAM_BACKLOG_SHEETS;

pub const GITHUB_TOKEN_ENV: &str = "HUBOT_GITHUB_TOKEN";
pub const JIRA_TOKEN_ENV: &str = "REDHAT_JIRA_TOKEN";

const DEFAULT_SPREADSHEET_ID: &str = "1GX_KLUFmgzweqjUckXaNOTK7WZrScyv8UHoVw8tgeas";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub spreadsheet_id: String,
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    /// Sheet holding the drop-down value lists.
    pub dropdown_sheet: String,
    pub github: GitHubConfig,
    pub jira: JiraConfig,
    /// Team name → numeric id of its `<team>-backlog` sheet.
    pub teams: BTreeMap<String, i64>,
    /// Team name → numeric id of its `<team>-prio` sheet.
    pub prio: BTreeMap<String, i64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.into(),
            credentials_path: data_dir().join("credentials.json"),
            token_path: data_dir().join("token.json"),
            dropdown_sheet: "internal-dropdown".into(),
            github: GitHubConfig::default(),
            jira: JiraConfig::default(),
            teams: TEAM_BACKLOG_SHEETS
                .iter()
                .map(|(team, id)| (team.to_string(), *id))
                .collect(),
            prio: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Incremental imports look at issues updated in the last `since_days`.
    pub since_days: i64,
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            since_days: 4,
            token: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    pub host: String,
    /// When set, the token is an API token combined with this email for
    /// basic auth. Otherwise the token is already a base64 credential.
    pub email: Option<String>,
    pub token: Option<String>,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            host: "issues.redhat.com".into(),
            email: None,
            token: None,
        }
    }
}

/// Tracker credentials, resolved from the environment first and the config
/// file second.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub github_token: String,
    pub jira_token: String,
}

impl Secrets {
    pub fn resolve(config: &AppConfig) -> Result<Self> {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    pub fn resolve_with(config: &AppConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let github_token = env(GITHUB_TOKEN_ENV)
            .or_else(|| config.github.token.clone())
            .filter(|t| !t.is_empty());
        let Some(github_token) = github_token else {
            bail!("Unable to start as {GITHUB_TOKEN_ENV} is missing");
        };
        let jira_token = env(JIRA_TOKEN_ENV)
            .or_else(|| config.jira.token.clone())
            .filter(|t| !t.is_empty());
        let Some(jira_token) = jira_token else {
            bail!("Unable to start as {JIRA_TOKEN_ENV} is missing");
        };
        Ok(Self {
            github_token,
            jira_token,
        })
    }
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".backlog-sync")
}

fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

/// Load the config from `path`, or from `~/.backlog-sync/config.toml`.
/// A missing default file yields the built-in defaults; a missing explicit
/// file is an error.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = config_path();
            if !p.exists() {
                return Ok(AppConfig::default());
            }
            p
        }
    };
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_cover_all_team_sheets() {
        let config = AppConfig::default();
        assert_eq!(config.teams.len(), 11);
        assert_eq!(config.teams.get("plugins"), Some(&620995623));
        assert!(config.prio.is_empty());
        assert_eq!(config.github.since_days, 4);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
spreadsheet_id = "abc"

[github]
since_days = 10

[prio]
plugins = 1234
editors = 5678
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.spreadsheet_id, "abc");
        assert_eq!(config.github.since_days, 10);
        assert_eq!(config.jira.host, "issues.redhat.com");
        assert_eq!(config.prio.get("editors"), Some(&5678));
        assert_eq!(config.teams.len(), 11);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("nope.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "spreadsheet_id = ").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn secrets_prefer_environment() {
        let mut config = AppConfig::default();
        config.github.token = Some("from-file".into());
        config.jira.token = Some("jira-file".into());
        let secrets = Secrets::resolve_with(&config, |name| {
            (name == GITHUB_TOKEN_ENV).then(|| "from-env".to_string())
        })
        .unwrap();
        assert_eq!(secrets.github_token, "from-env");
        assert_eq!(secrets.jira_token, "jira-file");
    }

    #[test]
    fn missing_secrets_are_fatal() {
        let config = AppConfig::default();
        let err = Secrets::resolve_with(&config, |_| None).unwrap_err();
        assert!(err.to_string().contains(GITHUB_TOKEN_ENV));

        let err = Secrets::resolve_with(&config, |name| {
            (name == GITHUB_TOKEN_ENV).then(|| "t".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains(JIRA_TOKEN_ENV));
    }
}
