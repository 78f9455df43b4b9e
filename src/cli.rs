use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate, Utc};
use clap::Parser;
use tracing::info;

use crate::auth::Authentication;
use crate::config::{self, Secrets};
use crate::providers::{self, ImportWindow};
use crate::sheets::google::GoogleSheet;
use crate::sync::{self, Stages};
use crate::versions;

/// Sync GitHub and Jira issues into the team backlog spreadsheet.
#[derive(Parser, Debug)]
#[command(name = "backlog-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to ~/.backlog-sync/config.toml)
    #[arg(long, env = "BACKLOG_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Import every open issue instead of recently updated ones
    #[arg(long)]
    pub initial: bool,

    /// Days of GitHub updates to import (overrides the config)
    #[arg(long)]
    pub since_days: Option<i64>,

    /// Do not query the issue trackers
    #[arg(long)]
    pub skip_import: bool,

    /// Do not regenerate the <team>-backlog sheets
    #[arg(long)]
    pub skip_teams: bool,

    /// Do not regenerate the <team>-prio sheets
    #[arg(long)]
    pub skip_prio: bool,
}

impl Cli {
    pub fn stages(&self) -> Stages {
        Stages {
            import: !self.skip_import,
            teams: !self.skip_teams,
            prio: !self.skip_prio,
        }
    }

    /// Import window for a run on `today`.
    pub fn window(&self, today: NaiveDate, configured_days: i64) -> ImportWindow {
        if self.initial {
            ImportWindow::Initial
        } else {
            let days = self.since_days.unwrap_or(configured_days);
            ImportWindow::UpdatedSince(today - Duration::days(days))
        }
    }

    pub async fn run(self) -> Result<()> {
        let config = config::load_config(self.config.as_deref())?;
        let stages = self.stages();

        let providers = if stages.import {
            let secrets = Secrets::resolve(&config)?;
            let window = self.window(Local::now().date_naive(), config.github.since_days);
            info!(?window, "importing issues");
            providers::create_providers(&config, &secrets, window)
        } else {
            Vec::new()
        };

        let auth = Authentication::new(config.credentials_path.clone(), config.token_path.clone());
        let access_token = auth
            .access_token()
            .await
            .context("Unable to authorize against Google Sheets")?;
        let store = GoogleSheet::new(config.spreadsheet_id.clone(), access_token);
        let oracles = versions::create_oracles();

        let summary = sync::run_sync(&store, &providers, &oracles, &config, stages, Utc::now()).await?;
        info!(
            fetched = summary.fetched,
            updated = summary.updated,
            inserted = summary.inserted,
            teams = summary.teams,
            views = summary.views,
            "sync complete"
        );
        Ok(())
    }
}
