//! One full sync run: imports into the master sheet, then the per-team
//! backlogs and prioritized views derived from it.

use std::future::Future;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{error, info};

use crate::backlog::generate_team_backlog;
use crate::config::AppConfig;
use crate::model::row::{BacklogColumn, BacklogRow};
use crate::priority::generate_prioritized_view;
use crate::providers::Provider;
use crate::reconcile::sync_issues;
use crate::sheets::codec::RowCodec;
use crate::sheets::dropdown::DropDowns;
use crate::sheets::validation::update_master_validation;
use crate::sheets::SheetStore;
use crate::versions::{resolve_sprints, VersionOracle};

pub const MASTER_SHEET: &str = "backlog";
pub const MASTER_RANGE: &str = "backlog!A1:AZ";

/// Which parts of the pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stages {
    pub import: bool,
    pub teams: bool,
    pub prio: bool,
}

impl Default for Stages {
    fn default() -> Self {
        Self {
            import: true,
            teams: true,
            prio: true,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub fetched: usize,
    pub updated: usize,
    pub inserted: usize,
    pub teams: usize,
    pub views: usize,
}

pub async fn load_master(store: &dyn SheetStore) -> Result<Vec<BacklogRow>> {
    let rows = store
        .get_range(MASTER_RANGE)
        .await
        .context("Failed to read the master backlog")?;
    let Some((header, body)) = rows.split_first() else {
        return Ok(Vec::new());
    };
    let codec = RowCodec::<BacklogColumn>::new(header);
    Ok(body.iter().map(|cells| codec.decode(cells)).collect())
}

/// Await every team, log each failure, and return the first one.
async fn settle<'a, T, F>(stage: &str, tasks: Vec<(&'a str, F)>) -> Result<Vec<T>>
where
    F: Future<Output = Result<T>>,
{
    let (teams, futures): (Vec<&str>, Vec<F>) = tasks.into_iter().unzip();
    let mut first_error = None;
    let mut done = Vec::with_capacity(teams.len());
    for (team, result) in teams.into_iter().zip(join_all(futures).await) {
        match result {
            Ok(value) => done.push(value),
            Err(e) => {
                let message = format!("{e:#}");
                error!(stage, team, error = %message, "team failed");
                if first_error.is_none() {
                    first_error = Some(e.context(format!("{stage} failed for team {team}")));
                }
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(done),
    }
}

pub async fn run_sync(
    store: &dyn SheetStore,
    providers: &[Box<dyn Provider>],
    oracles: &[Box<dyn VersionOracle>],
    config: &AppConfig,
    stages: Stages,
    now: DateTime<Utc>,
) -> Result<SyncSummary> {
    let mut summary = SyncSummary::default();
    let dropdowns = DropDowns::load(store, &config.dropdown_sheet)
        .await
        .context("Failed to load drop-down lists")?;

    if stages.import {
        for provider in providers {
            let issues = provider
                .fetch_issues()
                .await
                .with_context(|| format!("Import from {} failed", provider.name()))?;
            info!(source = provider.name(), issues = issues.len(), "fetched issues");
            let plan = sync_issues(store, MASTER_SHEET, MASTER_RANGE, &issues).await?;
            summary.fetched += issues.len();
            summary.updated += plan.updates.len();
            summary.inserted += plan.inserts.len();
        }
        update_master_validation(store, MASTER_SHEET, &dropdowns).await?;
    }

    if !stages.teams && !stages.prio {
        return Ok(summary);
    }

    let master = load_master(store).await?;
    info!(rows = master.len(), "master backlog loaded");

    if stages.teams {
        let tasks = config
            .teams
            .iter()
            .map(|(team, sheet_id)| {
                (
                    team.as_str(),
                    generate_team_backlog(store, &master, team, *sheet_id, &dropdowns),
                )
            })
            .collect();
        summary.teams = settle("team backlog", tasks).await?.len();
    }

    if stages.prio && !config.prio.is_empty() {
        let sprints = resolve_sprints(oracles).await;
        let tasks = config
            .prio
            .iter()
            .map(|(team, sheet_id)| {
                (
                    team.as_str(),
                    generate_prioritized_view(store, &master, team, *sheet_id, &sprints, now),
                )
            })
            .collect();
        summary.views = settle("prioritized view", tasks).await?.len();
    }

    Ok(summary)
}
