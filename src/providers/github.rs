use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{ImportWindow, Provider};
use crate::model::issue::{epoch_millis, IssueRecord, IssueState};
use crate::teams::TeamClassifier;

const SEARCH_URL: &str = "https://api.github.com/search/issues";
const PER_PAGE: usize = 100;
/// The search API never returns more than 1000 results for one query.
const MAX_PAGES: usize = 10;
/// Placeholder written to the team cell when no label maps to a team.
const NO_TEAM: &str = "---";

/// A GitHub repository to import and how to classify its labels.
pub struct GitHubRepo {
    pub repo: &'static str,
    /// Extra search qualifiers, e.g. `label:che`.
    pub filter: &'static str,
    pub classifier: TeamClassifier,
}

pub struct GitHubProvider {
    repo: GitHubRepo,
    name: String,
    token: String,
    window: ImportWindow,
    client: reqwest::Client,
}

impl GitHubProvider {
    pub fn new(repo: GitHubRepo, token: String, window: ImportWindow) -> Self {
        Self {
            name: format!("GitHub {}", repo.repo),
            repo,
            token,
            window,
            client: reqwest::Client::new(),
        }
    }

    pub fn query(&self) -> String {
        let mut query = match self.window {
            ImportWindow::Initial => format!("repo:{} is:issue state:open", self.repo.repo),
            ImportWindow::UpdatedSince(day) => format!(
                "repo:{} updated:>={} is:issue",
                self.repo.repo,
                day.format("%Y-%m-%d")
            ),
        };
        if !self.repo.filter.is_empty() {
            query.push(' ');
            query.push_str(self.repo.filter);
        }
        query
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    total_count: usize,
    items: Vec<GhIssue>,
}

#[derive(Deserialize)]
pub(crate) struct GhIssue {
    pub(crate) title: String,
    pub(crate) html_url: String,
    pub(crate) state: String,
    #[serde(default)]
    pub(crate) labels: Vec<GhLabel>,
    pub(crate) assignee: Option<GhUser>,
    pub(crate) milestone: Option<GhMilestone>,
    pub(crate) created_at: Option<String>,
    pub(crate) updated_at: Option<String>,
    pub(crate) closed_at: Option<String>,
    pub(crate) pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub(crate) struct GhLabel {
    pub(crate) name: String,
}

#[derive(Deserialize)]
pub(crate) struct GhUser {
    pub(crate) login: String,
}

#[derive(Deserialize)]
pub(crate) struct GhMilestone {
    pub(crate) title: String,
}

/// First label under `prefix/`, with the prefix stripped.
fn first_with_prefix(labels: &[String], prefix: &str) -> String {
    let prefix = format!("{prefix}/");
    labels
        .iter()
        .find_map(|label| label.strip_prefix(&prefix))
        .unwrap_or_default()
        .to_string()
}

/// Normalize a search hit. Pull requests and questions are not tracked.
pub(crate) fn normalize(issue: GhIssue, classifier: &TeamClassifier) -> Option<IssueRecord> {
    if issue.pull_request.is_some() {
        return None;
    }
    let labels: Vec<String> = issue.labels.into_iter().map(|l| l.name).collect();
    if labels.iter().any(|l| l == "kind/question") {
        return None;
    }

    let team = classifier
        .classify(&labels, &labels)
        .unwrap_or_else(|| NO_TEAM.to_string());
    let state = if issue.state == "open" {
        IssueState::Open
    } else {
        IssueState::Closed
    };

    Some(IssueRecord {
        kind: first_with_prefix(&labels, "kind"),
        severity: first_with_prefix(&labels, "severity"),
        status: first_with_prefix(&labels, "status"),
        team,
        title: issue.title,
        url: issue.html_url,
        state,
        assignee: issue.assignee.map(|a| a.login).unwrap_or_default(),
        milestone: issue.milestone.map(|m| m.title).unwrap_or_default(),
        created: epoch_millis(issue.created_at.as_deref()),
        updated: epoch_millis(issue.updated_at.as_deref()),
        closed: epoch_millis(issue.closed_at.as_deref()),
        labels,
    })
}

#[async_trait]
impl Provider for GitHubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_issues(&self) -> Result<Vec<IssueRecord>> {
        let query = self.query();
        let mut raw: Vec<GhIssue> = Vec::new();

        for page in 1..=MAX_PAGES {
            let url = format!(
                "{SEARCH_URL}?q={}&sort=updated&order=asc&per_page={PER_PAGE}&page={page}",
                urlencoding::encode(&query)
            );
            debug!(query = %query, page, "searching GitHub issues");

            let resp = self
                .client
                .get(&url)
                .header("Authorization", format!("token {}", self.token))
                .header("Accept", "application/vnd.github+json")
                .header("User-Agent", "backlog-sync")
                .send()
                .await
                .context("GitHub API request failed")?
                .error_for_status()
                .context("GitHub search was rejected")?;

            let search: SearchResponse = resp
                .json()
                .await
                .context("Failed to parse GitHub response")?;

            let count = search.items.len();
            raw.extend(search.items);
            if count < PER_PAGE || raw.len() >= search.total_count {
                break;
            }
        }

        Ok(raw
            .into_iter()
            .filter_map(|issue| normalize(issue, &self.repo.classifier))
            .collect())
    }
}
