use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use super::{ImportWindow, Provider};
use crate::model::issue::{epoch_millis, IssueRecord, IssueState};
use crate::teams::TeamClassifier;

const PAGE_SIZE: usize = 50;
const FIELDS: &str =
    "summary,issuetype,status,assignee,fixVersions,priority,components,labels,created,updated,resolutiondate";

/// A Jira project import: its queries and the component every issue of the
/// project is tagged with before team classification.
pub struct JiraProject {
    pub key: &'static str,
    pub updated_jql: &'static str,
    pub initial_jql: &'static str,
    pub component: Option<&'static str>,
}

pub static PROJECTS: &[JiraProject] = &[
    JiraProject {
        key: "CRW",
        updated_jql: "project=CRW AND updated>=-1D",
        initial_jql: "project=CRW AND status not in (closed, resolved)",
        component: None,
    },
    JiraProject {
        key: "CRT",
        updated_jql: "project = CRT and labels in ('cheteam') and labels not in ('WIP') AND updated>=-1D",
        initial_jql: "project = CRT and labels in ('cheteam') and labels not in ('WIP') AND status not in (closed, resolved)",
        component: Some("area/hosted-che"),
    },
    JiraProject {
        key: "WTO",
        updated_jql: "project = WTO AND updated>=-1D",
        initial_jql: "project = WTO AND status not in (closed, resolved)",
        component: Some("area/cloudshell"),
    },
    JiraProject {
        key: "RHDEVDOCS",
        updated_jql: "project = RHDEVDOCS AND (component = 'Eclipse Che' OR component = 'CodeReady Workspaces') AND updated>=-1D",
        initial_jql: "project = RHDEVDOCS AND (component = 'Eclipse Che' OR component = 'CodeReady Workspaces') AND status not in (closed, resolved)",
        component: Some("area/doc"),
    },
];

/// `Authorization` header value. With an email the token is an API token;
/// without one it is taken to be an already encoded basic credential.
pub fn basic_auth(email: Option<&str>, token: &str) -> String {
    match email {
        Some(email) => {
            let creds = format!("{email}:{token}");
            let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
            format!("Basic {encoded}")
        }
        None => format!("Basic {token}"),
    }
}

pub struct JiraProvider {
    base_url: String,
    auth_header: String,
    project: &'static JiraProject,
    name: String,
    window: ImportWindow,
    classifier: TeamClassifier,
    client: reqwest::Client,
}

impl JiraProvider {
    pub fn new(
        host: &str,
        auth_header: String,
        project: &'static JiraProject,
        window: ImportWindow,
    ) -> Self {
        Self {
            base_url: format!("https://{host}"),
            auth_header,
            project,
            name: format!("Jira {}", project.key),
            window,
            classifier: TeamClassifier::jira(),
            client: reqwest::Client::new(),
        }
    }

    fn jql(&self) -> &'static str {
        match self.window {
            ImportWindow::Initial => self.project.initial_jql,
            ImportWindow::UpdatedSince(_) => self.project.updated_jql,
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    total: usize,
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Deserialize)]
pub(crate) struct JiraIssue {
    pub(crate) key: String,
    pub(crate) fields: IssueFields,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IssueFields {
    pub(crate) summary: Option<String>,
    pub(crate) issuetype: Option<Named>,
    pub(crate) status: Option<Named>,
    pub(crate) assignee: Option<Named>,
    pub(crate) priority: Option<Named>,
    #[serde(default)]
    pub(crate) fix_versions: Vec<Named>,
    #[serde(default)]
    pub(crate) components: Vec<Named>,
    #[serde(default)]
    pub(crate) labels: Vec<String>,
    pub(crate) created: Option<String>,
    pub(crate) updated: Option<String>,
    pub(crate) resolutiondate: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct Named {
    #[serde(default)]
    pub(crate) name: String,
}

fn lowercase_name(field: Option<&Named>) -> String {
    field.map(|f| f.name.to_lowercase()).unwrap_or_default()
}

pub(crate) fn normalize(
    issue: JiraIssue,
    base_url: &str,
    injected_component: Option<&str>,
    classifier: &TeamClassifier,
) -> IssueRecord {
    let fields = issue.fields;

    let mut components: Vec<String> = fields
        .components
        .into_iter()
        .map(|c| c.name)
        .filter(|name| !name.is_empty())
        .collect();
    if let Some(component) = injected_component {
        components.push(component.to_string());
    }
    let no_team_labels: &[String] = &[];
    let team = classifier
        .classify(no_team_labels, &components)
        .unwrap_or_default();

    let status = lowercase_name(fields.status.as_ref());
    let state = if status == "closed" || status == "resolved" {
        IssueState::Closed
    } else {
        IssueState::Open
    };

    IssueRecord {
        title: fields.summary.unwrap_or_default(),
        url: format!("{base_url}/browse/{}", issue.key),
        state,
        labels: fields.labels,
        assignee: lowercase_name(fields.assignee.as_ref()),
        milestone: fields
            .fix_versions
            .into_iter()
            .map(|v| v.name)
            .collect::<Vec<_>>()
            .join(","),
        created: epoch_millis(fields.created.as_deref()),
        updated: epoch_millis(fields.updated.as_deref()),
        closed: epoch_millis(fields.resolutiondate.as_deref()),
        kind: lowercase_name(fields.issuetype.as_ref()),
        severity: fields.priority.map(|p| p.name).unwrap_or_default(),
        status,
        team,
    }
}

#[async_trait]
impl Provider for JiraProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_issues(&self) -> Result<Vec<IssueRecord>> {
        let jql = self.jql();
        let mut raw: Vec<JiraIssue> = Vec::new();
        let mut start_at = 0;

        loop {
            let url = format!(
                "{}/rest/api/2/search?jql={}&startAt={start_at}&maxResults={PAGE_SIZE}&fields={FIELDS}",
                self.base_url,
                urlencoding::encode(jql)
            );
            debug!(project = self.project.key, start_at, "searching Jira issues");

            let resp = self
                .client
                .get(&url)
                .header("Authorization", &self.auth_header)
                .header("Accept", "application/json")
                .send()
                .await
                .context("Jira API request failed")?
                .error_for_status()
                .context("Jira search was rejected")?;

            let search: SearchResponse =
                resp.json().await.context("Failed to parse Jira response")?;

            let count = search.issues.len();
            raw.extend(search.issues);
            start_at += count;
            if count == 0 || start_at >= search.total {
                break;
            }
        }

        Ok(raw
            .into_iter()
            .map(|issue| normalize(issue, &self.base_url, self.project.component, &self.classifier))
            .collect())
    }
}
