pub mod github;
pub mod jira;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::{AppConfig, Secrets};
use crate::model::issue::IssueRecord;
use crate::teams::TeamClassifier;

/// Which issues an import asks the tracker for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportWindow {
    /// Every open issue; used to seed an empty sheet.
    Initial,
    /// Issues updated on or after the given day.
    UpdatedSince(NaiveDate),
}

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;
    /// All issues matching the provider's query, across every result page.
    async fn fetch_issues(&self) -> Result<Vec<IssueRecord>>;
}


/// Providers in import order: GitHub repositories first, then Jira projects.
pub fn create_providers(
    config: &AppConfig,
    secrets: &Secrets,
    window: ImportWindow,
) -> Vec<Box<dyn Provider>> {
    let mut providers: Vec<Box<dyn Provider>> = Vec::new();

    providers.push(Box::new(github::GitHubProvider::new(
        github::GitHubRepo {
            repo: "eclipse/che",
            filter: "",
            classifier: TeamClassifier::che(),
        },
        secrets.github_token.clone(),
        window,
    )));
    providers.push(Box::new(github::GitHubProvider::new(
        github::GitHubRepo {
            repo: "eclipse-theia/theia",
            filter: "label:che",
            classifier: TeamClassifier::theia(),
        },
        secrets.github_token.clone(),
        window,
    )));

    let auth = jira::basic_auth(config.jira.email.as_deref(), &secrets.jira_token);
    for project in jira::PROJECTS {
        providers.push(Box::new(jira::JiraProvider::new(
            &config.jira.host,
            auth.clone(),
            project,
            window,
        )));
    }

    providers
}
