use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }

    /// Anything that is not literally `closed` counts as open, so rows with a
    /// blank state cell are still picked up by the team views.
    pub fn from_cell(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("closed") {
            IssueState::Closed
        } else {
            IssueState::Open
        }
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single issue after normalization, whatever tracker it came from.
///
/// Timestamps are epoch milliseconds rendered as decimal strings, which is
/// what ends up in the sheet. `closed` stays empty until the issue is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub title: String,
    /// Human URL of the issue; the join key against the master sheet.
    pub url: String,
    pub state: IssueState,
    pub labels: Vec<String>,
    pub assignee: String,
    pub milestone: String,
    pub created: String,
    pub updated: String,
    pub closed: String,
    pub kind: String,
    pub severity: String,
    pub status: String,
    pub team: String,
}

impl IssueRecord {
    pub fn is_epic(&self) -> bool {
        self.kind.eq_ignore_ascii_case("epic")
    }

    /// Labels as stored in the master sheet: one per line.
    pub fn labels_cell(&self) -> String {
        self.labels.join("\n")
    }
}

/// Convert an RFC 3339 timestamp to the epoch-millis string stored in the sheet.
/// Unparseable or missing values become an empty cell.
pub fn epoch_millis(timestamp: Option<&str>) -> String {
    timestamp
        .and_then(|t| chrono::DateTime::parse_from_rfc3339(t).ok())
        .or_else(|| {
            // Jira uses `2021-03-04T10:11:12.000+0000`, without the colon in the offset.
            timestamp.and_then(|t| chrono::DateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S%.f%z").ok())
        })
        .map(|dt| dt.timestamp_millis().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_from_cell_is_lenient() {
        assert_eq!(IssueState::from_cell("closed"), IssueState::Closed);
        assert_eq!(IssueState::from_cell(" Closed "), IssueState::Closed);
        assert_eq!(IssueState::from_cell("open"), IssueState::Open);
        assert_eq!(IssueState::from_cell(""), IssueState::Open);
    }

    #[test]
    fn epoch_millis_parses_github_timestamps() {
        assert_eq!(epoch_millis(Some("2020-01-01T00:00:00Z")), "1577836800000");
    }

    #[test]
    fn epoch_millis_parses_jira_timestamps() {
        assert_eq!(
            epoch_millis(Some("2020-01-01T01:00:00.000+0100")),
            "1577836800000"
        );
    }

    #[test]
    fn epoch_millis_tolerates_garbage() {
        assert_eq!(epoch_millis(None), "");
        assert_eq!(epoch_millis(Some("yesterday")), "");
    }
}
