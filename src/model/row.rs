use crate::model::issue::IssueState;
use crate::sheets::codec::{parse_bool, Column, SheetRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklogColumn {
    Include,
    Milestone,
    Team,
    Status,
    Kind,
    Severity,
    Title,
    Link,
    Comments,
    State,
    Labels,
    Assignee,
    Created,
    Updated,
    Closed,
}

impl Column for BacklogColumn {
    const ALL: &'static [Self] = &[
        BacklogColumn::Include,
        BacklogColumn::Milestone,
        BacklogColumn::Team,
        BacklogColumn::Status,
        BacklogColumn::Kind,
        BacklogColumn::Severity,
        BacklogColumn::Title,
        BacklogColumn::Link,
        BacklogColumn::Comments,
        BacklogColumn::State,
        BacklogColumn::Labels,
        BacklogColumn::Assignee,
        BacklogColumn::Created,
        BacklogColumn::Updated,
        BacklogColumn::Closed,
    ];

    fn key(self) -> &'static str {
        match self {
            BacklogColumn::Include => "Include",
            BacklogColumn::Milestone => "Milestone",
            BacklogColumn::Team => "Team",
            BacklogColumn::Status => "Status",
            BacklogColumn::Kind => "Kind",
            BacklogColumn::Severity => "Severity",
            BacklogColumn::Title => "Title",
            BacklogColumn::Link => "Link",
            BacklogColumn::Comments => "Comments",
            BacklogColumn::State => "State",
            BacklogColumn::Labels => "Labels",
            BacklogColumn::Assignee => "Assignee",
            BacklogColumn::Created => "Created",
            BacklogColumn::Updated => "Updated",
            BacklogColumn::Closed => "Closed",
        }
    }
}

/// One row of the master `backlog` sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BacklogRow {
    pub team: String,
    pub status: String,
    pub kind: String,
    pub severity: String,
    pub title: String,
    pub link: String,
    /// Free text maintained by hand; sync never overwrites it.
    pub comments: String,
    pub state: String,
    pub labels: String,
    pub milestone: String,
    pub assignee: String,
    pub created: String,
    pub updated: String,
    pub closed: String,
    /// Counts toward the committed scope of the cycle.
    pub include: bool,
}

impl BacklogRow {
    pub fn is_closed(&self) -> bool {
        IssueState::from_cell(&self.state) == IssueState::Closed
    }

    /// Substring membership, so `doc` also matches `documentation` and
    /// comma-joined multi-team values match each of their teams.
    pub fn belongs_to(&self, team: &str) -> bool {
        !self.team.is_empty() && self.team.contains(team)
    }

    /// Label lines of this row, accepting both comma and newline separators.
    pub fn label_list(&self) -> Vec<&str> {
        self.labels
            .split(',')
            .flat_map(|chunk| chunk.split('\n'))
            .collect()
    }

    /// Sorted `area/*` labels with the prefix stripped, joined by `separator`.
    pub fn areas(&self, separator: &str) -> String {
        let mut areas: Vec<&str> = self
            .label_list()
            .into_iter()
            .filter_map(|label| label.strip_prefix("area/"))
            .collect();
        areas.sort_unstable();
        areas.join(separator)
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.label_list().iter().any(|label| *label == name)
    }
}

impl SheetRow for BacklogRow {
    type Column = BacklogColumn;

    fn cell(&self, column: BacklogColumn) -> String {
        match column {
            BacklogColumn::Include => self.include.to_string(),
            BacklogColumn::Milestone => self.milestone.clone(),
            BacklogColumn::Team => self.team.clone(),
            BacklogColumn::Status => self.status.clone(),
            BacklogColumn::Kind => self.kind.clone(),
            BacklogColumn::Severity => self.severity.clone(),
            BacklogColumn::Title => self.title.clone(),
            BacklogColumn::Link => self.link.clone(),
            BacklogColumn::Comments => self.comments.clone(),
            BacklogColumn::State => self.state.clone(),
            BacklogColumn::Labels => self.labels.clone(),
            BacklogColumn::Assignee => self.assignee.clone(),
            BacklogColumn::Created => self.created.clone(),
            BacklogColumn::Updated => self.updated.clone(),
            BacklogColumn::Closed => self.closed.clone(),
        }
    }

    fn from_cells<F: Fn(BacklogColumn) -> String>(get: F) -> Self {
        Self {
            team: get(BacklogColumn::Team),
            status: get(BacklogColumn::Status),
            kind: get(BacklogColumn::Kind),
            severity: get(BacklogColumn::Severity),
            title: get(BacklogColumn::Title),
            link: get(BacklogColumn::Link),
            comments: get(BacklogColumn::Comments),
            state: get(BacklogColumn::State),
            labels: get(BacklogColumn::Labels),
            milestone: get(BacklogColumn::Milestone),
            assignee: get(BacklogColumn::Assignee),
            created: get(BacklogColumn::Created),
            updated: get(BacklogColumn::Updated),
            closed: get(BacklogColumn::Closed),
            include: parse_bool(&get(BacklogColumn::Include)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamBacklogColumn {
    Assignment,
    Sprint,
    Priority,
    Severity,
    Title,
    Kind,
    Link,
    Comments,
    Milestone,
    OtherTeam,
    State,
    Status,
    Areas,
    Assignee,
}

impl Column for TeamBacklogColumn {
    const ALL: &'static [Self] = &[
        TeamBacklogColumn::Assignment,
        TeamBacklogColumn::Sprint,
        TeamBacklogColumn::Priority,
        TeamBacklogColumn::Severity,
        TeamBacklogColumn::Title,
        TeamBacklogColumn::Kind,
        TeamBacklogColumn::Link,
        TeamBacklogColumn::Comments,
        TeamBacklogColumn::Milestone,
        TeamBacklogColumn::OtherTeam,
        TeamBacklogColumn::State,
        TeamBacklogColumn::Status,
        TeamBacklogColumn::Areas,
        TeamBacklogColumn::Assignee,
    ];

    fn key(self) -> &'static str {
        match self {
            TeamBacklogColumn::Assignment => "Assignment",
            TeamBacklogColumn::Sprint => "Sprint",
            TeamBacklogColumn::Priority => "Priority Order",
            TeamBacklogColumn::Severity => "Severity",
            TeamBacklogColumn::Title => "Title",
            TeamBacklogColumn::Kind => "Kind",
            TeamBacklogColumn::Link => "Link",
            TeamBacklogColumn::Comments => "Comments",
            TeamBacklogColumn::Milestone => "Milestone",
            TeamBacklogColumn::OtherTeam => "Other Team",
            TeamBacklogColumn::State => "State",
            TeamBacklogColumn::Status => "Status",
            TeamBacklogColumn::Areas => "Areas",
            TeamBacklogColumn::Assignee => "Assignee",
        }
    }
}

/// One row of a `<team>-backlog` sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamBacklogRow {
    pub assignment: bool,
    /// Picked by hand from the sprint drop-down; never written by sync.
    pub sprint: String,
    /// 1-based rank among the team's included issues, empty otherwise.
    pub priority: String,
    pub severity: String,
    pub title: String,
    pub kind: String,
    pub link: String,
    pub comments: String,
    pub milestone: String,
    /// Verbatim team cell of the master row.
    pub other_team: String,
    pub state: String,
    pub status: String,
    pub areas: String,
    pub assignee: String,
}

impl SheetRow for TeamBacklogRow {
    type Column = TeamBacklogColumn;

    fn cell(&self, column: TeamBacklogColumn) -> String {
        match column {
            TeamBacklogColumn::Assignment => self.assignment.to_string().to_uppercase(),
            TeamBacklogColumn::Sprint => self.sprint.clone(),
            TeamBacklogColumn::Priority => self.priority.clone(),
            TeamBacklogColumn::Severity => self.severity.clone(),
            TeamBacklogColumn::Title => self.title.clone(),
            TeamBacklogColumn::Kind => self.kind.clone(),
            TeamBacklogColumn::Link => self.link.clone(),
            TeamBacklogColumn::Comments => self.comments.clone(),
            // Leading quote keeps "7.40" from being read as the number 7.4
            TeamBacklogColumn::Milestone if self.milestone.is_empty() => String::new(),
            TeamBacklogColumn::Milestone => format!("'{}", self.milestone),
            TeamBacklogColumn::OtherTeam => self.other_team.clone(),
            TeamBacklogColumn::State => self.state.clone(),
            TeamBacklogColumn::Status => self.status.clone(),
            TeamBacklogColumn::Areas => self.areas.clone(),
            TeamBacklogColumn::Assignee => self.assignee.clone(),
        }
    }

    fn from_cells<F: Fn(TeamBacklogColumn) -> String>(get: F) -> Self {
        let milestone = get(TeamBacklogColumn::Milestone);
        Self {
            assignment: parse_bool(&get(TeamBacklogColumn::Assignment)),
            sprint: get(TeamBacklogColumn::Sprint),
            priority: get(TeamBacklogColumn::Priority),
            severity: get(TeamBacklogColumn::Severity),
            title: get(TeamBacklogColumn::Title),
            kind: get(TeamBacklogColumn::Kind),
            link: get(TeamBacklogColumn::Link),
            comments: get(TeamBacklogColumn::Comments),
            milestone: milestone
                .strip_prefix('\'')
                .unwrap_or(&milestone)
                .to_string(),
            other_team: get(TeamBacklogColumn::OtherTeam),
            state: get(TeamBacklogColumn::State),
            status: get(TeamBacklogColumn::Status),
            areas: get(TeamBacklogColumn::Areas),
            assignee: get(TeamBacklogColumn::Assignee),
        }
    }
}
