//! Per-team backlog sheets derived from the master sheet.

use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::info;

use crate::model::row::{BacklogRow, TeamBacklogColumn, TeamBacklogRow};
use crate::reconcile::{link_index, RowUpdate};
use crate::sheets::codec::RowCodec;
use crate::sheets::dropdown::DropDowns;
use crate::sheets::range::{cell_range, row_range, sheet_range};
use crate::sheets::validation::update_team_validation;
use crate::sheets::{SheetStore, ValueRange};

pub fn backlog_sheet_name(team: &str) -> String {
    format!("{team}-backlog")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamPlan {
    /// Rows whose issue left the team; only their assignment cell changes.
    pub unassigned: Vec<usize>,
    pub updates: Vec<RowUpdate<TeamBacklogRow>>,
    pub inserts: Vec<TeamBacklogRow>,
}

fn refresh(row: &mut TeamBacklogRow, source: &BacklogRow, priority: String) {
    row.assignment = true;
    row.priority = priority;
    row.severity = source.severity.clone();
    row.title = source.title.clone();
    row.kind = source.kind.clone();
    row.milestone = source.milestone.clone();
    row.other_team = source.team.clone();
    row.state = source.state.clone();
    row.status = source.status.clone();
    row.areas = source.areas("\n");
    row.assignee = source.assignee.clone();
}

/// Compute the changes bringing `team_rows` (the team sheet, header first) in
/// line with the team's share of `master`.
pub fn plan_team_backlog(
    team: &str,
    master: &[BacklogRow],
    team_rows: &[Vec<String>],
    codec: &RowCodec<TeamBacklogColumn>,
) -> TeamPlan {
    // Rows without a link cannot be matched against the team sheet later.
    let members: Vec<&BacklogRow> = master
        .iter()
        .filter(|row| !row.link.is_empty() && row.belongs_to(team))
        .collect();
    let member_links: HashSet<&str> = members.iter().map(|row| row.link.as_str()).collect();

    let link_column = codec.index(TeamBacklogColumn::Link);
    let existing = link_index(team_rows, link_column);

    let mut plan = TeamPlan::default();

    for (idx, cells) in team_rows.iter().enumerate().skip(1) {
        let link = codec.get(cells, TeamBacklogColumn::Link);
        if !link.is_empty() && !member_links.contains(link) {
            plan.unassigned.push(idx + 1);
        }
    }

    let mut rank = 0;
    for source in members {
        let priority = if source.include {
            rank += 1;
            rank.to_string()
        } else {
            String::new()
        };

        if let Some(&row_number) = existing.get(source.link.as_str()) {
            let mut row: TeamBacklogRow = codec.decode(&team_rows[row_number - 1]);
            refresh(&mut row, source, priority);
            plan.updates.push(RowUpdate { row_number, row });
        } else if !source.is_closed() {
            let mut row = TeamBacklogRow {
                link: source.link.clone(),
                ..Default::default()
            };
            refresh(&mut row, source, priority);
            plan.inserts.push(row);
        }
    }

    plan
}

/// Sync one team's backlog sheet from the already loaded master rows.
pub async fn generate_team_backlog(
    store: &dyn SheetStore,
    master: &[BacklogRow],
    team: &str,
    sheet_id: i64,
    dropdowns: &DropDowns,
) -> Result<TeamPlan> {
    let sheet = backlog_sheet_name(team);
    let team_rows = store
        .get_range(&sheet_range(&sheet, "Z"))
        .await
        .with_context(|| format!("Failed to read {sheet}"))?;
    let header = team_rows.first().cloned().unwrap_or_default();
    let codec = RowCodec::new(&header);

    let plan = plan_team_backlog(team, master, &team_rows, &codec);
    info!(
        team,
        unassigned = plan.unassigned.len(),
        updated = plan.updates.len(),
        inserted = plan.inserts.len(),
        "team backlog planned"
    );

    let mut data: Vec<ValueRange> = Vec::new();
    if let Some(col) = codec.index(TeamBacklogColumn::Assignment) {
        data.extend(
            plan.unassigned
                .iter()
                .map(|n| ValueRange::row(cell_range(&sheet, col, *n), vec![Some("FALSE".into())])),
        );
    }
    data.extend(
        plan.updates
            .iter()
            .map(|u| ValueRange::row(row_range(&sheet, u.row_number, codec.width()), codec.encode(&u.row))),
    );
    if !data.is_empty() {
        store.batch_update_values(data).await?;
    }
    if !plan.inserts.is_empty() {
        let rows = plan.inserts.iter().map(|r| codec.encode(r)).collect();
        store.append_rows(&sheet, rows).await?;
    }

    update_team_validation(store, &sheet, sheet_id, dropdowns).await?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::memory::MemorySheet;

    const TEAM_HEADER: &[&str] = &[
        "Assignment", "Sprint", "Priority Order", "Severity", "Title", "Kind", "Link",
        "Comments", "Milestone", "Other Team", "State", "Status", "Areas", "Assignee",
    ];

    fn master_row(link: &str, team: &str, include: bool, state: &str) -> BacklogRow {
        BacklogRow {
            team: team.into(),
            title: format!("Issue {link}"),
            link: link.into(),
            state: state.into(),
            severity: "P2".into(),
            kind: "bug".into(),
            labels: "area/plugins,kind/bug\narea/git".into(),
            milestone: "7.42".into(),
            include,
            ..Default::default()
        }
    }

    fn team_sheet(rows: &[&[&str]]) -> Vec<Vec<String>> {
        std::iter::once(TEAM_HEADER)
            .chain(rows.iter().copied())
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn codec() -> RowCodec<TeamBacklogColumn> {
        let header: Vec<String> = TEAM_HEADER.iter().map(|s| s.to_string()).collect();
        RowCodec::new(&header)
    }

    #[test]
    fn new_members_are_inserted_with_priority() {
        let master = vec![
            master_row("A", "plugins", true, "open"),
            master_row("B", "editors", true, "open"),
            master_row("C", "plugins,editors", false, "open"),
            master_row("D", "plugins", true, "open"),
        ];
        let plan = plan_team_backlog("plugins", &master, &team_sheet(&[]), &codec());

        let links: Vec<&str> = plan.inserts.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(links, vec!["A", "C", "D"]);
        let priorities: Vec<&str> = plan.inserts.iter().map(|r| r.priority.as_str()).collect();
        assert_eq!(priorities, vec!["1", "", "2"]);
        assert!(plan.inserts.iter().all(|r| r.assignment));
        assert_eq!(plan.inserts[0].areas, "git\nplugins");
        assert_eq!(plan.inserts[1].other_team, "plugins,editors");
    }

    #[test]
    fn closed_issues_are_not_added_but_are_updated() {
        let master = vec![
            master_row("A", "plugins", false, "closed"),
            master_row("B", "plugins", false, "closed"),
        ];
        let rows = team_sheet(&[&["TRUE", "Sprint 1", "", "", "old", "", "B", "my note"]]);
        let plan = plan_team_backlog("plugins", &master, &rows, &codec());

        assert!(plan.inserts.is_empty());
        assert_eq!(plan.updates.len(), 1);
        let update = &plan.updates[0];
        assert_eq!(update.row_number, 2);
        assert_eq!(update.row.state, "closed");
        assert_eq!(update.row.title, "Issue B");
        assert_eq!(update.row.comments, "my note");
        assert_eq!(update.row.sprint, "Sprint 1");
    }

    #[test]
    fn rows_that_left_the_team_are_unassigned() {
        let master = vec![
            master_row("A", "editors", false, "open"),
            master_row("B", "plugins", false, "open"),
        ];
        let rows = team_sheet(&[
            &["TRUE", "", "", "", "", "", "A"],
            &["TRUE", "", "", "", "", "", "B"],
            &["FALSE", "", "", "", "", "", "Gone"],
            &["TRUE"],
        ]);
        let plan = plan_team_backlog("plugins", &master, &rows, &codec());
        assert_eq!(plan.unassigned, vec![2, 4]);
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].row_number, 3);
    }

    #[test]
    fn blank_assignment_of_departed_row_is_unchecked() {
        let master = vec![master_row("A", "plugins", false, "open")];
        let rows = team_sheet(&[&["", "", "", "", "", "", "Gone"]]);
        let plan = plan_team_backlog("plugins", &master, &rows, &codec());
        assert_eq!(plan.unassigned, vec![2]);
    }

    #[tokio::test]
    async fn rows_without_link_are_not_copied_to_team_sheet() {
        let store = MemorySheet::new().with_sheet("plugins-backlog", &[TEAM_HEADER]);
        let master = vec![
            master_row("", "plugins", true, "open"),
            master_row("A", "plugins", true, "open"),
        ];

        for _ in 0..3 {
            let plan = generate_team_backlog(&store, &master, "plugins", 620995623, &DropDowns::default())
                .await
                .unwrap();
            assert!(plan.inserts.iter().all(|r| !r.link.is_empty()));
        }

        let rows = store.rows("plugins-backlog");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][6], "A");
        assert_eq!(rows[1][2], "1");
    }

    #[test]
    fn returning_issue_is_reassigned() {
        let master = vec![master_row("A", "plugins", false, "open")];
        let rows = team_sheet(&[&["FALSE", "", "", "", "", "", "A"]]);
        let plan = plan_team_backlog("plugins", &master, &rows, &codec());
        assert!(plan.unassigned.is_empty());
        assert!(plan.updates[0].row.assignment);
    }

    #[test]
    fn team_match_is_by_substring() {
        let master = vec![master_row("A", "documentation", false, "open")];
        let plan = plan_team_backlog("doc", &master, &team_sheet(&[]), &codec());
        assert_eq!(plan.inserts.len(), 1);
    }

    #[tokio::test]
    async fn generate_writes_team_sheet() {
        let store = MemorySheet::new().with_sheet(
            "plugins-backlog",
            &[
                TEAM_HEADER,
                &["TRUE", "", "", "", "", "", "OLD", "keep"],
                &["TRUE", "", "", "", "", "", "A"],
            ],
        );
        let master = vec![
            master_row("A", "plugins", true, "open"),
            master_row("B", "plugins", false, "open"),
        ];

        let plan = generate_team_backlog(&store, &master, "plugins", 620995623, &DropDowns::default())
            .await
            .unwrap();
        assert_eq!(plan.unassigned, vec![2]);

        let rows = store.rows("plugins-backlog");
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1][0], "FALSE");
        assert_eq!(rows[1][7], "keep");
        assert_eq!(rows[2][0], "TRUE");
        assert_eq!(rows[2][2], "1");
        assert_eq!(rows[2][8], "'7.42");
        assert_eq!(rows[3][6], "B");

        let requests = store.requests.lock().unwrap();
        assert_eq!(requests[0]["repeatCell"]["range"]["sheetId"], 620995623);
    }
}
