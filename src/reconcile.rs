//! Matching incoming issues against the rows already in the master sheet.

use std::collections::HashMap;

use anyhow::Result;
use tracing::info;

use crate::model::issue::IssueRecord;
use crate::model::row::{BacklogColumn, BacklogRow};
use crate::sheets::codec::RowCodec;
use crate::sheets::range::row_range;
use crate::sheets::{SheetStore, ValueRange};

/// A row to rewrite in place. `row_number` is 1-based, the header being row 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowUpdate<R> {
    pub row_number: usize,
    pub row: R,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub updates: Vec<RowUpdate<BacklogRow>>,
    pub inserts: Vec<BacklogRow>,
}

/// Map each non-empty link to its 1-based row number. When a link appears
/// more than once the last row wins.
pub fn link_index<'a>(rows: &'a [Vec<String>], link_column: Option<usize>) -> HashMap<&'a str, usize> {
    let Some(col) = link_column else {
        return HashMap::new();
    };
    rows.iter()
        .enumerate()
        .skip(1)
        .filter_map(|(idx, row)| {
            row.get(col)
                .filter(|link| !link.is_empty())
                .map(|link| (link.as_str(), idx + 1))
        })
        .collect()
}

/// Overwrite every synced field of `row` from `issue`. `comments` and
/// `include` belong to the sheet's users and are left alone.
fn apply_issue(row: &mut BacklogRow, issue: &IssueRecord) {
    row.team = issue.team.clone();
    row.kind = issue.kind.clone();
    row.severity = issue.severity.clone();
    row.labels = issue.labels_cell();
    row.link = issue.url.clone();
    row.title = issue.title.clone();
    row.state = issue.state.to_string();
    row.milestone = issue.milestone.clone();
    row.status = issue.status.clone();
    row.assignee = issue.assignee.clone();
    row.created = issue.created.clone();
    row.updated = issue.updated.clone();
    row.closed = issue.closed.clone();
}

fn new_row(issue: &IssueRecord) -> BacklogRow {
    let mut row = BacklogRow {
        include: issue.is_epic(),
        ..Default::default()
    };
    apply_issue(&mut row, issue);
    row
}

/// Split `incoming` into in-place updates of known links and appended rows
/// for unknown ones, both in input order.
pub fn reconcile(
    incoming: &[IssueRecord],
    rows: &[Vec<String>],
    codec: &RowCodec<BacklogColumn>,
) -> Reconciliation {
    let known = link_index(rows, codec.index(BacklogColumn::Link));
    let mut updates = Vec::new();
    let mut inserts: Vec<BacklogRow> = Vec::new();
    let mut pending: HashMap<&str, usize> = HashMap::new();

    for issue in incoming {
        if let Some(&row_number) = known.get(issue.url.as_str()) {
            let mut row: BacklogRow = codec.decode(&rows[row_number - 1]);
            apply_issue(&mut row, issue);
            updates.push(RowUpdate { row_number, row });
        } else if let Some(&slot) = pending.get(issue.url.as_str()) {
            // Same issue twice in one batch: keep a single new row
            apply_issue(&mut inserts[slot], issue);
        } else {
            pending.insert(issue.url.as_str(), inserts.len());
            inserts.push(new_row(issue));
        }
    }

    Reconciliation { updates, inserts }
}

/// Reconcile `incoming` against the current content of `sheet` and write the
/// result: value updates first, appended rows second.
pub async fn sync_issues(
    store: &dyn SheetStore,
    sheet: &str,
    range: &str,
    incoming: &[IssueRecord],
) -> Result<Reconciliation> {
    let rows = store.get_range(range).await?;
    let header = rows.first().cloned().unwrap_or_default();
    let codec = RowCodec::new(&header);

    let plan = reconcile(incoming, &rows, &codec);
    info!(
        sheet,
        updated = plan.updates.len(),
        inserted = plan.inserts.len(),
        "reconciled issues"
    );

    if !plan.updates.is_empty() {
        let data = plan
            .updates
            .iter()
            .map(|u| ValueRange::row(row_range(sheet, u.row_number, codec.width()), codec.encode(&u.row)))
            .collect();
        store.batch_update_values(data).await?;
    }
    if !plan.inserts.is_empty() {
        let new_rows = plan.inserts.iter().map(|r| codec.encode(r)).collect();
        store.append_rows(sheet, new_rows).await?;
    }

    Ok(plan)
}
