//! Data-validation requests for the master and team sheets.

use anyhow::Result;
use serde_json::{json, Value};
use tracing::debug;

use super::dropdown::DropDowns;
use super::SheetStore;

const MASTER_SHEET_ID: i64 = 0;
const MASTER_DROPDOWNS: &[&str] = &["sizing", "theme", "quarter", "status", "team"];
const MASTER_CHECKBOXES: &[&str] = &["Include", "Needed CRW", "QE Impact", "Doc Impact"];

fn exact_column(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h.eq_ignore_ascii_case(name))
}

fn grid_range(sheet_id: i64, column: usize, end_row: usize) -> Value {
    json!({
        "sheetId": sheet_id,
        "startRowIndex": 1,
        "endRowIndex": end_row,
        "startColumnIndex": column,
        "endColumnIndex": column + 1,
    })
}

/// Turn the cells of `column_name` below the header into checkboxes.
pub fn checkbox_request(sheet_id: i64, header: &[String], column_name: &str, end_row: usize) -> Option<Value> {
    let column = exact_column(header, column_name)?;
    Some(json!({
        "repeatCell": {
            "cell": { "dataValidation": { "condition": { "type": "BOOLEAN" } } },
            "range": grid_range(sheet_id, column, end_row),
            "fields": "dataValidation",
        }
    }))
}

/// Restrict the cells of `column_name` to the values of a drop-down list.
pub fn dropdown_request(
    sheet_id: i64,
    header: &[String],
    column_name: &str,
    end_row: usize,
    dropdowns: &DropDowns,
) -> Option<Value> {
    let column = exact_column(header, column_name)?;
    let range = dropdowns.range_for(column_name)?;
    Some(json!({
        "setDataValidation": {
            "range": grid_range(sheet_id, column, end_row),
            "rule": {
                "condition": {
                    "type": "ONE_OF_RANGE",
                    "values": [ { "userEnteredValue": range } ],
                },
                "showCustomUi": true,
            },
        }
    }))
}

async fn apply(store: &dyn SheetStore, sheet: &str, requests: Vec<Value>) -> Result<()> {
    debug!(sheet, requests = requests.len(), "applying validation");
    if requests.is_empty() {
        return Ok(());
    }
    store.batch_update(requests).await
}

pub async fn update_master_validation(
    store: &dyn SheetStore,
    sheet: &str,
    dropdowns: &DropDowns,
) -> Result<()> {
    let rows = store.get_range(&format!("{sheet}!A1:Z")).await?;
    let header = rows.first().cloned().unwrap_or_default();
    let end_row = rows.len();

    let requests = MASTER_DROPDOWNS
        .iter()
        .filter_map(|name| dropdown_request(MASTER_SHEET_ID, &header, name, end_row, dropdowns))
        .chain(
            MASTER_CHECKBOXES
                .iter()
                .filter_map(|name| checkbox_request(MASTER_SHEET_ID, &header, name, end_row)),
        )
        .collect();
    apply(store, sheet, requests).await
}

pub async fn update_team_validation(
    store: &dyn SheetStore,
    sheet: &str,
    sheet_id: i64,
    dropdowns: &DropDowns,
) -> Result<()> {
    let rows = store.get_range(&format!("{sheet}!A1:Z")).await?;
    let header = rows.first().cloned().unwrap_or_default();
    let end_row = rows.len();

    let requests = [
        dropdown_request(sheet_id, &header, "sprint", end_row, dropdowns),
        checkbox_request(sheet_id, &header, "Assignment", end_row),
    ]
    .into_iter()
    .flatten()
    .collect();
    apply(store, sheet, requests).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::memory::MemorySheet;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn checkbox_targets_the_named_column() {
        let h = header(&["Team", "Needed CRW", "Include"]);
        let request = checkbox_request(7, &h, "Include", 10).unwrap();
        let range = &request["repeatCell"]["range"];
        assert_eq!(range["sheetId"], 7);
        assert_eq!(range["startColumnIndex"], 2);
        assert_eq!(range["endColumnIndex"], 3);
        assert_eq!(range["startRowIndex"], 1);
        assert_eq!(range["endRowIndex"], 10);
        assert_eq!(
            request["repeatCell"]["cell"]["dataValidation"]["condition"]["type"],
            "BOOLEAN"
        );
    }

    #[test]
    fn unknown_columns_produce_no_request() {
        let h = header(&["Team"]);
        assert!(checkbox_request(0, &h, "Include", 10).is_none());
        let dropdowns = DropDowns::parse("dd", &[vec!["Team".to_string()], vec!["a".to_string()]]);
        assert!(dropdown_request(0, &h, "theme", 10, &dropdowns).is_none());
    }

    #[test]
    fn dropdown_needs_a_value_list() {
        let h = header(&["Team", "Status"]);
        let dropdowns = DropDowns::parse("dd", &[vec!["Status".to_string()], vec!["new".to_string()]]);
        let request = dropdown_request(0, &h, "status", 5, &dropdowns).unwrap();
        assert_eq!(
            request["setDataValidation"]["rule"]["condition"]["values"][0]["userEnteredValue"],
            "='dd'!A2:A2"
        );
        assert!(dropdown_request(0, &h, "team", 5, &dropdowns).is_none());
    }

    #[tokio::test]
    async fn team_validation_sets_assignment_checkboxes() {
        let store = MemorySheet::new().with_sheet(
            "plugins-backlog",
            &[&["Assignment", "Sprint", "Title"], &["TRUE", "", "x"]],
        );
        update_team_validation(&store, "plugins-backlog", 42, &DropDowns::default())
            .await
            .unwrap();
        let requests = store.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["repeatCell"]["range"]["sheetId"], 42);
        assert_eq!(requests[0]["repeatCell"]["range"]["endRowIndex"], 2);
    }
}
