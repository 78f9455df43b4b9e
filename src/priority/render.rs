use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use super::{parse_millis, Bucket};
use crate::model::row::BacklogRow;
use crate::sheets::range::column_letter;
use crate::sheets::ValueRange;

/// Link, milestone, assignee, areas, status.
pub const VIEW_WIDTH: usize = 5;

/// Issues untouched for longer than this are flagged stale.
const STALE_DAYS: i64 = 150;

const NOTEWORTHY_LABEL: &str = "new&noteworthy";

const CHE_ISSUES: &str = "https://github.com/eclipse/che/issues/";
const THEIA_ISSUES: &str = "https://github.com/eclipse-theia/theia/issues/";
const JIRA_BROWSE: &str = "https://issues.redhat.com/browse/";

/// Compact identifier shown in the view: `GH-123`, `THEIA-45`, `CRW-678`.
pub fn short_id(link: &str) -> String {
    if let Some(number) = link.strip_prefix(CHE_ISSUES) {
        format!("GH-{number}")
    } else if let Some(number) = link.strip_prefix(THEIA_ISSUES) {
        format!("THEIA-{number}")
    } else if let Some(key) = link.strip_prefix(JIRA_BROWSE) {
        key.to_string()
    } else {
        link.to_string()
    }
}

/// Sort key of a short id: the prefix before the last `-`, then its number.
pub fn issue_key(id: &str) -> (String, u64) {
    match id.rsplit_once('-') {
        Some((prefix, number)) => match number.parse() {
            Ok(n) => (prefix.to_string(), n),
            Err(_) => (id.to_string(), 0),
        },
        None => (id.to_string(), 0),
    }
}

fn severity_glyph(severity: &str) -> &'static str {
    match severity.to_lowercase().as_str() {
        "blocker" => "\u{1F6D1}",
        "critical" | "p1" => "\u{1F525}",
        "major" | "p2" => "\u{26A0}\u{FE0F}",
        _ => "",
    }
}

fn kind_glyph(kind: &str) -> &'static str {
    match kind.to_lowercase().as_str() {
        "bug" => "\u{1F41E}",
        "epic" => "\u{1F3AF}",
        "enhancement" | "feature" | "feature request" | "story" => "\u{2728}",
        "task" | "sub-task" => "\u{1F4CB}",
        "question" => "\u{2753}",
        _ => "",
    }
}

fn is_stale(row: &BacklogRow, now: DateTime<Utc>) -> bool {
    parse_millis(&row.updated).is_some_and(|updated| now - updated > Duration::days(STALE_DAYS))
}

/// Text of the link cell: glyphs, short id, title and trailing markers.
pub fn display_text(row: &BacklogRow, now: DateTime<Utc>) -> String {
    let glyphs = format!("{}{}", severity_glyph(&row.severity), kind_glyph(&row.kind));
    let mut text = if glyphs.is_empty() {
        format!("{} {}", short_id(&row.link), row.title)
    } else {
        format!("{glyphs} {} {}", short_id(&row.link), row.title)
    };
    if is_stale(row, now) {
        text.push_str(" \u{1F4A4}");
    }
    if row.has_label(NOTEWORTHY_LABEL) {
        text.push_str(" \u{1F4E3}");
    }
    text
}

fn quote(text: &str) -> String {
    text.replace('"', "\"\"")
}

pub fn hyperlink(url: &str, text: &str) -> String {
    format!("=HYPERLINK(\"{}\",\"{}\")", quote(url), quote(text))
}

fn or_blank(value: String) -> String {
    if value.trim().is_empty() {
        " ".to_string()
    } else {
        value
    }
}

fn issue_row(row: &BacklogRow, now: DateTime<Utc>) -> Vec<String> {
    let milestone = if row.milestone.is_empty() {
        String::new()
    } else {
        format!("'{}", row.milestone)
    };
    vec![
        hyperlink(&row.link, &display_text(row, now)),
        or_blank(milestone),
        or_blank(row.assignee.clone()),
        or_blank(row.areas(", ")),
        or_blank(row.status.clone()),
    ]
}

/// Rendered cell grid with the zero-based indexes of its title rows.
#[derive(Debug, Default)]
pub struct View {
    pub rows: Vec<Vec<String>>,
    pub title_rows: Vec<usize>,
}

impl View {
    pub fn value_range(&self, sheet: &str) -> ValueRange {
        let last = column_letter(VIEW_WIDTH - 1);
        ValueRange {
            range: format!("{sheet}!A1:{last}{}", self.rows.len()),
            values: self
                .rows
                .iter()
                .map(|row| row.iter().cloned().map(Some).collect())
                .collect(),
        }
    }
}

/// Non-empty buckets as a title row, their issues and a blank separator.
pub fn render(buckets: &[Bucket<'_>], now: DateTime<Utc>) -> View {
    let mut view = View::default();
    for bucket in buckets.iter().filter(|b| !b.rows.is_empty()) {
        view.title_rows.push(view.rows.len());
        let mut title = vec![String::new(); VIEW_WIDTH];
        title[0] = bucket.category.label().to_uppercase();
        view.rows.push(title);
        view.rows
            .extend(bucket.rows.iter().map(|row| issue_row(row, now)));
        view.rows.push(vec![String::new(); VIEW_WIDTH]);
    }
    view
}

/// Wipe values, formats and merges left by the previous run.
pub fn clear_requests(sheet_id: i64) -> Vec<Value> {
    vec![
        json!({
            "updateCells": {
                "range": { "sheetId": sheet_id },
                "fields": "*",
            }
        }),
        json!({
            "unmergeCells": {
                "range": { "sheetId": sheet_id },
            }
        }),
    ]
}

/// Bold and merge every title row across the view width.
pub fn title_requests(sheet_id: i64, title_rows: &[usize]) -> Vec<Value> {
    title_rows
        .iter()
        .flat_map(|&row| {
            let range = json!({
                "sheetId": sheet_id,
                "startRowIndex": row,
                "endRowIndex": row + 1,
                "startColumnIndex": 0,
                "endColumnIndex": VIEW_WIDTH,
            });
            [
                json!({
                    "repeatCell": {
                        "range": range.clone(),
                        "cell": { "userEnteredFormat": { "textFormat": { "bold": true } } },
                        "fields": "userEnteredFormat.textFormat.bold",
                    }
                }),
                json!({
                    "mergeCells": {
                        "range": range,
                        "mergeType": "MERGE_ALL",
                    }
                }),
            ]
        })
        .collect()
}
