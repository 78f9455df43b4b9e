use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{SheetStore, ValueRange};

/// In-memory sheet store mimicking the value semantics of the Sheets API:
/// `None` cells are left untouched, reads trim trailing empty cells.
#[derive(Default)]
pub struct MemorySheet {
    sheets: Mutex<HashMap<String, Vec<Vec<String>>>>,
    pub requests: Mutex<Vec<serde_json::Value>>,
    pub appended: Mutex<Vec<(String, usize)>>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(self, name: &str, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        self.sheets.lock().unwrap().insert(name.to_string(), rows);
        self
    }

    pub fn rows(&self, name: &str) -> Vec<Vec<String>> {
        self.sheets
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    fn write(&self, range: &str, values: &[Vec<Option<String>>]) -> Result<()> {
        let (sheet, col, row) = parse_top_left(range)?;
        let mut sheets = self.sheets.lock().unwrap();
        let rows = sheets.entry(sheet).or_default();
        for (r, cells) in values.iter().enumerate() {
            let row_idx = row + r;
            if rows.len() <= row_idx {
                rows.resize(row_idx + 1, Vec::new());
            }
            for (c, cell) in cells.iter().enumerate() {
                if let Some(value) = cell {
                    let target = &mut rows[row_idx];
                    if target.len() <= col + c {
                        target.resize(col + c + 1, String::new());
                    }
                    target[col + c] = value.clone();
                }
            }
        }
        Ok(())
    }
}

/// Split `sheet!B3:D4` into the sheet name and zero-based top-left cell.
fn parse_top_left(range: &str) -> Result<(String, usize, usize)> {
    let Some((sheet, cells)) = range.split_once('!') else {
        bail!("range without sheet name: {range}");
    };
    let top_left = cells.split(':').next().unwrap_or(cells);
    let letters: String = top_left.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &top_left[letters.len()..];
    let col = letters
        .chars()
        .fold(0usize, |acc, c| acc * 26 + (c as usize - 'A' as usize + 1))
        - 1;
    let row: usize = if digits.is_empty() { 1 } else { digits.parse()? };
    Ok((sheet.to_string(), col, row - 1))
}

#[async_trait]
impl SheetStore for MemorySheet {
    async fn get_range(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let (sheet, _, _) = parse_top_left(range)?;
        let rows = self.rows(&sheet);
        Ok(rows
            .into_iter()
            .map(|mut row| {
                while row.last().is_some_and(|c| c.is_empty()) {
                    row.pop();
                }
                row
            })
            .collect())
    }

    async fn append_rows(&self, sheet: &str, rows: Vec<Vec<Option<String>>>) -> Result<()> {
        let start = self.rows(sheet).len();
        self.appended
            .lock()
            .unwrap()
            .push((sheet.to_string(), rows.len()));
        let filled: Vec<Vec<Option<String>>> = rows
            .into_iter()
            .map(|r| r.into_iter().map(|c| Some(c.unwrap_or_default())).collect())
            .collect();
        self.write(&format!("{sheet}!A{}", start + 1), &filled)
    }

    async fn batch_update_values(&self, data: Vec<ValueRange>) -> Result<()> {
        for update in data {
            self.write(&update.range, &update.values)?;
        }
        Ok(())
    }

    async fn batch_update(&self, requests: Vec<serde_json::Value>) -> Result<()> {
        self.requests.lock().unwrap().extend(requests);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_top_left_cells() {
        assert_eq!(parse_top_left("backlog!A1:U").unwrap(), ("backlog".into(), 0, 0));
        assert_eq!(parse_top_left("x!AA10:AB10").unwrap(), ("x".into(), 26, 9));
        assert!(parse_top_left("A1").is_err());
    }

    #[tokio::test]
    async fn none_cells_are_left_untouched() {
        let store = MemorySheet::new().with_sheet("s", &[&["h1", "h2"], &["a", "b"]]);
        store
            .batch_update_values(vec![ValueRange::row(
                "s!A2:B2".into(),
                vec![None, Some("c".into())],
            )])
            .await
            .unwrap();
        assert_eq!(store.rows("s")[1], vec!["a", "c"]);
    }
}
