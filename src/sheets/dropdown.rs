use anyhow::Result;

use super::SheetStore;

/// Value lists kept in the first column of a helper sheet. Each list is a
/// title cell followed by its values and ends at the first empty cell.
#[derive(Debug, Clone, Default)]
pub struct DropDowns {
    groups: Vec<(String, String)>,
}

impl DropDowns {
    pub async fn load(store: &dyn SheetStore, sheet: &str) -> Result<Self> {
        let rows = store.get_range(&format!("{sheet}!A1:A")).await?;
        Ok(Self::parse(sheet, &rows))
    }

    pub fn parse(sheet: &str, rows: &[Vec<String>]) -> Self {
        let mut groups = Vec::new();
        let mut current: Option<(String, usize)> = None;

        for (index, row) in rows.iter().enumerate() {
            let cell = row.first().map(String::as_str).unwrap_or("");
            match (current.take(), cell.is_empty()) {
                (None, false) => current = Some((cell.to_lowercase(), index + 2)),
                (Some((title, start)), true) => {
                    groups.push((title, format!("='{sheet}'!A{start}:A{index}")));
                }
                (open, _) => current = open,
            }
        }
        // Trailing empty rows are not returned by the API, so close the last group here.
        if let Some((title, start)) = current {
            groups.push((title, format!("='{sheet}'!A{start}:A{}", rows.len())));
        }

        Self { groups }
    }

    /// Range of the last list whose title contains `key`.
    pub fn range_for(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.groups
            .iter()
            .rev()
            .find(|(title, _)| title.contains(&key))
            .map(|(_, range)| range.as_str())
    }
}
