/// Column letters for a zero-based index: 0 → `A`, 25 → `Z`, 26 → `AA`.
pub fn column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A1 range covering one full row of a sheet with `width` columns.
pub fn row_range(sheet: &str, row_number: usize, width: usize) -> String {
    let last = column_letter(width.max(1) - 1);
    format!("{sheet}!A{row_number}:{last}{row_number}")
}

/// A1 range of a single cell.
pub fn cell_range(sheet: &str, column: usize, row_number: usize) -> String {
    let col = column_letter(column);
    format!("{sheet}!{col}{row_number}:{col}{row_number}")
}

/// Whole-sheet read range, `A1` to the given last column.
pub fn sheet_range(sheet: &str, last_column: &str) -> String {
    format!("{sheet}!A1:{last_column}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(20), "U");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(51), "AZ");
        assert_eq!(column_letter(52), "BA");
    }

    #[test]
    fn ranges() {
        assert_eq!(row_range("backlog", 7, 21), "backlog!A7:U7");
        assert_eq!(cell_range("plugins-backlog", 0, 3), "plugins-backlog!A3:A3");
        assert_eq!(sheet_range("backlog", "U"), "backlog!A1:U");
    }
}
