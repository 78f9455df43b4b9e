//! Header-driven mapping between typed rows and positional sheet cells.
//!
//! Columns are located by a case-insensitive substring match of a fixed key
//! against the header row, so sheets may reorder columns, rename them with
//! extra words ("Needed CRW" for key `crw`) or omit optional ones. A key that
//! matches no header is skipped on encode and decodes as an empty string.

/// A logical column of a sheet, identified by the key searched in the header.
pub trait Column: Copy + PartialEq + 'static {
    const ALL: &'static [Self];

    fn key(self) -> &'static str;
}

/// A typed row that can be converted to and from cell values.
pub trait SheetRow: Sized {
    type Column: Column;

    fn cell(&self, column: Self::Column) -> String;

    fn from_cells<F: Fn(Self::Column) -> String>(get: F) -> Self;
}

/// Index of the first header containing `key`, ignoring case.
pub fn column_index(header: &[String], key: &str) -> Option<usize> {
    let key = key.to_lowercase();
    header
        .iter()
        .position(|name| name.to_lowercase().contains(&key))
}

/// Parse a boolean cell. Only `true` in any casing is true.
pub fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

pub struct RowCodec<C: Column> {
    width: usize,
    mapping: Vec<(C, usize)>,
}

impl<C: Column> RowCodec<C> {
    pub fn new(header: &[String]) -> Self {
        let mapping = C::ALL
            .iter()
            .filter_map(|column| column_index(header, column.key()).map(|idx| (*column, idx)))
            .collect();
        Self {
            width: header.len(),
            mapping,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn index(&self, column: C) -> Option<usize> {
        self.mapping
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, idx)| *idx)
    }

    /// Cell value for `column`, or an empty string when the column is not
    /// mapped or the row is too short.
    pub fn get<'a>(&self, cells: &'a [String], column: C) -> &'a str {
        self.index(column)
            .and_then(|idx| cells.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Build a header-sized row. Unmapped slots stay `None`, which the sheet
    /// API treats as "leave unchanged".
    pub fn encode<R: SheetRow<Column = C>>(&self, row: &R) -> Vec<Option<String>> {
        let mut cells = vec![None; self.width];
        for (column, idx) in &self.mapping {
            cells[*idx] = Some(row.cell(*column));
        }
        cells
    }

    pub fn decode<R: SheetRow<Column = C>>(&self, cells: &[String]) -> R {
        R::from_cells(|column| self.get(cells, column).to_string())
    }
}
