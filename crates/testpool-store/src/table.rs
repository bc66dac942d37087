//! In-memory form of the pool file: a header row plus string cells.

use std::io::{self, Read, Write};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// The whole pool as loaded from, and written back to, storage.
///
/// Every row has exactly `headers.len()` cells. Cells are kept as text so
/// columns the allocator does not know about survive a rewrite verbatim,
/// and a byte-order mark on the source file is written back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    bom: bool,
}

impl PoolTable {
    /// Build a table. Short rows are padded with empty cells and long rows
    /// truncated to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self {
            headers,
            rows,
            bom: false,
        }
    }

    /// Whether the source started with a UTF-8 byte-order mark.
    pub fn has_bom(&self) -> bool {
        self.bom
    }

    /// Header names in stored order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Cells of one row.
    pub fn row(&self, row: usize) -> &[String] {
        &self.rows[row]
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// A table without headers or without data rows holds no records.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }

    /// Position of a column by exact header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Text of one cell.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        &self.rows[row][col]
    }

    /// Overwrite one cell.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) {
        self.rows[row][col] = value.into();
    }

    /// Append a column, filling every existing row with `default`.
    pub fn push_column(&mut self, name: impl Into<String>, default: &str) {
        self.headers.push(name.into());
        for row in &mut self.rows {
            row.push(default.to_string());
        }
    }

    /// Parse CSV with a header row. Rows whose width differs from the
    /// header are rejected rather than guessed at.
    pub fn read_csv<R: Read>(mut reader: R) -> Result<Self, csv::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let (bom, body) = match bytes.strip_prefix(UTF8_BOM) {
            Some(body) => (true, body),
            None => (false, bytes.as_slice()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(body);

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(String::from).collect());
        }

        Ok(Self { headers, rows, bom })
    }

    /// Serialize the table as CSV, headers first.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> Result<(), csv::Error> {
        if self.bom {
            writer.write_all(UTF8_BOM)?;
        }
        let mut writer = csv::WriterBuilder::new().from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_preserves_order_and_quoting() {
        let input = "Premise_ID,Street_Name,Utilized_PID\nP1,\"High St, North\",No\nP2,Low Rd,Yes\n";
        let table = PoolTable::read_csv(input.as_bytes()).unwrap();

        assert_eq!(table.headers(), ["Premise_ID", "Street_Name", "Utilized_PID"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 1), "High St, North");
        assert_eq!(table.cell(1, 2), "Yes");

        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), input);
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let input = "a,b\n1,2\n3\n";
        assert!(PoolTable::read_csv(input.as_bytes()).is_err());
    }

    #[test]
    fn test_empty_input_and_header_only_are_empty() {
        assert!(PoolTable::read_csv("".as_bytes()).unwrap().is_empty());
        let header_only = PoolTable::read_csv("a,b\n".as_bytes()).unwrap();
        assert_eq!(header_only.headers().len(), 2);
        assert!(header_only.is_empty());
    }

    #[test]
    fn test_byte_order_mark_is_kept_out_of_headers_and_written_back() {
        let input = "\u{feff}Premise_ID,Utilized_PID\nP1,No\n";
        let table = PoolTable::read_csv(input.as_bytes()).unwrap();
        assert!(table.has_bom());
        assert_eq!(table.column_index("Premise_ID"), Some(0));

        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), input);
    }

    #[test]
    fn test_no_byte_order_mark_added() {
        let table = PoolTable::read_csv("a\n1\n".as_bytes()).unwrap();
        assert!(!table.has_bom());

        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        assert_eq!(out, b"a\n1\n");
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        assert!(PoolTable::read_csv(&b"Premise_ID\n\xff\xfe\n"[..]).is_err());
    }

    #[test]
    fn test_push_column_fills_rows() {
        let mut table = PoolTable::new(
            vec!["id".into()],
            vec![vec!["1".into()], vec!["2".into()]],
        );
        table.push_column("flag", "No");
        assert_eq!(table.headers(), ["id", "flag"]);
        assert_eq!(table.cell(1, 1), "No");
    }

    #[test]
    fn test_new_normalizes_row_width() {
        let table = PoolTable::new(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into()], vec!["1".into(), "2".into(), "3".into()]],
        );
        assert_eq!(table.row(0), ["1", ""]);
        assert_eq!(table.row(1), ["1", "2"]);
    }
}
