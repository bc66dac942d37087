//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::builder::Builder;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(item: &T) {
    let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
    println!("{}", json);
}

/// Render one row as a table with a header line.
pub fn record_table(columns: &[String], values: &[String]) -> String {
    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());
    builder.push_record(values.iter().cloned());
    builder.build().to_string()
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{}:", key), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_table_has_headers_and_values() {
        let columns = vec!["Premise_ID".to_string(), "Test_Case_ID".to_string()];
        let values = vec!["P1".to_string(), "TC-100".to_string()];

        let table = record_table(&columns, &values);
        let lines: Vec<&str> = table.lines().collect();

        let header_line = lines.iter().position(|l| l.contains("Premise_ID")).unwrap();
        let value_line = lines.iter().position(|l| l.contains("TC-100")).unwrap();
        assert!(header_line < value_line);
        assert!(lines[value_line].contains("P1"));
    }
}
