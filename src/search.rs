//! Keyword search over the loaded [`Table`].
//!
//! A row matches when *any* of its fields contains the query as a
//! case-insensitive substring. The query is literal text, never a pattern.
//! Matches keep table order and are rendered as their fields joined with
//! `" | "`, without headers or row numbers.
//!
//! ```rust
//! use saoke_bot::search::{search_table, SearchOutcome};
//! use saoke_bot::table::Table;
//!
//! let table = Table::new(
//!     vec!["name".into(), "amount".into()],
//!     vec![vec!["Foo".into(), "10".into()], vec!["Bar".into(), "20".into()]],
//! );
//! match search_table(&table, "foo") {
//!     SearchOutcome::Matches(rows) => assert_eq!(rows, vec!["Foo | 10"]),
//!     SearchOutcome::NotFound(_) => unreachable!(),
//! }
//! ```

use crate::table::{fold_case, Row, Table};

/// Separator placed between the fields of a rendered row.
pub const FIELD_SEPARATOR: &str = " | ";

/// Result of a single search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Nothing matched; carries the user-facing message naming the query.
    NotFound(String),
    /// Rendered matching rows, in table order. Never empty.
    Matches(Vec<String>),
}

/// Reply sent when no row matches, quoting the query verbatim.
pub fn not_found_message(query: &str) -> String {
    format!("Khong tim thay '{}'", query)
}

/// Render a row as its fields joined with [`FIELD_SEPARATOR`].
pub fn format_row(fields: &[String]) -> String {
    fields.join(FIELD_SEPARATOR)
}

fn row_matches(row: &Row, needle: &str) -> bool {
    row.folded().iter().any(|field| field.contains(needle))
}

/// Search every field of every row for `query`, ignoring case.
pub fn search_table(table: &Table, query: &str) -> SearchOutcome {
    let needle = fold_case(query);

    let matches: Vec<String> = table
        .rows()
        .iter()
        .filter(|row| row_matches(row, &needle))
        .map(|row| format_row(row.fields()))
        .collect();

    if matches.is_empty() {
        SearchOutcome::NotFound(not_found_message(query))
    } else {
        SearchOutcome::Matches(matches)
    }
}
