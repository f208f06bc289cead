//! SQL text used by the postgres copy path.

use crate::mapping::MappedColumn;

/// Double quotes an identifier, escaping any embedded quotes.
///
/// A name already wrapped in quotes on both ends is taken as quoted and kept as is.
pub fn quote_identifier(name: &str) -> String {
    let unquoted = match name.strip_prefix('"').and_then(|inner| inner.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => name.to_string(),
    };
    format!("\"{}\"", unquoted.replace('"', "\"\""))
}

/// Splits a qualified name on the dots that sit outside quoted parts.
fn split_qualified_name(name: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (index, c) in name.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => {
                parts.push(&name[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&name[start..]);

    parts
}

/// Formats a table name, handling `schema.table` and quoted parts containing dots.
pub fn format_table_name(table_name: &str) -> String {
    split_qualified_name(table_name)
        .into_iter()
        .map(quote_identifier)
        .collect::<Vec<String>>()
        .join(".")
}

pub fn generate_columns_names_sql(columns: &[MappedColumn]) -> String {
    columns
        .iter()
        .map(|column| quote_identifier(&column.destination))
        .collect::<Vec<String>>()
        .join(", ")
}

pub fn generate_copy_in_sql(table_name: &str, columns: &[MappedColumn]) -> String {
    format!(
        "COPY {} ({}) FROM STDIN WITH (FORMAT binary)",
        format_table_name(table_name),
        generate_columns_names_sql(columns),
    )
}
