use std::sync::LazyLock;

use regex::Regex;

use crate::map::TranslationMap;

// `column`, `table.column` or `schema.table.column`, where each part may be
// wrapped in `[]`, `""` or backticks. The column part may also be `*`.
static COLUMN_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^((?:(?:\[\w+\]|"\w+"|`\w+`|\w+)\.)*)(\[\w+\]|"\w+"|`\w+`|\w+|\*)$"#,
    )
    .expect("should compile")
});

/// A column reference split into its optional table and trailing identifier.
///
/// Qualifiers ahead of the table, such as a schema, are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnReference<'a> {
    /// Table qualifier with any quoting removed.
    pub table: Option<&'a str>,
    /// Trailing identifier with any quoting removed.
    pub column: &'a str,
}

/// Split `reference` into table and column, stripping quoting from both.
///
/// References that do not look like `[schema.][table.]column` are returned
/// whole as a bare column.
#[must_use]
pub fn extract_column(reference: &str) -> ColumnReference<'_> {
    let reference = reference.trim();
    let Some(captures) = COLUMN_REFERENCE.captures(reference) else {
        return ColumnReference {
            table: None,
            column: reference,
        };
    };

    let table = captures
        .get(1)
        .and_then(|m| m.as_str().strip_suffix('.'))
        .and_then(|qualifier| qualifier.rsplit('.').next())
        .map(unquote);
    let column = captures.get(2).map_or(reference, |m| unquote(m.as_str()));
    ColumnReference { table, column }
}

/// Qualify `reference` with `table`, substituting the identifier if it is a
/// desired name in `map`.
///
/// The result is always exactly `table.identifier`, whatever qualifier
/// `reference` carried.
#[must_use]
pub fn translate_column(map: &TranslationMap, table: &str, reference: &str) -> String {
    let column = extract_column(reference).column;
    format!("{table}.{}", map.actual_name(column))
}

/// Substitute `name` if it is a desired name in `map`, without qualifying it.
#[must_use]
pub fn translate_bare(map: &TranslationMap, name: &str) -> String {
    map.actual_name(extract_column(name).column).to_string()
}

fn unquote(part: &str) -> &str {
    part.strip_prefix('[')
        .and_then(|p| p.strip_suffix(']'))
        .or_else(|| part.strip_prefix('"').and_then(|p| p.strip_suffix('"')))
        .or_else(|| part.strip_prefix('`').and_then(|p| p.strip_suffix('`')))
        .unwrap_or(part)
}
