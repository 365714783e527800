//! Statement classification and structural field extraction.
//!
//! Determines what kind of statement a scanned span is by inspecting its
//! leading keywords after skipping whitespace and comments, and provides
//! the literal-aware helpers the rewriters use to pull out table
//! references and top-level comma-separated lists.

use crate::scanner::literal_spans;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    SchemaDefinition,
    DataInsertion,
    Administrative,
    Unrecognized,
}

/// Session/environment statements with no SQL Server equivalent. These are
/// preserved as inert comments, never translated.
const ADMIN_PREFIXES: &[&str] = &[
    "SET DEFINE",
    "ALTER SESSION",
    "USE",
    "WHENEVER",
    "SPOOL",
    "COMMIT",
    "CONNECT",
    "PROMPT",
    "REM",
];

/// Classify a statement span by its leading keyword(s).
pub fn classify(stmt: &str) -> StatementKind {
    let head = strip_leading_comments(stmt);
    let upper: String = head.chars().take(40).collect::<String>().to_uppercase();

    if starts_with_keywords(&upper, "CREATE TABLE") {
        return StatementKind::SchemaDefinition;
    }
    if starts_with_keywords(&upper, "INSERT INTO") {
        return StatementKind::DataInsertion;
    }
    for prefix in ADMIN_PREFIXES {
        if starts_with_keywords(&upper, prefix) {
            return StatementKind::Administrative;
        }
    }
    StatementKind::Unrecognized
}

/// True when `upper` begins with `keywords` (single space = any run of
/// whitespace) followed by a word boundary.
fn starts_with_keywords(upper: &str, keywords: &str) -> bool {
    let mut rest = upper;
    let mut words = keywords.split(' ').peekable();
    while let Some(word) = words.next() {
        if !rest.starts_with(word) {
            return false;
        }
        rest = &rest[word.len()..];
        let boundary = rest
            .chars()
            .next()
            .map(|c| !c.is_ascii_alphanumeric() && c != '_')
            .unwrap_or(true);
        if !boundary {
            return false;
        }
        if words.peek().is_some() {
            let trimmed = rest.trim_start();
            if trimmed.len() == rest.len() {
                return false;
            }
            rest = trimmed;
        }
    }
    true
}

/// Strip leading whitespace and `--`/`/* */` comments.
pub fn strip_leading_comments(stmt: &str) -> &str {
    let mut rest = stmt.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            match after.find('\n') {
                Some(pos) => rest = after[pos + 1..].trim_start(),
                None => return "",
            }
            continue;
        }
        if let Some(after) = rest.strip_prefix("/*") {
            match after.find("*/") {
                Some(pos) => rest = after[pos + 2..].trim_start(),
                None => return "",
            }
            continue;
        }
        break;
    }
    rest
}

/// A schema-qualified table reference. The schema is optional in source
/// text but always present in emitted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub table: String,
}

impl TableRef {
    /// Bracket-quoted form, substituting `default_schema` when the source
    /// statement carried none.
    pub fn quoted(&self, default_schema: &str) -> String {
        format!(
            "[{}].[{}]",
            self.schema.as_deref().unwrap_or(default_schema),
            self.table
        )
    }
}

/// Parse `schema.table` (any mix of bare, `"quoted"` and `[bracketed]`
/// identifiers) from the start of `text`. Returns the reference and the
/// number of bytes consumed.
pub fn parse_table_ref(text: &str) -> Option<(TableRef, usize)> {
    let trimmed_len = text.len() - text.trim_start().len();
    let rest = &text[trimmed_len..];

    let (first, used) = parse_identifier(rest)?;
    let mut consumed = trimmed_len + used;
    let after = &rest[used..];

    if let Some(after_dot) = after.strip_prefix('.') {
        let (second, used2) = parse_identifier(after_dot)?;
        consumed += 1 + used2;
        Some((
            TableRef {
                schema: Some(first),
                table: second,
            },
            consumed,
        ))
    } else {
        Some((
            TableRef {
                schema: None,
                table: first,
            },
            consumed,
        ))
    }
}

/// Parse one identifier: `"NAME"`, `[NAME]` or bare. Returns the unquoted
/// name and bytes consumed.
pub fn parse_identifier(text: &str) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    match bytes.first()? {
        b'"' => {
            let end = text[1..].find('"')? + 1;
            Some((text[1..end].to_string(), end + 1))
        }
        b'[' => {
            let end = text[1..].find(']')? + 1;
            Some((text[1..end].to_string(), end + 1))
        }
        c if c.is_ascii_alphabetic() || *c == b'_' => {
            let end = text
                .find(|ch: char| !ch.is_ascii_alphanumeric() && ch != '_' && ch != '$' && ch != '#')
                .unwrap_or(text.len());
            if end == 0 {
                None
            } else {
                Some((text[..end].to_string(), end))
            }
        }
        _ => None,
    }
}

/// Split `text` at top-level commas: commas inside parentheses or string
/// literals do not split.
pub fn split_top_level(text: &str) -> Vec<String> {
    let spans = literal_spans(text);
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if crate::scanner::in_spans(&spans, i) {
            continue;
        }
        match b {
            b'(' => depth += 1,
            b')' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(text[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() || !parts.is_empty() {
        parts.push(tail.to_string());
    }
    parts
}

/// Find the first occurrence of `needle` at paren depth zero, outside
/// string literals. Returns its byte offset.
pub fn find_top_level(text: &str, needle: u8) -> Option<usize> {
    let spans = literal_spans(text);
    let mut depth = 0i32;
    for (i, &b) in text.as_bytes().iter().enumerate() {
        if crate::scanner::in_spans(&spans, i) {
            continue;
        }
        if b == needle && depth == 0 {
            return Some(i);
        }
        match b {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Extract the body of the first top-level parenthesized group, returning
/// `(body, span_of_group_including_parens)`.
pub fn top_level_group(text: &str) -> Option<(&str, (usize, usize))> {
    let spans = literal_spans(text);
    let bytes = text.as_bytes();
    let open = find_top_level(text, b'(')?;
    let mut depth = 0i32;
    for i in open..bytes.len() {
        if crate::scanner::in_spans(&spans, i) {
            continue;
        }
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&text[open + 1..i], (open, i + 1)));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_create_table() {
        assert_eq!(
            classify("CREATE TABLE \"ADMIN\".\"T\" (ID NUMBER);"),
            StatementKind::SchemaDefinition
        );
        assert_eq!(
            classify("  create   table t (id number);"),
            StatementKind::SchemaDefinition
        );
    }

    #[test]
    fn test_classify_insert() {
        assert_eq!(
            classify("Insert into ADMIN.T (ID) values (1);"),
            StatementKind::DataInsertion
        );
    }

    #[test]
    fn test_classify_administrative() {
        assert_eq!(classify("SET DEFINE OFF;"), StatementKind::Administrative);
        assert_eq!(
            classify("ALTER SESSION SET NLS_DATE_FORMAT = 'X';"),
            StatementKind::Administrative
        );
        assert_eq!(classify("COMMIT;"), StatementKind::Administrative);
    }

    #[test]
    fn test_classify_skips_leading_comments() {
        assert_eq!(
            classify("-- header\n/* block */ CREATE TABLE t (id NUMBER);"),
            StatementKind::SchemaDefinition
        );
    }

    #[test]
    fn test_classify_unrecognized() {
        assert_eq!(
            classify("GRANT SELECT ON t TO someone;"),
            StatementKind::Unrecognized
        );
        // CREATE INDEX is not in the create-table family.
        assert_eq!(
            classify("CREATE INDEX idx ON t (id);"),
            StatementKind::Unrecognized
        );
        // Prefix must sit on a word boundary.
        assert_eq!(classify("COMMITTEE;"), StatementKind::Unrecognized);
    }

    #[test]
    fn test_parse_table_ref_forms() {
        let (r, _) = parse_table_ref("\"ADMIN\".\"CLIENTS\" (").unwrap();
        assert_eq!(r.schema.as_deref(), Some("ADMIN"));
        assert_eq!(r.table, "CLIENTS");

        let (r, _) = parse_table_ref("ADMIN.CLIENTS (").unwrap();
        assert_eq!(r.schema.as_deref(), Some("ADMIN"));
        assert_eq!(r.table, "CLIENTS");

        let (r, _) = parse_table_ref("[ADMIN].[CLIENTS] (").unwrap();
        assert_eq!(r.schema.as_deref(), Some("ADMIN"));

        let (r, _) = parse_table_ref("CLIENTS(").unwrap();
        assert_eq!(r.schema, None);
        assert_eq!(r.quoted("ADMIN"), "[ADMIN].[CLIENTS]");
    }

    #[test]
    fn test_split_top_level_respects_nesting() {
        let parts = split_top_level("1, 'a,b', f(2,3), 4");
        assert_eq!(parts, vec!["1", "'a,b'", "f(2,3)", "4"]);
    }

    #[test]
    fn test_split_top_level_quoted_paren() {
        let parts = split_top_level("'a(', 'b)', 2");
        assert_eq!(parts, vec!["'a('", "'b)'", "2"]);
    }

    #[test]
    fn test_top_level_group() {
        let (body, span) = top_level_group("INSERT INTO t (a, b) values (1, 2)").unwrap();
        assert_eq!(body, "a, b");
        assert_eq!(span.0, 14);
    }
}
