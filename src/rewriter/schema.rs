//! Schema-definition rewriting.
//!
//! Turns an Oracle CREATE TABLE statement into a SQL Server block: an
//! existence-check/drop guard followed by a bracket-quoted CREATE TABLE
//! with mapped column types. Storage clauses and table-level constraints
//! are stripped; dropped comma separators between column definitions are
//! repaired. Re-running the rewriter over its own output is a no-op.

use once_cell::sync::Lazy;
use regex::Regex;

use super::recover::Anomaly;
use crate::classifier::{parse_identifier, parse_table_ref, split_top_level, top_level_group};
use crate::scanner::{in_spans, literal_spans};
use crate::typemap;

/// Declared table shape, kept so later inserts can infer omitted column
/// lists and check tuple arity.
#[derive(Debug, Clone)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug)]
pub struct SchemaRewrite {
    /// Guard + CREATE block, ending with `);` (the driver appends `GO`).
    pub block: String,
    pub table: TableDefinition,
}

static CREATE_TABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bCREATE\s+TABLE\s+").unwrap());

// A column definition starts with an identifier followed by a recognized
// type name. Separator repair splits fragments at these boundaries, so
// re-parsing already-correct output yields the same columns.
static COLUMN_START_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:"[A-Za-z_][\w$#]*"|\[[A-Za-z_][\w$#]*\]|[A-Za-z_][\w$#]*)\s+(?:VARCHAR2|NVARCHAR2|NVARCHAR|VARCHAR|NCHAR|CHAR|NUMBER|DECIMAL|NUMERIC|BIT|TINYINT|SMALLINT|INTEGER|INT|BIGINT|DATETIME2|DATE|TIMESTAMP|RAW|CLOB|NCLOB|BLOB|LONG\s+RAW|LONG|FLOAT|BINARY_FLOAT|BINARY_DOUBLE|VARBINARY)\b"#,
    )
    .unwrap()
});

// Clause keywords that end the type portion of a column definition.
static CLAUSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(DEFAULT|NOT\s+NULL|NULL|ENABLE|DISABLE|CONSTRAINT|GENERATED|CHECK|PRIMARY\s+KEY|UNIQUE|REFERENCES)\b")
        .unwrap()
});

static RE_SYSDATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsysdate\b").unwrap());
static RE_SYSTIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bsystimestamp\b").unwrap());

// Table-level fragments with no column to keep.
const CONSTRAINT_PREFIXES: &[&str] = &[
    "CONSTRAINT",
    "PRIMARY KEY",
    "UNIQUE",
    "FOREIGN KEY",
    "CHECK",
    "SUPPLEMENTAL",
];

/// Rewrite a CREATE TABLE statement into the guarded SQL Server block.
pub fn rewrite(stmt: &str, default_schema: &str) -> Result<SchemaRewrite, Anomaly> {
    let spans = literal_spans(stmt);
    let create = CREATE_TABLE_RE
        .find_iter(stmt)
        .find(|m| !in_spans(&spans, m.start()))
        .ok_or_else(|| Anomaly::Malformed {
            reason: "no CREATE TABLE head".to_string(),
        })?;

    let rest = &stmt[create.end()..];
    let (table_ref, used) = parse_table_ref(rest).ok_or_else(|| Anomaly::Malformed {
        reason: "unparseable table reference".to_string(),
    })?;
    let after = &rest[used..];
    let (body, _) = top_level_group(after).ok_or_else(|| Anomaly::Malformed {
        reason: "missing column list".to_string(),
    })?;

    let mut columns: Vec<(String, String)> = Vec::new();
    for fragment in split_top_level(body) {
        if fragment.is_empty() || is_table_constraint(&fragment.to_uppercase()) {
            continue;
        }
        for def in split_column_defs(&fragment) {
            if let Some(col) = render_column(&def) {
                columns.push(col);
            }
        }
    }

    if columns.is_empty() {
        return Err(Anomaly::Malformed {
            reason: "no column definitions found".to_string(),
        });
    }

    let table = table_ref.table.clone();
    let schema = table_ref
        .schema
        .as_deref()
        .unwrap_or(default_schema)
        .to_string();

    let mut block = String::new();
    block.push_str(&format!("-- Table: {}\n", table));
    block.push_str(&format!(
        "IF EXISTS(SELECT name FROM sys.sysobjects WHERE Name = N'{}' AND xtype = N'U')\n",
        table
    ));
    block.push_str("BEGIN\n");
    block.push_str(&format!("    DROP TABLE [{}].[{}]\n", schema, table));
    block.push_str("END\nGO\n\n");
    block.push_str(&format!("CREATE TABLE [{}].[{}] (\n", schema, table));
    for (i, (_, rendered)) in columns.iter().enumerate() {
        let sep = if i + 1 < columns.len() { "," } else { "" };
        block.push_str(&format!("    {}{}\n", rendered, sep));
    }
    block.push_str(");");

    Ok(SchemaRewrite {
        block,
        table: TableDefinition {
            name: table,
            columns: columns.into_iter().map(|(name, _)| name).collect(),
        },
    })
}

/// A fragment is a table-level constraint only when the keyword stands
/// alone: column names can begin with one (`UNIQUE_ID`, `CHECKSUM`).
fn is_table_constraint(upper: &str) -> bool {
    CONSTRAINT_PREFIXES.iter().any(|p| {
        upper.starts_with(p)
            && upper[p.len()..]
                .chars()
                .next()
                .map_or(true, |c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '#')))
    })
}

/// Byte offset of the rewritable block within a statement: the `-- Table:`
/// header or guard if present, else the CREATE TABLE head. Used by the
/// fix pass to preserve unrelated leading text.
pub fn block_start(stmt: &str) -> Option<usize> {
    let spans = literal_spans(stmt);
    let create = CREATE_TABLE_RE.find_iter(stmt).find(|m| {
        if in_spans(&spans, m.start()) {
            return false;
        }
        // A commented-out CREATE TABLE is not rewritable.
        let line_start = stmt[..m.start()].rfind('\n').map(|i| i + 1).unwrap_or(0);
        !stmt[line_start..m.start()].trim_start().starts_with("--")
    })?;
    let head = &stmt[..create.start()];
    let guard = head.rfind("IF EXISTS(SELECT name FROM sys.sysobjects");
    let header = head.rfind("-- Table: ");
    Some(match (header, guard) {
        (Some(h), Some(g)) => h.min(g),
        (Some(h), None) => h,
        (None, Some(g)) => g,
        (None, None) => create.start(),
    })
}

/// Split a comma-delimited fragment into column definitions, repairing
/// dropped separators by splitting at recognized column starts. A
/// fragment with at most one recognized start is a single definition as
/// written; the type mapper handles unrecognized type names, so the
/// repair split must not discard them.
fn split_column_defs(fragment: &str) -> Vec<String> {
    let spans = literal_spans(fragment);
    let starts: Vec<usize> = COLUMN_START_RE
        .find_iter(fragment)
        .filter(|m| !in_spans(&spans, m.start()) && depth_at(fragment, &spans, m.start()) == 0)
        .map(|m| m.start())
        .collect();

    if starts.len() <= 1 {
        return vec![fragment.trim().to_string()];
    }

    let mut defs = Vec::new();
    if !fragment[..starts[0]].trim().is_empty() {
        defs.push(fragment[..starts[0]].trim().to_string());
    }
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(fragment.len());
        defs.push(fragment[start..end].trim().to_string());
    }
    defs
}

/// Paren nesting depth at byte offset `pos`, ignoring literal contents.
fn depth_at(text: &str, spans: &[(usize, usize)], pos: usize) -> i32 {
    let mut depth = 0;
    for (i, &b) in text.as_bytes().iter().enumerate().take(pos) {
        if in_spans(spans, i) {
            continue;
        }
        match b {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Render one column definition: `[NAME] TYPE [DEFAULT expr] [NOT NULL]`.
fn render_column(def: &str) -> Option<(String, String)> {
    let (name, used) = parse_identifier(def)?;
    let rest = def[used..].trim();

    let spans = literal_spans(rest);
    let clauses: Vec<(usize, usize, String)> = CLAUSE_RE
        .captures_iter(rest)
        .filter_map(|caps| {
            let m = caps.get(1)?;
            if in_spans(&spans, m.start()) || depth_at(rest, &spans, m.start()) != 0 {
                return None;
            }
            Some((m.start(), m.end(), m.as_str().to_uppercase()))
        })
        .collect();

    let type_end = clauses.first().map(|&(s, _, _)| s).unwrap_or(rest.len());
    let type_text = rest[..type_end].trim();
    let target = typemap::map_text(type_text)?;

    let mut default_expr: Option<String> = None;
    let mut not_null = false;
    for (i, (_, end, word)) in clauses.iter().enumerate() {
        match word.as_str() {
            "DEFAULT" => {
                let expr_end = clauses
                    .get(i + 1)
                    .map(|&(s, _, _)| s)
                    .unwrap_or(rest.len());
                let expr = rest[*end..expr_end].trim();
                if !expr.is_empty() {
                    default_expr = Some(rewrite_default(expr));
                }
            }
            w if w.starts_with("NOT") => not_null = true,
            _ => {}
        }
    }

    let mut rendered = format!("[{}] {}", name, target);
    if let Some(expr) = default_expr {
        rendered.push_str(" DEFAULT ");
        rendered.push_str(&expr);
    }
    if not_null {
        rendered.push_str(" NOT NULL");
    }
    Some((name, rendered))
}

/// Translate Oracle default expressions to SQL Server equivalents.
fn rewrite_default(expr: &str) -> String {
    if expr.to_lowercase().contains("sys_guid()") {
        return "NEWID()".to_string();
    }
    let expr = RE_SYSTIMESTAMP.replace_all(expr, "GETDATE()");
    RE_SYSDATE.replace_all(&expr, "GETDATE()").into_owned()
}
