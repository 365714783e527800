//! Data-insertion rewriting.
//!
//! Rewrites Oracle INSERT statements into bracket-quoted SQL Server
//! inserts. String literals are decoded, de-collided, squashed and
//! truncated; Oracle date functions become DATETIME2 literals or
//! `GETDATE()`; structural damage from lossy upstream exports (duplicated
//! closing tails, dropped `VALUES` introducers) is repaired where the
//! repair is unambiguous and skipped otherwise.

use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::keywords::decollide;
use super::recover::Anomaly;
use crate::classifier::{parse_identifier, parse_table_ref, split_top_level, top_level_group};
use crate::scanner::{in_spans, literal_spans};

/// Declared column order per table, captured from CREATE TABLE statements
/// earlier in the stream. Keyed by uppercase table name.
pub type TableCatalog = AHashMap<String, Vec<String>>;

#[derive(Debug)]
pub struct DataRewrite {
    /// Rewritten statement, terminated with `;`.
    pub statement: String,
    /// Value-level anomalies recovered in place (counted, not fatal).
    pub value_anomalies: Vec<Anomaly>,
}

static INSERT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bINSERT\s+INTO\s+").unwrap());

// Quoted numeric in scientific notation: unloadable as text, out of range
// as a number.
static QUOTED_SCI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?E[+-]?\d+$").unwrap());

static BARE_SCI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[+-]?\d+(\.\d+)?E([+-]?\d+)$").unwrap());

static TO_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^to_date\s*\(").unwrap());
static TO_TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^to_timestamp\s*\(").unwrap());
static SYS_CLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:sysdate|systimestamp)$").unwrap());

// `27-MAR-13 11.55.33.123456789 AM` and four-digit-year variants.
static ORACLE_TS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(\d{1,2})-([A-Z]{3})-(\d{2,4})(?:\s+(\d{1,2})\.(\d{2})\.(\d{2})(?:\.\d+)?\s*(AM|PM)?)?$",
    )
    .unwrap()
});

const MONTHS: &[(&str, u32)] = &[
    ("JAN", 1),
    ("FEB", 2),
    ("MAR", 3),
    ("APR", 4),
    ("MAY", 5),
    ("JUN", 6),
    ("JUL", 7),
    ("AUG", 8),
    ("SEP", 9),
    ("OCT", 10),
    ("NOV", 11),
    ("DEC", 12),
];

/// Literals longer than this many decoded characters get truncated; the
/// target dialect caps derived identifiers at 128 units.
const OVERSIZE_LIMIT: usize = 128;
const TRUNCATION_MARKER: &str = " ... [TRUNCATED]";

/// Character runs at least this long are squashed.
const RUN_LIMIT: usize = 11;
const RUN_MARKER: &str = " [REPEATED]";

/// Rewrite one INSERT statement. Structural failures return the anomaly
/// so the caller can emit a skip comment instead.
pub fn rewrite(
    stmt: &str,
    default_schema: &str,
    catalog: &TableCatalog,
    truncate_to: usize,
) -> Result<DataRewrite, Anomaly> {
    let mut text = stmt.trim().to_string();
    if text.ends_with(';') {
        text.pop();
    }

    let spans = literal_spans(&text);
    let head = INSERT_RE
        .find_iter(&text)
        .find(|m| !in_spans(&spans, m.start()))
        .ok_or_else(|| Anomaly::Malformed {
            reason: "no INSERT INTO head".to_string(),
        })?;

    let rest = &text[head.end()..];
    let (table_ref, used) = parse_table_ref(rest).ok_or_else(|| Anomaly::Malformed {
        reason: "unparseable table reference".to_string(),
    })?;
    let after_ref = &rest[used..];

    let (g1_body, g1_span) = top_level_group(after_ref).ok_or_else(|| Anomaly::Malformed {
        reason: "no value tuple".to_string(),
    })?;

    let before_g1_has_values = after_ref[..g1_span.0].to_uppercase().contains("VALUES");
    let after_g1 = &after_ref[g1_span.1..];

    let (explicit_columns, tuple_body) = if before_g1_has_values {
        (None, g1_body.to_string())
    } else {
        // First group is the column list; the tuple follows, with or
        // without its VALUES introducer.
        let mut cols = Vec::new();
        for part in split_top_level(g1_body) {
            let (name, _) = parse_identifier(part.trim()).ok_or_else(|| Anomaly::Malformed {
                reason: "unparseable column name".to_string(),
            })?;
            cols.push(name);
        }
        let (g2_body, _) = top_level_group(after_g1).ok_or_else(|| Anomaly::Malformed {
            reason: "missing value tuple after column list".to_string(),
        })?;
        (Some(cols), g2_body.to_string())
    };

    let values = split_top_level(&tuple_body);
    let found = values.len();

    let columns: Option<Vec<String>> = match explicit_columns {
        Some(cols) => Some(cols),
        None => catalog.get(&table_ref.table.to_uppercase()).cloned(),
    };
    if let Some(cols) = &columns {
        if cols.len() != found {
            return Err(Anomaly::ArityMismatch {
                expected: cols.len(),
                found,
            });
        }
    }

    let mut value_anomalies = Vec::new();
    let rewritten: Vec<String> = values
        .iter()
        .map(|v| transform_value(v, truncate_to, &mut value_anomalies))
        .collect();

    let mut out = String::with_capacity(text.len());
    out.push_str("INSERT INTO ");
    out.push_str(&table_ref.quoted(default_schema));
    if let Some(cols) = &columns {
        out.push_str(" (");
        for (i, c) in cols.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push('[');
            out.push_str(c);
            out.push(']');
        }
        out.push(')');
    }
    out.push_str(" VALUES (");
    out.push_str(&rewritten.join(", "));
    out.push_str(");");

    Ok(DataRewrite {
        statement: out,
        value_anomalies,
    })
}

/// Rewrite a single value expression.
fn transform_value(raw: &str, truncate_to: usize, anomalies: &mut Vec<Anomaly>) -> String {
    let value = raw.trim();

    if value.eq_ignore_ascii_case("null") {
        return "NULL".to_string();
    }

    if value.starts_with('\'') {
        return transform_string(value, truncate_to, anomalies);
    }

    if TO_DATE_RE.is_match(value) {
        // to_date('x', 'FMT') carries the value in its first argument.
        if let Some((body, _)) = top_level_group(value) {
            if let Some(first) = split_top_level(body).into_iter().next() {
                return transform_value(&first, truncate_to, anomalies);
            }
        }
        return "NULL".to_string();
    }

    if TO_TIMESTAMP_RE.is_match(value) {
        return transform_timestamp(value);
    }

    if SYS_CLOCK_RE.is_match(value) {
        return "GETDATE()".to_string();
    }

    if let Some(caps) = BARE_SCI_RE.captures(value) {
        let exponent: i64 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        if exponent.abs() > 38 {
            anomalies.push(Anomaly::OutOfRangeNumeric);
            return "NULL".to_string();
        }
    }

    value.to_string()
}

fn transform_string(value: &str, truncate_to: usize, anomalies: &mut Vec<Anomaly>) -> String {
    let inner = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(&value[1..]);
    let mut content = inner.replace("''", "'");

    // Damage signatures left behind by the lossy export.
    if content == "[;" || content == "[;);" {
        return "'MALFORMED_STRING'".to_string();
    }

    if QUOTED_SCI_RE.is_match(&content) {
        anomalies.push(Anomaly::OutOfRangeNumeric);
        return "NULL".to_string();
    }

    content = decollide(&content);
    content = squash_runs(&content);

    if content.chars().count() > OVERSIZE_LIMIT {
        // Keep the marked result within the oversize bound so a second
        // pass never truncates again, whatever the configured threshold.
        let keep = truncate_to.min(OVERSIZE_LIMIT - TRUNCATION_MARKER.len());
        content = content.chars().take(keep).collect();
        content.push_str(TRUNCATION_MARKER);
        anomalies.push(Anomaly::OversizedValue);
    }

    format!("'{}'", content.replace('\'', "''"))
}

/// Collapse runs of a repeated character to three occurrences plus a
/// marker. Squashed output never re-triggers the squash.
fn squash_runs(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut out = String::with_capacity(content.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let mut j = i;
        while j < chars.len() && chars[j] == c {
            j += 1;
        }
        let run = j - i;
        if run >= RUN_LIMIT {
            for _ in 0..3 {
                out.push(c);
            }
            out.push_str(RUN_MARKER);
        } else {
            for _ in 0..run {
                out.push(c);
            }
        }
        i = j;
    }
    out
}

/// `to_timestamp('27-MAR-13 11.55.33.000000000 AM', '…')` → ISO literal.
/// Falls back to the quoted source text when the argument does not match
/// the expected shape.
fn transform_timestamp(value: &str) -> String {
    let Some((body, _)) = top_level_group(value) else {
        return "NULL".to_string();
    };
    let Some(first) = split_top_level(body).into_iter().next() else {
        return "NULL".to_string();
    };
    let first = first.trim();
    let date_str = first.trim_matches('\'');

    if let Some(iso) = parse_oracle_timestamp(date_str) {
        format!("'{}'", iso)
    } else {
        format!("'{}'", date_str)
    }
}

fn parse_oracle_timestamp(date_str: &str) -> Option<String> {
    let caps = ORACLE_TS_RE.captures(date_str.trim())?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let mon_name = caps.get(2)?.as_str().to_uppercase();
    let month = MONTHS
        .iter()
        .find(|(name, _)| *name == mon_name)
        .map(|&(_, n)| n)?;
    let year_raw: u32 = caps.get(3)?.as_str().parse().ok()?;
    // Two-digit years pivot at 50.
    let year = if caps.get(3)?.as_str().len() <= 2 {
        if year_raw < 50 {
            2000 + year_raw
        } else {
            1900 + year_raw
        }
    } else {
        year_raw
    };
    if day == 0 || day > 31 {
        return None;
    }

    let mut hour: u32 = caps.get(4).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    let minute: u32 = caps.get(5).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    let second: u32 = caps.get(6).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    match caps.get(7).map(|m| m.as_str().to_uppercase()) {
        Some(ref meridiem) if meridiem == "PM" && hour < 12 => hour += 12,
        Some(ref meridiem) if meridiem == "AM" && hour == 12 => hour = 0,
        _ => {}
    }
    if hour > 23 || minute > 59 || second > 59 {
        return None;
    }

    Some(format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year, month, day, hour, minute, second
    ))
}
