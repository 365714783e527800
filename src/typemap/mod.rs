//! Oracle → SQL Server data type mapping.
//!
//! A pure, total mapping from source type descriptors to target types.
//! Degenerate precision (zero) is coerced to the smallest valid value and
//! unknown type names fall back to a safe default, so every input in the
//! domain yields a valid SQL Server descriptor.

use once_cell::sync::Lazy;
use regex::Regex;

/// Parsed source type: name plus optional precision/scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceType {
    pub name: String,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

/// Character/binary width: sized or unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Chars(u32),
    Max,
}

/// Resolved SQL Server type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetType {
    Bit,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Decimal(u32, u32),
    Float,
    NVarChar(Width),
    NChar(u32),
    VarBinary(Width),
    DateTime2,
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetType::Bit => write!(f, "BIT"),
            TargetType::TinyInt => write!(f, "TINYINT"),
            TargetType::SmallInt => write!(f, "SMALLINT"),
            TargetType::Int => write!(f, "INT"),
            TargetType::BigInt => write!(f, "BIGINT"),
            TargetType::Decimal(p, s) => write!(f, "DECIMAL({},{})", p, s),
            TargetType::Float => write!(f, "FLOAT"),
            TargetType::NVarChar(Width::Chars(n)) => write!(f, "NVARCHAR({})", n),
            TargetType::NVarChar(Width::Max) => write!(f, "NVARCHAR(MAX)"),
            TargetType::NChar(n) => write!(f, "NCHAR({})", n),
            TargetType::VarBinary(Width::Chars(n)) => write!(f, "VARBINARY({})", n),
            TargetType::VarBinary(Width::Max) => write!(f, "VARBINARY(MAX)"),
            TargetType::DateTime2 => write!(f, "DATETIME2"),
        }
    }
}

// Matches `NAME`, `NAME(p)`, `NAME(p,s)`, `NAME(n BYTE)`, `NAME(*)`.
static TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^([A-Z_][A-Z_0-9]*(?:\s+RAW)?)\s*(?:\(\s*(\*|\d+|MAX)\s*(?:,\s*(\d+)\s*)?(?:BYTE|CHAR)?\s*\))?",
    )
    .unwrap()
});

/// Parse the leading type descriptor out of a column definition fragment.
/// Returns `None` when the text does not start with an identifier.
pub fn parse_source_type(text: &str) -> Option<SourceType> {
    let caps = TYPE_RE.captures(text.trim())?;
    let name = caps.get(1)?.as_str().to_uppercase();
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    let precision = match caps.get(2).map(|m| m.as_str()) {
        None | Some("*") | Some("MAX") | Some("max") => None,
        Some(digits) => digits.parse::<u32>().ok(),
    };
    let scale = caps.get(3).and_then(|m| m.as_str().parse::<u32>().ok());
    Some(SourceType {
        name,
        precision,
        scale,
    })
}

/// Map a source descriptor to its SQL Server equivalent. Total: every
/// input produces a valid target type.
pub fn map(src: &SourceType) -> TargetType {
    let precision = src.precision;
    match src.name.as_str() {
        "NUMBER" => match precision {
            None => TargetType::Decimal(18, 0),
            Some(p) => {
                let p = p.max(1);
                match p {
                    1 => TargetType::Bit,
                    2..=3 => TargetType::TinyInt,
                    4..=5 => TargetType::SmallInt,
                    6..=10 => TargetType::Int,
                    11..=19 => TargetType::BigInt,
                    _ => TargetType::Decimal(p, src.scale.unwrap_or(0)),
                }
            }
        },
        "VARCHAR2" | "VARCHAR" | "NVARCHAR2" => {
            TargetType::NVarChar(Width::Chars(precision.unwrap_or(255).max(1)))
        }
        "CHAR" | "NCHAR" => TargetType::NChar(precision.unwrap_or(1).max(1)),
        // RAW values arrive as hex text: two characters per byte.
        "RAW" => TargetType::NVarChar(Width::Chars(
            precision.map(|n| (n * 2).max(1)).unwrap_or(12),
        )),
        "DATE" | "TIMESTAMP" => TargetType::DateTime2,
        "CLOB" | "NCLOB" | "LONG" => TargetType::NVarChar(Width::Max),
        "BLOB" | "LONG RAW" => TargetType::VarBinary(Width::Max),
        "FLOAT" | "BINARY_FLOAT" | "BINARY_DOUBLE" => TargetType::Float,
        // Already-converted types map to themselves so re-running the
        // rewriter over its own output is a no-op.
        "BIT" => TargetType::Bit,
        "TINYINT" => TargetType::TinyInt,
        "SMALLINT" => TargetType::SmallInt,
        "INT" | "INTEGER" => TargetType::Int,
        "BIGINT" => TargetType::BigInt,
        "DECIMAL" | "NUMERIC" => {
            let p = precision.unwrap_or(18).max(1);
            TargetType::Decimal(p, src.scale.unwrap_or(0))
        }
        "NVARCHAR" => TargetType::NVarChar(match precision {
            Some(n) => Width::Chars(n.max(1)),
            None => Width::Max,
        }),
        "VARBINARY" => TargetType::VarBinary(match precision {
            Some(n) => Width::Chars(n.max(1)),
            None => Width::Max,
        }),
        "DATETIME2" => TargetType::DateTime2,
        // Unmappable name: coerce to a loadable default rather than
        // emitting a type the target parser rejects.
        _ => TargetType::NVarChar(Width::Chars(255)),
    }
}

/// Convenience: parse and map in one step.
pub fn map_text(text: &str) -> Option<TargetType> {
    parse_source_type(text).map(|src| map(&src))
}
