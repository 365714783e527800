//! Conversion pipeline driver.
//!
//! Single-threaded: scan a statement, classify it, rewrite it, route it
//! to the right output stream. Only unreadable input or unwritable
//! output abort a run; every per-statement problem is recovered by the
//! guard and counted.

use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::classifier::{classify, StatementKind};
use crate::context::{ConversionContext, RunStats};
use crate::partition::OutputPartitioner;
use crate::progress::ProgressReader;
use crate::rewriter::{data, schema, Anomaly, RecoveryGuard, TableCatalog};
use crate::scanner::{determine_buffer_size, StatementScanner};

/// Compression format detected from the input file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
}

impl Compression {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz" | "gzip") => Compression::Gzip,
            _ => Compression::None,
        }
    }

    pub fn wrap_reader(self, reader: Box<dyn Read>) -> Box<dyn Read> {
        match self {
            Compression::None => reader,
            Compression::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
        }
    }
}

/// Configuration for one convert run.
#[derive(Debug)]
pub struct ConvertConfig {
    pub input: PathBuf,
    /// Output path prefix; derived from the input name when absent.
    pub output_base: Option<String>,
    pub context: ConversionContext,
    pub progress: bool,
    pub dry_run: bool,
}

/// Output base derived from the input file name: the stem with a
/// `_sqlserver` suffix, alongside the input.
pub fn default_output_base(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let stem = stem.strip_suffix(".sql").unwrap_or(stem.as_str());
    match input.parent() {
        Some(parent) if parent != Path::new("") => parent
            .join(format!("{}_sqlserver", stem))
            .to_string_lossy()
            .into_owned(),
        _ => format!("{}_sqlserver", stem),
    }
}

/// Run the full conversion pipeline.
pub fn run(config: ConvertConfig) -> anyhow::Result<RunStats> {
    let file = File::open(&config.input)
        .map_err(|e| anyhow::anyhow!("cannot open {}: {}", config.input.display(), e))?;
    let file_size = file.metadata()?.len();

    let progress_bar = if config.progress {
        let pb = ProgressBar::new(file_size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.green} {bytes}/{total_bytes} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message("Converting...");
        Some(pb)
    } else {
        None
    };

    let reader: Box<dyn Read> = match &progress_bar {
        Some(pb) => {
            let pb = pb.clone();
            Box::new(ProgressReader::new(file, move |bytes| {
                pb.set_position(bytes)
            }))
        }
        None => Box::new(file),
    };
    let reader = Compression::from_path(&config.input).wrap_reader(reader);

    let base = config
        .output_base
        .clone()
        .unwrap_or_else(|| default_output_base(&config.input));
    let mut partitioner = OutputPartitioner::new(&base, config.context.chunk_lines)
        .with_dry_run(config.dry_run);

    let mut scanner = StatementScanner::new(reader, determine_buffer_size(file_size));
    let mut guard = RecoveryGuard::new();
    let mut catalog = TableCatalog::new();
    let mut stats = RunStats::default();
    let ctx = &config.context;

    while let Some(raw) = scanner.read_statement()? {
        let text = String::from_utf8_lossy(&raw).into_owned();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        stats.statements_seen += 1;

        // Residue of a duplicated closing tail (`...'););`): the scanner
        // ends the statement at its first `;`, so the extra `);` arrives
        // as a span of its own. Dropped, not forwarded.
        if trimmed == ")" || trimmed == ");" {
            guard.record(&Anomaly::Malformed {
                reason: "duplicated closing tail".to_string(),
            });
            stats.statements_skipped += 1;
            continue;
        }

        if let Some(pb) = &progress_bar {
            if stats.statements_seen % 1000 == 0 {
                pb.set_message(format!("{} statements", stats.statements_seen));
            }
        }

        if scanner.ended_inside_literal() {
            let comment = guard.preserve_comment(
                &Anomaly::UnterminatedLiteral,
                &text,
                "unterminated at end of input, commented out",
            );
            partitioner.write_comment(&comment)?;
            stats.statements_commented += 1;
            continue;
        }

        match classify(&text) {
            StatementKind::SchemaDefinition => match schema::rewrite(&text, &ctx.schema) {
                Ok(rewrite) => {
                    catalog.insert(
                        rewrite.table.name.to_uppercase(),
                        rewrite.table.columns.clone(),
                    );
                    partitioner.write_definition(&format!("{}\nGO\n", rewrite.block))?;
                    stats.tables_rewritten += 1;
                }
                Err(anomaly) => {
                    let comment = guard.skip_comment(&anomaly, &text);
                    partitioner.write_definition(&comment)?;
                    stats.statements_skipped += 1;
                }
            },
            StatementKind::DataInsertion => {
                match data::rewrite(&text, &ctx.schema, &catalog, ctx.truncate_to) {
                    Ok(rewrite) => {
                        for anomaly in &rewrite.value_anomalies {
                            guard.record(anomaly);
                        }
                        partitioner.write_insert(&rewrite.statement)?;
                        stats.inserts_rewritten += 1;
                    }
                    Err(anomaly) => {
                        let comment = guard.skip_comment(&anomaly, &text);
                        partitioner.write_insert(&comment)?;
                        stats.statements_skipped += 1;
                    }
                }
            }
            StatementKind::Administrative => {
                let comment = guard.preserve_comment(
                    &Anomaly::UnsupportedStatement,
                    &text,
                    "Oracle specific, commented out",
                );
                partitioner.write_comment(&comment)?;
                stats.statements_commented += 1;
            }
            StatementKind::Unrecognized => {
                let comment = guard.preserve_comment(
                    &Anomaly::UnsupportedStatement,
                    &text,
                    "no SQL Server translation, commented out",
                );
                partitioner.write_comment(&comment)?;
                stats.statements_commented += 1;
            }
        }
    }

    partitioner.close()?;
    stats.chunks_written = partitioner.chunks_written();
    stats.anomalies = guard.counts().clone();

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!("{} statements", stats.statements_seen));
    }

    Ok(stats)
}

/// Configuration for the fix pass over an already-converted definitions
/// file.
#[derive(Debug)]
pub struct FixConfig {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub schema: String,
}

/// Default fix output: the input stem with a `_fixed.sql` suffix.
pub fn default_fix_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    match input.parent() {
        Some(parent) if parent != Path::new("") => {
            parent.join(format!("{}_fixed.sql", stem))
        }
        _ => PathBuf::from(format!("{}_fixed.sql", stem)),
    }
}

/// Re-run the schema rewriting step over a definitions file, preserving
/// every byte outside the rewritable blocks. A file with no damage comes
/// out byte-identical.
pub fn fix(config: FixConfig) -> anyhow::Result<RunStats> {
    let file = File::open(&config.input)
        .map_err(|e| anyhow::anyhow!("cannot open {}: {}", config.input.display(), e))?;
    let file_size = file.metadata()?.len();
    let reader =
        Compression::from_path(&config.input).wrap_reader(Box::new(file) as Box<dyn Read>);

    let output = config
        .output
        .unwrap_or_else(|| default_fix_output(&config.input));
    let mut writer = BufWriter::with_capacity(256 * 1024, File::create(&output)?);

    let mut scanner = StatementScanner::new(reader, determine_buffer_size(file_size));
    let mut stats = RunStats::default();

    while let Some(raw) = scanner.read_statement()? {
        let text = String::from_utf8_lossy(&raw).into_owned();
        stats.statements_seen += 1;

        match schema::block_start(&text) {
            Some(start) => match schema::rewrite(&text[start..], &config.schema) {
                Ok(rewrite) => {
                    writer.write_all(text[..start].as_bytes())?;
                    writer.write_all(rewrite.block.as_bytes())?;
                    stats.tables_rewritten += 1;
                }
                Err(_) => {
                    writer.write_all(text.as_bytes())?;
                    stats.statements_skipped += 1;
                }
            },
            None => {
                writer.write_all(text.as_bytes())?;
            }
        }
    }

    writer.flush()?;
    Ok(stats)
}
