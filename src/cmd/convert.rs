//! Convert command CLI handler.

use std::path::PathBuf;

use crate::context::{ConversionContext, RunStats};
use crate::pipeline::{self, ConvertConfig};

#[allow(clippy::too_many_arguments)]
pub fn run(
    file: PathBuf,
    output: Option<String>,
    schema: String,
    chunk_lines: u64,
    truncate: usize,
    progress: bool,
    json: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let config = ConvertConfig {
        input: file,
        output_base: output,
        context: ConversionContext {
            schema,
            truncate_to: truncate,
            chunk_lines,
        },
        progress,
        dry_run,
    };

    let stats = pipeline::run(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats, dry_run);
    }

    Ok(())
}

fn print_stats(stats: &RunStats, dry_run: bool) {
    eprintln!();
    eprintln!("Conversion Statistics:");
    eprintln!("  Statements seen: {}", stats.statements_seen);
    eprintln!("  Tables rewritten: {}", stats.tables_rewritten);
    eprintln!("  Inserts rewritten: {}", stats.inserts_rewritten);
    eprintln!("  Statements skipped: {}", stats.statements_skipped);
    eprintln!("  Statements commented: {}", stats.statements_commented);
    eprintln!("  Insert chunks: {}", stats.chunks_written);

    if stats.anomalies.total() > 0 {
        eprintln!();
        eprintln!("Anomalies ({}):", stats.anomalies.total());
        let a = &stats.anomalies;
        for (label, count) in [
            ("arity mismatches", a.arity_mismatch),
            ("unterminated literals", a.unterminated_literal),
            ("malformed statements", a.malformed),
            ("out-of-range numerics", a.out_of_range_numeric),
            ("oversized values", a.oversized_value),
            ("unsupported statements", a.unsupported_statement),
        ] {
            if count > 0 {
                eprintln!("  {}: {}", label, count);
            }
        }
    }

    if dry_run {
        eprintln!();
        eprintln!("(Dry run - no output written)");
    }
}
