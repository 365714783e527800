//! Fix command CLI handler.

use std::path::PathBuf;

use crate::pipeline::{self, FixConfig};

pub fn run(file: PathBuf, output: Option<PathBuf>, schema: String) -> anyhow::Result<()> {
    let out_path = output
        .clone()
        .unwrap_or_else(|| pipeline::default_fix_output(&file));

    let stats = pipeline::fix(FixConfig {
        input: file,
        output,
        schema,
    })?;

    eprintln!(
        "Fixed {} table definitions ({} skipped) → {}",
        stats.tables_rewritten,
        stats.statements_skipped,
        out_path.display()
    );
    Ok(())
}
