mod convert;
mod fix;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ora2mssql")]
#[command(version)]
#[command(about = "Translate Oracle SQL exports to SQL Server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert an Oracle export into SQL Server definition and insert files
    Convert {
        /// Input SQL file (supports .gz compression)
        file: PathBuf,

        /// Output path prefix (default: input name with _sqlserver suffix)
        #[arg(short, long)]
        output: Option<String>,

        /// Schema substituted when a statement carries none
        #[arg(long, default_value = "ADMIN")]
        schema: String,

        /// Line threshold per insert chunk file
        #[arg(long, default_value_t = 100_000)]
        chunk_lines: u64,

        /// Character bound oversized literals are cut to
        #[arg(long, default_value_t = 100)]
        truncate: usize,

        /// Show progress during conversion
        #[arg(short, long)]
        progress: bool,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,

        /// Preview without writing files (dry run)
        #[arg(long)]
        dry_run: bool,
    },

    /// Re-run separator repair over an already-converted definitions file
    Fix {
        /// Converted definitions file
        file: PathBuf,

        /// Output file (default: input name with _fixed suffix)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Schema substituted when a statement carries none
        #[arg(long, default_value = "ADMIN")]
        schema: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Convert {
            file,
            output,
            schema,
            chunk_lines,
            truncate,
            progress,
            json,
            dry_run,
        } => convert::run(
            file,
            output,
            schema,
            chunk_lines,
            truncate,
            progress,
            json,
            dry_run,
        ),
        Commands::Fix {
            file,
            output,
            schema,
        } => fix::run(file, output, schema),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "ora2mssql", &mut io::stdout());
            Ok(())
        }
    }
}
