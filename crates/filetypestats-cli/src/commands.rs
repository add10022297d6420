use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "filetypestats")]
#[command(about = "Per-category file statistics for directory trees", long_about = None)]
pub struct Cli {
    /// Database in which the scan result is stored (defaults to the configured db_path)
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan directories recursively and store statistics per entry
    Scan {
        /// Remove the database before scanning
        #[arg(long)]
        rm: bool,
        /// Directories to scan (defaults to the configured root_paths)
        dirs: Vec<String>,
    },
    /// Show totals from the database for the given path patterns.
    ///
    /// A pattern ending in `**` matches that directory and
    /// everything below it (quote it for the shell); any other pattern
    /// matches one exact path.
    Show {
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// List the file categories known to the database
    Categories,
    /// Print configuration values
    PrintConfig,
    /// Delete all stored file statistics
    TruncateDb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}
