mod commands;
mod logging;
mod output;
mod progress;

use std::io::{self, Write};
use std::path::Path;
use std::process;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, OutputFormat};
use dotenv::dotenv;
use filetypestats_core::storage::Database;
use filetypestats_core::{AppConfig, ScanEngine, StatsEngine};
use progress::CliReporter;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match filetypestats_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();
    let db_path = args.db.clone().unwrap_or_else(|| config.db_path.clone());

    let result = match args.command {
        Some(Commands::Scan { rm, dirs }) => run_scan(config, &db_path, rm, dirs),
        Some(Commands::Show { format, patterns }) => run_show(&db_path, &patterns, format),
        Some(Commands::Categories) => run_categories(&db_path),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            Ok(())
        }
        Some(Commands::TruncateDb) => run_truncate(&db_path),
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run_scan(mut config: AppConfig, db_path: &str, rm: bool, dirs: Vec<String>) -> anyhow::Result<()> {
    if !dirs.is_empty() {
        config.root_paths = dirs;
    }
    if config.root_paths.is_empty() {
        bail!("no directories to scan: pass them as arguments or set root_paths");
    }

    info!("Scanning {:?} to database {}", config.root_paths, db_path);
    let db = Database::open_with_options(db_path, rm)
        .with_context(|| format!("opening {}", db_path))?;
    let result = ScanEngine::new(config).scan(&db, &CliReporter::new())?;
    db.close()?;

    info!(
        "Scan: {}, DB: {}, {} entries",
        format!("{:.2}s", result.scan_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.db_write_duration.as_secs_f64()).green(),
        result.total_entries,
    );
    println!("Scan totals:");
    output::write_stats(&mut io::stdout().lock(), &result.stats, OutputFormat::Table)
}

fn open_existing(db_path: &str) -> anyhow::Result<Database> {
    if !Path::new(db_path).exists() {
        bail!("database {} does not exist, run `scan` first", db_path);
    }
    Database::open(db_path).with_context(|| format!("opening {}", db_path))
}

fn run_show(db_path: &str, patterns: &[String], format: OutputFormat) -> anyhow::Result<()> {
    let db = open_existing(db_path)?;

    let start = Instant::now();
    let stats = StatsEngine::new(&db).summarize(patterns)?;
    info!("Query took {:.2?}", start.elapsed());

    if stats.is_empty() {
        eprintln!("No matching entries for {}", patterns.join(", "));
        return Ok(());
    }
    output::write_stats(&mut io::stdout().lock(), &stats, format)
}

fn run_categories(db_path: &str) -> anyhow::Result<()> {
    let db = open_existing(db_path)?;
    for category in db.categories()? {
        println!("{:>3} {}", category.id, category.name);
    }
    Ok(())
}

fn run_truncate(db_path: &str) -> anyhow::Result<()> {
    let db = open_existing(db_path)?;
    let confirmed = prompt_confirm(
        &format!("Are you SURE you want to delete all statistics in {}?", db_path),
        Some(false),
    )?;
    if !confirmed {
        return Ok(());
    }
    db.truncate_file_info()?;
    println!("All statistics deleted");
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(default.unwrap_or(false));
        }

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_existing_does_not_create_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let path = path.to_str().unwrap();

        assert!(open_existing(path).is_err());
        assert!(run_categories(path).is_err());
        assert!(run_truncate(path).is_err());
        assert!(!Path::new(path).exists());
    }

    #[test]
    fn test_open_existing_opens_scanned_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fts.db");
        let path = path.to_str().unwrap();
        Database::open(path).unwrap().close().unwrap();

        let db = open_existing(path).unwrap();
        assert!(!db.categories().unwrap().is_empty());
    }
}
