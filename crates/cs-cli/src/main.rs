use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cs_cli::commands::{
    days, history, import, move_entry, normalize, parse_time, reorder, set_start, show,
};
use cs_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(cs_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = cs_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

/// Opens the import source, `-` meaning stdin.
fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(Box::new(file))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut stdout = io::stdout().lock();

    match &cli.command {
        Some(Commands::ParseTime { text }) => {
            // Pure parsing, no config or database needed
            parse_time::run(&mut stdout, text)?;
        }
        Some(Commands::Import { file }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let input = open_input(file)?;
            import::run(&mut stdout, input, &mut db, &config.cascade()?, cli.dry_run)?;
        }
        Some(Commands::Days) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            days::run(&mut stdout, &db)?;
        }
        Some(Commands::Show { day, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            show::run(&mut stdout, &db, day, *json)?;
        }
        Some(Commands::Normalize { day }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            normalize::run(&mut stdout, &mut db, day, &config.cascade()?, cli.dry_run)?;
        }
        Some(Commands::Reorder {
            day,
            entry,
            from,
            to,
        }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            reorder::run(
                &mut stdout,
                &mut db,
                day,
                entry,
                *from,
                *to,
                &config.cascade()?,
                cli.dry_run,
            )?;
        }
        Some(Commands::Move { day, entry, track }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            move_entry::run(
                &mut stdout,
                &mut db,
                day,
                entry,
                track,
                &config.cascade()?,
                cli.dry_run,
            )?;
        }
        Some(Commands::SetStart { day, time }) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            set_start::run(&mut stdout, &mut db, day, time, &config.cascade()?, cli.dry_run)?;
        }
        Some(Commands::History { day }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            history::run(&mut stdout, &db, day)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
