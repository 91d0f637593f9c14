// Copyright 2023 Remi Bernotavicius

use clap::Parser;
use std::path::PathBuf;

mod assets;
mod cli;
mod database;
mod export;
mod import;
mod repository;

type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
#[command(about = "Recipes, patients and daily menus for a nutrition practice")]
struct Args {
    /// Where the database and stored files live. Defaults to the user's data directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = cli::LogLevel::Info)]
    log_level: cli::LogLevel,

    #[command(subcommand)]
    commands: cli::Commands,
}

/// This is where the database and other user-data lives on-disk. On Linux it should be like:
/// `~/.local/share/menu_planner/`
fn data_path(overridden: Option<PathBuf>) -> Result<PathBuf> {
    let path = match overridden {
        Some(path) => path,
        None => directories::BaseDirs::new()
            .ok_or("failed to get user home directory")?
            .data_dir()
            .join("menu_planner"),
    };
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

fn main() -> Result<()> {
    let args = Args::parse();
    simple_logger::SimpleLogger::new()
        .with_level(args.log_level.into())
        .init()?;

    let data_dir = data_path(args.data_dir)?;
    let mut conn = database::establish_connection(data_dir.join("data.sqlite"))?;
    cli::run(&mut conn, &data_dir, args.commands)
}
