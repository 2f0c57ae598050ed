//! Maven Mock Repository CLI
//!
//! Browses the tree a repository configuration serves, exactly as an HTTP
//! front end would see it.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use std::io::{self, Write};

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    tracing::debug!("Verbose mode enabled");

    let cwd = std::env::current_dir()?;
    let config = context::resolve_config(&cli.source, &cwd)?;
    let fs = config.serve()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Ls { path, long } => commands::run_ls(fs.as_ref(), &path, long, &mut out)?,
        Commands::Cat { path } => commands::run_cat(fs.as_ref(), &path, &mut out)?,
        Commands::Stat { path } => commands::run_stat(fs.as_ref(), &path, &mut out)?,
        Commands::Tree { path, depth } => commands::run_tree(fs.as_ref(), &path, depth, &mut out)?,
        Commands::Put { path, file } => commands::run_put(fs.as_ref(), &path, &cwd.join(file), &mut out)?,
    }
    out.flush()?;
    Ok(())
}
