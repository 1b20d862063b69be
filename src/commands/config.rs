use anyhow::{Context, Result};
use colored::Colorize;

use crate::core::config::MIN_POLL_INTERVAL_MS;
use crate::core::Config;
use crate::platform::igcl::default_library_name;

pub fn handle_config(matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => show(),
        Some(("set-interval", sub_matches)) => {
            let ms = sub_matches
                .get_one::<u64>("ms")
                .copied()
                .context("Interval argument is required")?;
            set_interval(ms)
        }
        Some(("set-library", sub_matches)) => {
            let path = sub_matches.get_one::<String>("path").cloned();
            set_library(path)
        }
        _ => {
            println!("Use 'telemon config --help' for more information.");
            Ok(())
        }
    }
}

fn show() -> Result<()> {
    let config = Config::load()?;
    let path = Config::get_config_path()?;

    println!("{} {}", "Config file:".bold(), path.display().to_string().dimmed());
    println!("  {:<16} {} ms", "Poll interval:", config.poll_interval_ms);
    println!(
        "  {:<16} {}",
        "Library:",
        config
            .get_library_path()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} (default)", default_library_name()))
    );
    println!("  {:<16} {}", "JSON output:", config.json_output);
    Ok(())
}

fn set_interval(ms: u64) -> Result<()> {
    let mut config = Config::load()?;
    config.set_poll_interval(ms);
    config.save()?;

    if ms < MIN_POLL_INTERVAL_MS {
        println!(
            "{}",
            format!("Interval raised to the minimum of {} ms", MIN_POLL_INTERVAL_MS).yellow()
        );
    }
    println!(
        "{} Poll interval set to {} ms",
        "✓".green(),
        config.poll_interval_ms
    );
    Ok(())
}

fn set_library(path: Option<String>) -> Result<()> {
    let mut config = Config::load()?;
    config.set_library_path(path);
    config.save()?;

    match config.get_library_path() {
        Some(path) => println!("{} Control library set to {}", "✓".green(), path),
        None => println!("{} Control library reset to default", "✓".green()),
    }
    Ok(())
}
