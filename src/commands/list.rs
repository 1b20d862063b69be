use anyhow::Result;
use colored::Colorize;

use super::open_monitor;
use crate::core::Config;
use crate::ui::print_identity;

/// List accepted adapters with their static identity
pub fn execute(config: &Config, json: bool) -> Result<()> {
    let monitor = open_monitor(config)?;

    if json {
        let identities: Vec<_> = monitor.gpus().iter().filter_map(|g| g.identity()).collect();
        println!("{}", serde_json::to_string_pretty(&identities)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("{} Intel GPU(s) found", monitor.len()).bold()
    );
    for gpu in monitor.gpus() {
        println!();
        print_identity(gpu);
    }
    Ok(())
}
