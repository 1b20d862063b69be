//! Monitor command handler.
//!
//! Polls every accepted adapter until Ctrl-C or the requested number of
//! polls, printing either a colored table or one JSON line per poll.

use anyhow::{Context, Result};
use std::ops::ControlFlow;

use super::open_monitor;
use crate::core::hardware::HardwareReport;
use crate::core::runtime;
use crate::core::Config;
use crate::ui::print_reports;

/// Options for one monitor run; unset fields fall back to the config
#[derive(Debug, Clone, Default)]
pub struct MonitorOptions {
    pub interval_ms: Option<u64>,
    pub json: bool,
    pub count: Option<u64>,
}

/// Execute the monitor command
pub fn execute(config: &Config, options: &MonitorOptions) -> Result<()> {
    let mut effective = config.clone();
    if let Some(ms) = options.interval_ms {
        effective.set_poll_interval(ms);
    }
    let json = options.json || effective.json_output;
    let period = effective.poll_interval();

    let mut monitor = open_monitor(&effective)?;
    let (_shutdown_tx, shutdown_rx) =
        runtime::ctrlc_shutdown().context("Failed to install Ctrl-C handler")?;

    let mut polls = 0u64;
    let mut on_report = |reports: &[HardwareReport]| {
        polls += 1;
        if let Err(e) = emit(reports, polls, json) {
            log::error!("Failed to write report: {}", e);
            return ControlFlow::Break(());
        }
        match options.count {
            Some(limit) if polls >= limit => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    };

    runtime::run_blocking(&mut monitor, period, shutdown_rx, &mut on_report)?;
    Ok(())
}

fn emit(reports: &[HardwareReport], poll: u64, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(reports)?);
    } else {
        print_reports(reports, poll);
    }
    Ok(())
}

