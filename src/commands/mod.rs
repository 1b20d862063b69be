// Command handlers module
pub mod config;
pub mod list;
pub mod monitor;

// Re-exports for cleaner imports
pub use config::handle_config;
pub use list::execute as list;
pub use monitor::execute as monitor;

use anyhow::{Context, Result};

use crate::core::{Config, HardwareMonitor};
use crate::platform::{system_display_devices, ControlLibrary};

/// Load the control library and build the monitor for every accepted adapter
pub fn open_monitor(config: &Config) -> Result<HardwareMonitor> {
    let library = ControlLibrary::shared(config.get_library_path())
        .context("Failed to load the Intel Graphics Control Library")?;

    HardwareMonitor::open(library, system_display_devices())
        .context("Failed to open Intel GPU adapters")
}

