// Platform-specific code module

pub mod display;
pub mod igcl;

// Re-exports for clean imports
pub use display::{system_display_devices, NoDisplayDevices};
#[cfg(windows)]
pub use display::D3dkmtDisplayDevices;
pub use igcl::ControlLibrary;
