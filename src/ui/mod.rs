// UI and formatting module

pub mod formatters;

// Re-export commonly used items for cleaner imports
pub use formatters::{format_size, format_time, format_value, print_identity, print_report, print_reports};
