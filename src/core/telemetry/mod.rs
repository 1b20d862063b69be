//! Vendor-neutral telemetry model: tagged counter items, the per-poll
//! snapshot, and the counter-to-rate conversions.

pub mod rate;
pub mod snapshot;
pub mod value;

pub use rate::{
    bandwidth_from_counter, power_from_energy, utilization_from_activity, Conversion, RateMetric,
    RateState, RateTracker,
};
pub use snapshot::TelemetrySnapshot;
pub use value::{TelemetryItem, TelemetryUnit, TelemetryValue};
