use serde::{Deserialize, Serialize};

use super::value::TelemetryItem;

/// One synchronous read of the adapter's power telemetry.
///
/// Replaced wholesale on every poll; only the counters this crate turns into
/// sensors are carried over from the foreign structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub timestamp: TelemetryItem,

    pub gpu_energy: TelemetryItem,
    pub total_card_energy: TelemetryItem,

    pub gpu_temperature: TelemetryItem,
    pub vram_temperature: TelemetryItem,

    pub gpu_clock: TelemetryItem,
    pub vram_clock: TelemetryItem,

    pub gpu_voltage: TelemetryItem,
    pub vram_voltage: TelemetryItem,

    pub global_activity: TelemetryItem,
    pub render_compute_activity: TelemetryItem,
    pub media_activity: TelemetryItem,

    pub vram_read_bandwidth: TelemetryItem,
    pub vram_write_bandwidth: TelemetryItem,
}
