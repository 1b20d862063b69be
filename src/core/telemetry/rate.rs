//! Counter-to-rate conversion.
//!
//! Energy and activity counters only grow; the quantity a consumer wants is
//! their slope between two polls. Each rate metric owns one [`RateState`]
//! holding the previous raw reading and the time it was taken.
//!
//! The previous reading is overwritten on every observation, including the
//! ones that emit nothing, so a gap never leaves a stale baseline behind.

use serde::{Deserialize, Serialize};

use super::snapshot::TelemetrySnapshot;
use super::value::TelemetryItem;

/// How a raw counter becomes a sensor value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Energy delta over time, clamped at zero.
    PowerFromEnergy,
    /// Busy-time delta over time as a percentage; a decreasing counter is
    /// reported as unsupported for that tick.
    UtilizationFromActivity,
    /// Instantaneous bandwidth normalized to bytes per second.
    BandwidthFromCounter,
}

/// Every snapshot counter that goes through a [`Conversion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateMetric {
    GpuPower,
    TotalCardPower,
    GlobalActivity,
    RenderComputeActivity,
    MediaActivity,
    VramReadBandwidth,
    VramWriteBandwidth,
}

const METRIC_COUNT: usize = 7;

impl RateMetric {
    pub const ALL: [RateMetric; METRIC_COUNT] = [
        RateMetric::GpuPower,
        RateMetric::TotalCardPower,
        RateMetric::GlobalActivity,
        RateMetric::RenderComputeActivity,
        RateMetric::MediaActivity,
        RateMetric::VramReadBandwidth,
        RateMetric::VramWriteBandwidth,
    ];

    pub fn conversion(self) -> Conversion {
        match self {
            RateMetric::GpuPower | RateMetric::TotalCardPower => Conversion::PowerFromEnergy,
            RateMetric::GlobalActivity
            | RateMetric::RenderComputeActivity
            | RateMetric::MediaActivity => Conversion::UtilizationFromActivity,
            RateMetric::VramReadBandwidth | RateMetric::VramWriteBandwidth => {
                Conversion::BandwidthFromCounter
            }
        }
    }

    /// The snapshot field this metric reads.
    pub fn item(self, snapshot: &TelemetrySnapshot) -> &TelemetryItem {
        match self {
            RateMetric::GpuPower => &snapshot.gpu_energy,
            RateMetric::TotalCardPower => &snapshot.total_card_energy,
            RateMetric::GlobalActivity => &snapshot.global_activity,
            RateMetric::RenderComputeActivity => &snapshot.render_compute_activity,
            RateMetric::MediaActivity => &snapshot.media_activity,
            RateMetric::VramReadBandwidth => &snapshot.vram_read_bandwidth,
            RateMetric::VramWriteBandwidth => &snapshot.vram_write_bandwidth,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Previous observation of one rate metric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateState {
    pub last_raw: Option<f64>,
    pub last_timestamp: Option<f64>,
}

impl RateState {
    /// Seconds (or whatever unit the timestamps use) since the last observation.
    pub fn elapsed(&self, now: f64) -> Option<f64> {
        self.last_timestamp.map(|last| now - last)
    }
}

/// Power from an energy counter: `(current - last) / dt`, never negative.
pub fn power_from_energy(current: Option<f64>, last: Option<f64>, dt: Option<f64>) -> Option<f64> {
    let (current, last, dt) = (current?, last?, dt?);
    if dt <= 0.0 {
        return None;
    }
    let power = (current - last) / dt;
    if power.is_nan() {
        return None;
    }
    Some(power.max(0.0))
}

/// Utilization percentage from a busy-time counter.
///
/// A negative delta (reset or wraparound) is unsupported for this tick rather
/// than a negative or wrapped value.
pub fn utilization_from_activity(
    current: Option<f64>,
    last: Option<f64>,
    dt: Option<f64>,
) -> Option<f64> {
    let (current, last, dt) = (current?, last?, dt?);
    if dt <= 0.0 {
        return None;
    }
    let delta = current - last;
    if delta.is_nan() || delta < 0.0 {
        return None;
    }
    Some((delta / dt * 100.0).clamp(0.0, 100.0))
}

/// Bandwidth in bytes per second from a bandwidth item.
pub fn bandwidth_from_counter(item: &TelemetryItem) -> Option<f64> {
    let value = item.reading()?;
    if value < 0.0 {
        return None;
    }
    Some(value * item.unit.bandwidth_multiplier())
}

/// Fixed table of [`RateState`], one per [`RateMetric`].
#[derive(Debug, Clone, Default)]
pub struct RateTracker {
    states: [RateState; METRIC_COUNT],
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, metric: RateMetric) -> RateState {
        self.states[metric.index()]
    }

    /// Feed one raw item taken at `now` and return the converted value, if any.
    pub fn observe(&mut self, metric: RateMetric, item: &TelemetryItem, now: f64) -> Option<f64> {
        let state = &mut self.states[metric.index()];
        let current = item.reading();
        let dt = state.elapsed(now);

        let value = match metric.conversion() {
            Conversion::PowerFromEnergy => power_from_energy(current, state.last_raw, dt),
            Conversion::UtilizationFromActivity => {
                utilization_from_activity(current, state.last_raw, dt)
            }
            Conversion::BandwidthFromCounter => bandwidth_from_counter(item),
        };

        state.last_raw = current;
        state.last_timestamp = Some(now);

        value
    }

    /// Run every metric of `snapshot` through [`observe`](Self::observe).
    pub fn observe_snapshot(
        &mut self,
        snapshot: &TelemetrySnapshot,
        now: f64,
    ) -> [(RateMetric, Option<f64>); METRIC_COUNT] {
        RateMetric::ALL.map(|metric| (metric, self.observe(metric, metric.item(snapshot), now)))
    }
}
