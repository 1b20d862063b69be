use serde::{Deserialize, Serialize};
use std::fmt;

use super::sensor::{Sensor, SensorReading};

/// Kind of hardware node exposed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardwareType {
    GpuIntel,
}

impl fmt::Display for HardwareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A sensor-bearing hardware node.
///
/// `update` is driven by one caller thread; implementations provide no
/// internal locking and must not be updated concurrently.
pub trait Hardware: Send {
    fn identifier(&self) -> &str;

    fn name(&self) -> &str;

    fn hardware_type(&self) -> HardwareType;

    /// Refresh every sensor. Never fails; problems surface as sensors
    /// without a value.
    ///
    /// Errors returned by the underlying sources are caught and logged. A
    /// source that panics is not caught and unwinds through this call.
    fn update(&mut self);

    fn sensors(&self) -> Vec<&Sensor>;

    /// Snapshot of the node with its activated sensors only.
    fn report(&self) -> HardwareReport {
        HardwareReport {
            identifier: self.identifier().to_string(),
            name: self.name().to_string(),
            hardware_type: self.hardware_type(),
            sensors: self
                .sensors()
                .into_iter()
                .filter(|s| s.is_active())
                .map(Sensor::reading)
                .collect(),
        }
    }
}

/// Serializable view of a [`Hardware`] node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareReport {
    pub identifier: String,
    pub name: String,
    pub hardware_type: HardwareType,
    pub sensors: Vec<SensorReading>,
}
