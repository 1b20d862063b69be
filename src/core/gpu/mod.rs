//! Intel discrete GPU telemetry.
//!
//! `api` describes the foreign calls as traits; the other modules are the
//! pieces the [`IntelDiscreteGpu`] node runs on every update.

pub mod api;
pub mod device;
pub mod fans;
pub mod frequency;
pub mod identity;
pub mod memory;

pub use api::{
    AdapterHandle, ControlApi, DeviceProperties, DeviceType, DisplayDeviceRecord,
    DisplayDeviceSource, FanHandle, FrequencyDomain, FrequencyHandle, FrequencyProperties,
    FrequencyState,
};
pub use device::{IntelDiscreteGpu, TickClock};
pub use identity::DeviceIdentity;
pub use memory::{MemoryReading, MemoryResolver};
