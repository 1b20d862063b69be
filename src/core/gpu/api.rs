//! Safe view of the vendor control library and the OS display-device source.
//!
//! Both are traits so the GPU node can be driven by the real bindings in
//! `platform` or by a scripted implementation in tests. Every call returns a
//! crate [`Result`]; a non-success status code from the library becomes
//! [`TelemonError::Control`](crate::error::TelemonError::Control).

use serde::{Deserialize, Serialize};

use crate::core::telemetry::TelemetrySnapshot;
use crate::error::Result;

macro_rules! opaque_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(usize);

        impl $name {
            pub fn new(raw: usize) -> Self {
                Self(raw)
            }

            pub fn raw(self) -> usize {
                self.0
            }
        }
    };
}

opaque_handle!(
    /// Library-owned reference to one adapter. Never freed by this crate.
    AdapterHandle
);
opaque_handle!(
    /// Library-owned reference to one frequency domain of an adapter.
    FrequencyHandle
);
opaque_handle!(
    /// Library-owned reference to one fan of an adapter.
    FanHandle
);

/// Device type reported by the property query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    Graphics,
    Display,
    Other(u32),
}

impl DeviceType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => DeviceType::Graphics,
            2 => DeviceType::Display,
            other => DeviceType::Other(other),
        }
    }
}

/// Static adapter properties, captured once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProperties {
    pub name: String,
    pub pci_vendor_id: u32,
    pub pci_device_id: u32,
    pub rev_id: u32,
    pub driver_version: u64,
    pub device_type: DeviceType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrequencyDomain {
    Gpu,
    Memory,
    Other(u32),
}

impl FrequencyDomain {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => FrequencyDomain::Gpu,
            1 => FrequencyDomain::Memory,
            other => FrequencyDomain::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyProperties {
    pub domain: FrequencyDomain,
    pub can_control: bool,
    pub min: f64,
    pub max: f64,
}

/// Live state of a frequency domain. Negative values mean "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyState {
    pub current_voltage: f64,
    pub request: f64,
    pub tdp: f64,
    pub efficient: f64,
    pub actual: f64,
    pub throttle_reasons: u32,
}

/// The vendor control library, one method per foreign call.
///
/// Enumerations keep the library's two-phase shape: a `*_count` probe with
/// no buffer, then an `enum_*` fill sized by the caller.
pub trait ControlApi: Send + Sync {
    fn enumerate_adapters(&self) -> Result<Vec<AdapterHandle>>;

    fn device_properties(&self, adapter: AdapterHandle) -> Result<DeviceProperties>;

    fn power_telemetry(&self, adapter: AdapterHandle) -> Result<TelemetrySnapshot>;

    fn frequency_domain_count(&self, adapter: AdapterHandle) -> Result<u32>;

    fn enum_frequency_domains(
        &self,
        adapter: AdapterHandle,
        count: u32,
    ) -> Result<Vec<FrequencyHandle>>;

    fn frequency_properties(&self, domain: FrequencyHandle) -> Result<FrequencyProperties>;

    fn frequency_state(&self, domain: FrequencyHandle) -> Result<FrequencyState>;

    fn fan_count(&self, adapter: AdapterHandle) -> Result<u32>;

    fn enum_fans(&self, adapter: AdapterHandle, count: u32) -> Result<Vec<FanHandle>>;

    /// Current fan speed in RPM; negative when the driver has no reading.
    fn fan_speed_rpm(&self, fan: FanHandle) -> Result<i32>;
}

/// Memory accounting for one OS display device. Sizes are in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayDeviceRecord {
    pub identifier: String,
    pub integrated: bool,
    pub dedicated_memory_limit: u64,
    pub dedicated_memory_used: u64,
    pub video_memory_limit: u64,
}

/// OS-level display-device enumeration, independent of the vendor library.
pub trait DisplayDeviceSource: Send + Sync {
    fn device_identifiers(&self) -> Result<Vec<String>>;

    fn device_info(&self, identifier: &str) -> Result<DisplayDeviceRecord>;
}
