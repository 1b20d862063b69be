//! Telemetry value decoding.
//!
//! Every counter reported by the control library arrives as a tagged item:
//! a "supported" flag, a unit, a data type tag and an 8-byte payload. The
//! platform layer turns the raw union into a [`TelemetryValue`] once, at the
//! foreign boundary; everything past that point works on this sum type.

use serde::{Deserialize, Serialize};

/// Decoded payload of a telemetry item, keyed by its declared data type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TelemetryValue {
    Float(f32),
    Double(f64),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    UInt16(u16),
    Int16(i16),
    UInt8(u8),
    Int8(i8),
    /// Data type tag the decoder does not understand (strings, unknown).
    Unknown(u32),
}

impl TelemetryValue {
    /// Widen the payload to `f64`. Unknown tags decode to NaN.
    pub fn as_f64(self) -> f64 {
        match self {
            TelemetryValue::Float(v) => v as f64,
            TelemetryValue::Double(v) => v,
            TelemetryValue::UInt32(v) => v as f64,
            TelemetryValue::Int32(v) => v as f64,
            TelemetryValue::UInt64(v) => v as f64,
            TelemetryValue::Int64(v) => v as f64,
            TelemetryValue::UInt16(v) => v as f64,
            TelemetryValue::Int16(v) => v as f64,
            TelemetryValue::UInt8(v) => v as f64,
            TelemetryValue::Int8(v) => v as f64,
            TelemetryValue::Unknown(_) => f64::NAN,
        }
    }
}

/// Unit attached to a telemetry item.
///
/// Only the bandwidth units change how a value is interpreted; the rest are
/// kept so reports can show what the driver claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelemetryUnit {
    FrequencyMhz,
    OperationsGts,
    OperationsMts,
    VoltageVolts,
    PowerWatts,
    TemperatureCelsius,
    EnergyJoules,
    TimeSeconds,
    MemoryBytes,
    AngularSpeedRpm,
    PowerMilliwatts,
    Percent,
    MemSpeedGbps,
    VoltageMillivolts,
    BandwidthMbps,
    Unknown,
}

impl TelemetryUnit {
    /// Map the library's unit enumerator onto [`TelemetryUnit`].
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => TelemetryUnit::FrequencyMhz,
            1 => TelemetryUnit::OperationsGts,
            2 => TelemetryUnit::OperationsMts,
            3 => TelemetryUnit::VoltageVolts,
            4 => TelemetryUnit::PowerWatts,
            5 => TelemetryUnit::TemperatureCelsius,
            6 => TelemetryUnit::EnergyJoules,
            7 => TelemetryUnit::TimeSeconds,
            8 => TelemetryUnit::MemoryBytes,
            9 => TelemetryUnit::AngularSpeedRpm,
            10 => TelemetryUnit::PowerMilliwatts,
            11 => TelemetryUnit::Percent,
            12 => TelemetryUnit::MemSpeedGbps,
            13 => TelemetryUnit::VoltageMillivolts,
            14 => TelemetryUnit::BandwidthMbps,
            _ => TelemetryUnit::Unknown,
        }
    }

    /// Multiplier that brings a bandwidth reading to bytes per second.
    ///
    /// Memory-speed convention: MB/s is 1024², GB/s is 1024³. Any other unit
    /// passes through unchanged.
    pub fn bandwidth_multiplier(self) -> f64 {
        match self {
            TelemetryUnit::BandwidthMbps => 1024.0 * 1024.0,
            TelemetryUnit::MemSpeedGbps => 1024.0 * 1024.0 * 1024.0,
            _ => 1.0,
        }
    }
}

/// One counter from a telemetry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryItem {
    pub supported: bool,
    pub unit: TelemetryUnit,
    pub value: TelemetryValue,
}

impl TelemetryItem {
    pub fn new(unit: TelemetryUnit, value: TelemetryValue) -> Self {
        Self {
            supported: true,
            unit,
            value,
        }
    }

    /// An item the driver flagged as not supported on this device.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            unit: TelemetryUnit::Unknown,
            value: TelemetryValue::Unknown(0),
        }
    }

    /// Decode the item to `f64`.
    ///
    /// Unsupported items never look at the payload and yield NaN, which
    /// callers treat as "no value".
    pub fn decode(&self) -> f64 {
        if !self.supported {
            return f64::NAN;
        }
        self.value.as_f64()
    }

    /// [`decode`](Self::decode) with NaN folded into `None`.
    pub fn reading(&self) -> Option<f64> {
        let value = self.decode();
        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }
}

impl Default for TelemetryItem {
    fn default() -> Self {
        Self::unsupported()
    }
}
