use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of quantity a sensor slot measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorType {
    Temperature,
    Clock,
    Voltage,
    Power,
    Load,
    Throughput,
    SmallData,
    Fan,
}

impl SensorType {
    /// Unit suffix used when printing values of this type.
    pub fn unit(self) -> &'static str {
        match self {
            SensorType::Temperature => "°C",
            SensorType::Clock => "MHz",
            SensorType::Voltage => "V",
            SensorType::Power => "W",
            SensorType::Load => "%",
            SensorType::Throughput => "B/s",
            SensorType::SmallData => "MB",
            SensorType::Fan => "RPM",
        }
    }

    /// Path segment used in sensor identifiers.
    pub fn id_segment(self) -> &'static str {
        match self {
            SensorType::Temperature => "temperature",
            SensorType::Clock => "clock",
            SensorType::Voltage => "voltage",
            SensorType::Power => "power",
            SensorType::Load => "load",
            SensorType::Throughput => "throughput",
            SensorType::SmallData => "smalldata",
            SensorType::Fan => "fan",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A fixed-identity output cell holding the latest value of one quantity.
///
/// Name, type and index never change after construction. The value is
/// overwritten on every update, or cleared when the quantity is unsupported
/// for that poll.
#[derive(Debug, Clone)]
pub struct Sensor {
    name: String,
    index: usize,
    sensor_type: SensorType,
    identifier: String,
    value: Option<f32>,
    min: Option<f32>,
    max: Option<f32>,
    active: bool,
}

impl Sensor {
    pub fn new(name: &str, index: usize, sensor_type: SensorType, hardware_identifier: &str) -> Self {
        Self {
            name: name.to_string(),
            index,
            sensor_type,
            identifier: format!(
                "{}/{}/{}",
                hardware_identifier,
                sensor_type.id_segment(),
                index
            ),
            value: None,
            min: None,
            max: None,
            active: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn value(&self) -> Option<f32> {
        self.value
    }

    pub fn min(&self) -> Option<f32> {
        self.min
    }

    pub fn max(&self) -> Option<f32> {
        self.max
    }

    /// True once the slot has received at least one real value.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Store a new reading. NaN is treated the same as `None`.
    pub fn set_value(&mut self, value: Option<f32>) {
        match value.filter(|v| !v.is_nan()) {
            Some(v) => {
                self.value = Some(v);
                self.min = Some(self.min.map_or(v, |m| m.min(v)));
                self.max = Some(self.max.map_or(v, |m| m.max(v)));
                self.active = true;
            }
            None => self.value = None,
        }
    }

    /// Convenience for converters that work in `f64`.
    pub fn set_reading(&mut self, value: Option<f64>) {
        self.set_value(value.map(|v| v as f32));
    }

    pub fn reading(&self) -> SensorReading {
        SensorReading {
            identifier: self.identifier.clone(),
            name: self.name.clone(),
            sensor_type: self.sensor_type,
            index: self.index,
            value: self.value,
            min: self.min,
            max: self.max,
        }
    }
}

/// Serializable view of a [`Sensor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub identifier: String,
    pub name: String,
    pub sensor_type: SensorType,
    pub index: usize,
    pub value: Option<f32>,
    pub min: Option<f32>,
    pub max: Option<f32>,
}
