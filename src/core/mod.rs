// Core telemetry logic, independent of the foreign bindings

pub mod config;
pub mod gpu;
pub mod hardware;
pub mod monitor;
pub mod runtime;
pub mod sensor;
pub mod telemetry;

// Re-export commonly used items
pub use config::Config;
pub use gpu::IntelDiscreteGpu;
pub use hardware::{Hardware, HardwareReport, HardwareType};
pub use monitor::HardwareMonitor;
pub use sensor::{Sensor, SensorReading, SensorType};
