//! Intel discrete GPU hardware node.
//!
//! Built once per adapter handle. Construction resolves the device identity
//! and creates a fixed set of sensors; if the identity check fails the node
//! is invalid for its whole lifetime and [`update`](Hardware::update) does
//! nothing. A valid node never becomes invalid: a failed telemetry fetch
//! only skips that tick and leaves the previous values in place.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, trace, warn};

use super::api::{AdapterHandle, ControlApi, DisplayDeviceSource};
use super::fans;
use super::frequency;
use super::identity::{self, DeviceIdentity};
use super::memory::{MemoryReading, MemoryResolver};
use crate::core::hardware::{Hardware, HardwareType};
use crate::core::sensor::{Sensor, SensorType};
use crate::core::telemetry::{RateMetric, RateTracker, TelemetrySnapshot};
use crate::error::Result;

const FALLBACK_NAME: &str = "Intel GPU";
const FALLBACK_DEVICE_ID: &str = "0x0000";

/// Previous and current snapshot timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickClock {
    pub last: Option<f64>,
    pub current: Option<f64>,
}

impl TickClock {
    pub fn advance(&mut self, now: f64) {
        self.last = self.current;
        self.current = Some(now);
    }

    pub fn elapsed(&self) -> Option<f64> {
        Some(self.current? - self.last?)
    }
}

/// Seconds since the Unix epoch, used when the driver has no timestamp.
fn wall_clock_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

struct GpuSensors {
    temperature_core: Sensor,
    temperature_memory: Sensor,
    clock_core: Sensor,
    clock_memory: Sensor,
    voltage_core: Sensor,
    voltage_memory: Sensor,
    power_package: Sensor,
    power_total: Sensor,
    load_core: Sensor,
    load_render_compute: Sensor,
    load_media: Sensor,
    load_memory: Sensor,
    memory_free: Sensor,
    memory_used: Sensor,
    memory_total: Sensor,
    memory_read: Sensor,
    memory_write: Sensor,
    fans: Vec<Sensor>,
}

impl GpuSensors {
    fn new(identifier: &str, fan_count: usize) -> Self {
        let sensor =
            |name: &str, index: usize, kind: SensorType| Sensor::new(name, index, kind, identifier);
        Self {
            temperature_core: sensor("GPU Core", 0, SensorType::Temperature),
            temperature_memory: sensor("GPU Memory", 1, SensorType::Temperature),
            clock_core: sensor("GPU Core", 0, SensorType::Clock),
            clock_memory: sensor("GPU Memory", 1, SensorType::Clock),
            voltage_core: sensor("GPU Core", 0, SensorType::Voltage),
            voltage_memory: sensor("GPU Memory", 1, SensorType::Voltage),
            power_package: sensor("GPU Package", 0, SensorType::Power),
            power_total: sensor("GPU Total", 1, SensorType::Power),
            load_core: sensor("GPU Core", 0, SensorType::Load),
            load_render_compute: sensor("GPU Render/Compute", 1, SensorType::Load),
            load_media: sensor("GPU Media", 2, SensorType::Load),
            load_memory: sensor("GPU Memory", 3, SensorType::Load),
            memory_free: sensor("GPU Memory Free", 0, SensorType::SmallData),
            memory_used: sensor("GPU Memory Used", 1, SensorType::SmallData),
            memory_total: sensor("GPU Memory Total", 2, SensorType::SmallData),
            memory_read: sensor("GPU Memory Read", 0, SensorType::Throughput),
            memory_write: sensor("GPU Memory Write", 1, SensorType::Throughput),
            fans: (0..fan_count)
                .map(|i| sensor(fans::fan_name(i, fan_count).as_str(), i, SensorType::Fan))
                .collect(),
        }
    }

    fn rate_sensor(&mut self, metric: RateMetric) -> &mut Sensor {
        match metric {
            RateMetric::GpuPower => &mut self.power_package,
            RateMetric::TotalCardPower => &mut self.power_total,
            RateMetric::GlobalActivity => &mut self.load_core,
            RateMetric::RenderComputeActivity => &mut self.load_render_compute,
            RateMetric::MediaActivity => &mut self.load_media,
            RateMetric::VramReadBandwidth => &mut self.memory_read,
            RateMetric::VramWriteBandwidth => &mut self.memory_write,
        }
    }

    fn set_memory(&mut self, reading: Option<MemoryReading>) {
        self.memory_total.set_reading(reading.map(|r| r.total_mb));
        self.memory_used.set_reading(reading.map(|r| r.used_mb));
        self.memory_free.set_reading(reading.map(|r| r.free_mb));
        self.load_memory.set_reading(reading.map(|r| r.load_percent));
    }

    fn all(&self) -> Vec<&Sensor> {
        let mut all = vec![
            &self.temperature_core,
            &self.temperature_memory,
            &self.clock_core,
            &self.clock_memory,
            &self.voltage_core,
            &self.voltage_memory,
            &self.power_package,
            &self.power_total,
            &self.load_core,
            &self.load_render_compute,
            &self.load_media,
            &self.load_memory,
            &self.memory_free,
            &self.memory_used,
            &self.memory_total,
            &self.memory_read,
            &self.memory_write,
        ];
        all.extend(self.fans.iter());
        all
    }
}

/// Everything a valid node owns.
struct GpuState {
    identity: DeviceIdentity,
    sensors: GpuSensors,
    rates: RateTracker,
    clock: TickClock,
    memory: MemoryResolver,
    snapshot: TelemetrySnapshot,
}

impl GpuState {
    fn new(
        api: &dyn ControlApi,
        display: &dyn DisplayDeviceSource,
        adapter: AdapterHandle,
        identity: DeviceIdentity,
    ) -> Self {
        let mut memory = MemoryResolver::new(identity.vendor_pattern(), identity.device_pattern());
        if let Err(e) = memory.prime(display) {
            warn!("{}: display device lookup failed: {}", identity.name, e);
        }

        let fan_count = fans::enumerate_fan_count(api, adapter) as usize;
        let sensors = GpuSensors::new(&identity.identifier, fan_count);

        Self {
            identity,
            sensors,
            rates: RateTracker::new(),
            clock: TickClock::default(),
            memory,
            snapshot: TelemetrySnapshot::default(),
        }
    }

    fn try_update(
        &mut self,
        api: &dyn ControlApi,
        display: &dyn DisplayDeviceSource,
        adapter: AdapterHandle,
    ) -> Result<()> {
        let snapshot = api.power_telemetry(adapter)?;
        let now = snapshot
            .timestamp
            .reading()
            .unwrap_or_else(wall_clock_seconds);
        self.clock.advance(now);
        self.snapshot = snapshot;

        for (metric, value) in self.rates.observe_snapshot(&snapshot, now) {
            self.sensors.rate_sensor(metric).set_reading(value);
        }

        let sensors = &mut self.sensors;
        sensors.temperature_core.set_reading(snapshot.gpu_temperature.reading());
        sensors.temperature_memory.set_reading(snapshot.vram_temperature.reading());
        sensors.clock_core.set_reading(snapshot.gpu_clock.reading());
        sensors
            .clock_memory
            .set_reading(frequency::memory_clock(api, adapter, &snapshot));
        sensors.voltage_core.set_reading(snapshot.gpu_voltage.reading());
        sensors.voltage_memory.set_reading(snapshot.vram_voltage.reading());

        match self.memory.read(display) {
            Ok(reading) => sensors.set_memory(reading),
            Err(e) => warn!("{}: memory accounting failed: {}", self.identity.name, e),
        }

        if !sensors.fans.is_empty() {
            match fans::read_fan_speeds(api, adapter, sensors.fans.len()) {
                Ok(speeds) => {
                    // Slots past the probed count read as missing this tick.
                    for (i, sensor) in sensors.fans.iter_mut().enumerate() {
                        let rpm = speeds.get(i).copied().flatten();
                        sensor.set_value(rpm.map(|r| r as f32));
                    }
                }
                Err(e) => warn!("{}: fan speed read failed: {}", self.identity.name, e),
            }
        }

        Ok(())
    }
}

/// Sensor-bearing node for one Intel discrete GPU.
///
/// Not internally synchronized: `update` must be called from one thread at
/// a time.
pub struct IntelDiscreteGpu {
    api: Arc<dyn ControlApi>,
    display: Arc<dyn DisplayDeviceSource>,
    adapter: AdapterHandle,
    name: String,
    identifier: String,
    device_id: String,
    state: Option<GpuState>,
}

impl IntelDiscreteGpu {
    /// Build the node and run the first update.
    pub fn new(
        api: Arc<dyn ControlApi>,
        display: Arc<dyn DisplayDeviceSource>,
        adapter: AdapterHandle,
    ) -> Self {
        let state = match identity::resolve(api.as_ref(), adapter) {
            Ok(properties) => {
                let identity = DeviceIdentity::from_properties(&properties);
                Some(GpuState::new(api.as_ref(), display.as_ref(), adapter, identity))
            }
            Err(e) => {
                info!("Ignoring adapter {:?}: {}", adapter, e);
                None
            }
        };

        let (name, identifier, device_id) = match &state {
            Some(s) => (
                s.identity.name.clone(),
                s.identity.identifier.clone(),
                s.identity.device_id.clone(),
            ),
            None => (
                FALLBACK_NAME.to_string(),
                format!("/gpu-intel/{}", FALLBACK_DEVICE_ID),
                FALLBACK_DEVICE_ID.to_string(),
            ),
        };

        let mut gpu = Self {
            api,
            display,
            adapter,
            name,
            identifier,
            device_id,
            state,
        };
        gpu.update();
        gpu
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_some()
    }

    pub fn adapter(&self) -> AdapterHandle {
        self.adapter
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn identity(&self) -> Option<&DeviceIdentity> {
        self.state.as_ref().map(|s| &s.identity)
    }

    pub fn vendor_id(&self) -> Option<u32> {
        self.identity().map(|i| i.vendor_id)
    }

    pub fn revision_id(&self) -> Option<u32> {
        self.identity().map(|i| i.revision_id)
    }

    pub fn driver_version(&self) -> Option<u64> {
        self.identity().map(|i| i.driver_version)
    }

    /// Last telemetry snapshot that was fetched successfully.
    pub fn snapshot(&self) -> Option<&TelemetrySnapshot> {
        self.state.as_ref().map(|s| &s.snapshot)
    }

    pub fn tick_clock(&self) -> Option<TickClock> {
        self.state.as_ref().map(|s| s.clock)
    }

    pub fn memory_device(&self) -> Option<&str> {
        self.state.as_ref().and_then(|s| s.memory.cached_identifier())
    }

    pub fn fan_count(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.sensors.fans.len())
    }

    /// Look up a sensor by type and index.
    pub fn sensor(&self, sensor_type: SensorType, index: usize) -> Option<&Sensor> {
        self.sensors()
            .into_iter()
            .find(|s| s.sensor_type() == sensor_type && s.index() == index)
    }
}

impl Hardware for IntelDiscreteGpu {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn hardware_type(&self) -> HardwareType {
        HardwareType::GpuIntel
    }

    fn update(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let started = Instant::now();
        match state.try_update(self.api.as_ref(), self.display.as_ref(), self.adapter) {
            Ok(()) => trace!(
                "{}: updated in {:?} (dt = {:?})",
                self.name,
                started.elapsed(),
                state.clock.elapsed()
            ),
            Err(e) => debug!("{}: telemetry fetch failed, tick skipped: {}", self.name, e),
        }
    }

    fn sensors(&self) -> Vec<&Sensor> {
        self.state.as_ref().map_or_else(Vec::new, |s| s.sensors.all())
    }
}
