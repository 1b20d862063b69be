// Scripted ControlApi / DisplayDeviceSource used by the integration tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use telemon::core::gpu::{
    AdapterHandle, ControlApi, DeviceProperties, DeviceType, DisplayDeviceRecord,
    DisplayDeviceSource, FanHandle, FrequencyDomain, FrequencyHandle, FrequencyProperties,
    FrequencyState,
};
use telemon::core::telemetry::{TelemetryItem, TelemetrySnapshot, TelemetryUnit, TelemetryValue};
use telemon::error::{Result, TelemonError};

pub const MB: u64 = 1024 * 1024;

pub fn arc_a770() -> DeviceProperties {
    DeviceProperties {
        name: "Intel(R) Arc(TM) A770 Graphics".to_string(),
        pci_vendor_id: 0x8086,
        pci_device_id: 0x56A0,
        rev_id: 8,
        driver_version: 0x0020_0000_1234_5678,
        device_type: DeviceType::Graphics,
    }
}

pub fn item(unit: TelemetryUnit, value: f64) -> TelemetryItem {
    TelemetryItem::new(unit, TelemetryValue::Double(value))
}

pub fn seconds(value: f64) -> TelemetryItem {
    item(TelemetryUnit::TimeSeconds, value)
}

pub fn joules(value: f64) -> TelemetryItem {
    item(TelemetryUnit::EnergyJoules, value)
}

/// Snapshot with a timestamp and a GPU energy counter only.
pub fn energy_snapshot(timestamp: f64, energy: f64) -> TelemetrySnapshot {
    TelemetrySnapshot {
        timestamp: seconds(timestamp),
        gpu_energy: joules(energy),
        ..Default::default()
    }
}

/// One scripted adapter.
#[derive(Debug, Clone)]
pub struct MockAdapter {
    /// `None` makes the property query fail.
    pub properties: Option<DeviceProperties>,
    /// Served in order; `None` is a failed fetch. Exhausted queue also fails.
    pub snapshots: VecDeque<Option<TelemetrySnapshot>>,
    /// `None` makes the fan count probe fail.
    pub fan_speeds: Option<Vec<i32>>,
    /// `actual` of the memory frequency domain; `None` means no such domain.
    pub memory_domain_actual: Option<f64>,
}

impl MockAdapter {
    pub fn new(properties: DeviceProperties) -> Self {
        Self {
            properties: Some(properties),
            snapshots: VecDeque::new(),
            fan_speeds: Some(Vec::new()),
            memory_domain_actual: None,
        }
    }

    pub fn with_snapshots(mut self, snapshots: Vec<TelemetrySnapshot>) -> Self {
        self.snapshots = snapshots.into_iter().map(Some).collect();
        self
    }

    pub fn with_fans(mut self, speeds: Vec<i32>) -> Self {
        self.fan_speeds = Some(speeds);
        self
    }
}

pub struct MockControl {
    adapters: Mutex<Vec<MockAdapter>>,
    pub telemetry_calls: AtomicUsize,
}

impl MockControl {
    pub fn new(adapters: Vec<MockAdapter>) -> Self {
        Self {
            adapters: Mutex::new(adapters),
            telemetry_calls: AtomicUsize::new(0),
        }
    }

    pub fn single(adapter: MockAdapter) -> Self {
        Self::new(vec![adapter])
    }

    /// Queue another telemetry result for adapter `index`.
    pub fn push_snapshot(&self, index: usize, snapshot: Option<TelemetrySnapshot>) {
        self.adapters.lock().unwrap()[index].snapshots.push_back(snapshot);
    }

    /// Replace the fan list of adapter `index`; the next probe sees the new count.
    pub fn set_fans(&self, index: usize, speeds: Vec<i32>) {
        self.adapters.lock().unwrap()[index].fan_speeds = Some(speeds);
    }

    pub fn calls(&self) -> usize {
        self.telemetry_calls.load(Ordering::SeqCst)
    }

    fn with_adapter<T>(&self, raw: usize, f: impl FnOnce(&mut MockAdapter) -> Result<T>) -> Result<T> {
        let mut adapters = self.adapters.lock().unwrap();
        let adapter = adapters
            .get_mut(raw / 1000 - 1)
            .ok_or_else(|| TelemonError::control("mock", 0x4000_0001))?;
        f(adapter)
    }
}

pub fn adapter_handle(index: usize) -> AdapterHandle {
    AdapterHandle::new((index + 1) * 1000)
}

impl ControlApi for MockControl {
    fn enumerate_adapters(&self) -> Result<Vec<AdapterHandle>> {
        let count = self.adapters.lock().unwrap().len();
        Ok((0..count).map(adapter_handle).collect())
    }

    fn device_properties(&self, adapter: AdapterHandle) -> Result<DeviceProperties> {
        self.with_adapter(adapter.raw(), |a| {
            a.properties
                .clone()
                .ok_or_else(|| TelemonError::control("ctlGetDeviceProperties", 0x4000_0002))
        })
    }

    fn power_telemetry(&self, adapter: AdapterHandle) -> Result<TelemetrySnapshot> {
        self.telemetry_calls.fetch_add(1, Ordering::SeqCst);
        self.with_adapter(adapter.raw(), |a| {
            a.snapshots
                .pop_front()
                .flatten()
                .ok_or_else(|| TelemonError::control("ctlPowerTelemetryGet", 0x4000_0003))
        })
    }

    fn frequency_domain_count(&self, adapter: AdapterHandle) -> Result<u32> {
        self.with_adapter(adapter.raw(), |a| Ok(if a.memory_domain_actual.is_some() { 2 } else { 1 }))
    }

    fn enum_frequency_domains(
        &self,
        adapter: AdapterHandle,
        count: u32,
    ) -> Result<Vec<FrequencyHandle>> {
        Ok((0..count as usize)
            .map(|i| FrequencyHandle::new(adapter.raw() + 100 + i))
            .collect())
    }

    fn frequency_properties(&self, domain: FrequencyHandle) -> Result<FrequencyProperties> {
        let index = domain.raw() % 1000 - 100;
        Ok(FrequencyProperties {
            domain: FrequencyDomain::from_raw(index as u32),
            can_control: false,
            min: 0.0,
            max: 2400.0,
        })
    }

    fn frequency_state(&self, domain: FrequencyHandle) -> Result<FrequencyState> {
        let adapter = domain.raw() / 1000 * 1000;
        let actual = self.with_adapter(adapter, |a| Ok(a.memory_domain_actual))?;
        Ok(FrequencyState {
            current_voltage: -1.0,
            request: -1.0,
            tdp: -1.0,
            efficient: -1.0,
            actual: actual.unwrap_or(-1.0),
            throttle_reasons: 0,
        })
    }

    fn fan_count(&self, adapter: AdapterHandle) -> Result<u32> {
        self.with_adapter(adapter.raw(), |a| {
            a.fan_speeds
                .as_ref()
                .map(|s| s.len() as u32)
                .ok_or_else(|| TelemonError::control("ctlEnumFans", 0x4000_0004))
        })
    }

    fn enum_fans(&self, adapter: AdapterHandle, count: u32) -> Result<Vec<FanHandle>> {
        Ok((0..count as usize)
            .map(|i| FanHandle::new(adapter.raw() + 500 + i))
            .collect())
    }

    fn fan_speed_rpm(&self, fan: FanHandle) -> Result<i32> {
        let adapter = fan.raw() / 1000 * 1000;
        let index = fan.raw() % 1000 - 500;
        self.with_adapter(adapter, |a| {
            Ok(a.fan_speeds
                .as_ref()
                .and_then(|s| s.get(index).copied())
                .unwrap_or(-1))
        })
    }
}

/// Fixed list of display-device records.
pub struct MockDisplay {
    records: Mutex<Vec<DisplayDeviceRecord>>,
    pub listings: AtomicUsize,
    /// Number of upcoming listings that fail.
    failing_listings: AtomicUsize,
    failing_info: AtomicBool,
}

impl MockDisplay {
    pub fn new(records: Vec<DisplayDeviceRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            listings: AtomicUsize::new(0),
            failing_listings: AtomicUsize::new(0),
            failing_info: AtomicBool::new(false),
        }
    }

    pub fn fail_next_listings(&self, count: usize) {
        self.failing_listings.store(count, Ordering::SeqCst);
    }

    pub fn set_info_failing(&self, failing: bool) {
        self.failing_info.store(failing, Ordering::SeqCst);
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    pub fn set_used(&self, identifier: &str, used: u64) {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|r| r.identifier == identifier) {
            record.dedicated_memory_used = used;
        }
    }
}

pub fn display_record(identifier: &str, integrated: bool, total: u64, used: u64) -> DisplayDeviceRecord {
    DisplayDeviceRecord {
        identifier: identifier.to_string(),
        integrated,
        dedicated_memory_limit: total,
        dedicated_memory_used: used,
        video_memory_limit: total,
    }
}

impl DisplayDeviceSource for MockDisplay {
    fn device_identifiers(&self) -> Result<Vec<String>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        let pending = self.failing_listings.load(Ordering::SeqCst);
        if pending > 0 {
            self.failing_listings.store(pending - 1, Ordering::SeqCst);
            return Err(TelemonError::display_device("interface list unavailable"));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.identifier.clone())
            .collect())
    }

    fn device_info(&self, identifier: &str) -> Result<DisplayDeviceRecord> {
        if self.failing_info.load(Ordering::SeqCst) {
            return Err(TelemonError::display_device(format!("{}: adapter gone", identifier)));
        }
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.identifier == identifier)
            .cloned()
            .ok_or_else(|| TelemonError::display_device(identifier.to_string()))
    }
}
