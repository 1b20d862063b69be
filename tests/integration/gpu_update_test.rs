// Update cycle of the Intel discrete GPU node driven through scripted mocks

use std::sync::Arc;

use telemon::core::gpu::{DeviceType, IntelDiscreteGpu};
use telemon::core::hardware::{Hardware, HardwareType};
use telemon::core::sensor::SensorType;
use telemon::core::telemetry::{TelemetryItem, TelemetrySnapshot, TelemetryUnit};

use super::mock::*;

fn build(control: &Arc<MockControl>, display: &Arc<MockDisplay>) -> IntelDiscreteGpu {
    IntelDiscreteGpu::new(control.clone(), display.clone(), adapter_handle(0))
}

fn value(gpu: &IntelDiscreteGpu, sensor_type: SensorType, index: usize) -> Option<f32> {
    gpu.sensor(sensor_type, index).and_then(|s| s.value())
}

#[test]
fn test_power_from_energy_end_to_end() {
    let control = Arc::new(MockControl::single(
        MockAdapter::new(arc_a770()).with_snapshots(vec![energy_snapshot(0.0, 1000.0)]),
    ));
    let display = Arc::new(MockDisplay::empty());
    let mut gpu = build(&control, &display);

    // First tick has nothing to compare against.
    assert_eq!(value(&gpu, SensorType::Power, 0), None);

    control.push_snapshot(0, Some(energy_snapshot(5.0, 1500.0)));
    gpu.update();
    assert_eq!(value(&gpu, SensorType::Power, 0), Some(100.0));

    control.push_snapshot(0, Some(energy_snapshot(10.0, 1200.0)));
    gpu.update();
    assert_eq!(value(&gpu, SensorType::Power, 0), Some(0.0));
}

#[test]
fn test_last_raw_follows_unemitted_tick() {
    let control = Arc::new(MockControl::single(
        MockAdapter::new(arc_a770()).with_snapshots(vec![energy_snapshot(0.0, 1000.0)]),
    ));
    let display = Arc::new(MockDisplay::empty());
    let mut gpu = build(&control, &display);

    // Same timestamp: nothing emitted, raw reading still remembered.
    control.push_snapshot(0, Some(energy_snapshot(0.0, 1200.0)));
    gpu.update();
    assert_eq!(value(&gpu, SensorType::Power, 0), None);

    // (1700 - 1200) / 5, not (1700 - 1000) / 5.
    control.push_snapshot(0, Some(energy_snapshot(5.0, 1700.0)));
    gpu.update();
    assert_eq!(value(&gpu, SensorType::Power, 0), Some(100.0));
}

#[test]
fn test_non_graphics_device_is_invalid() {
    let mut properties = arc_a770();
    properties.device_type = DeviceType::Display;
    let control = Arc::new(MockControl::single(
        MockAdapter::new(properties).with_snapshots(vec![energy_snapshot(0.0, 1.0)]),
    ));
    let display = Arc::new(MockDisplay::empty());
    let mut gpu = build(&control, &display);

    assert!(!gpu.is_valid());
    assert!(gpu.sensors().is_empty());

    gpu.update();
    gpu.update();
    assert_eq!(control.calls(), 0);
    assert!(gpu.report().sensors.is_empty());
}

#[test]
fn test_failed_property_query_is_invalid() {
    let mut adapter = MockAdapter::new(arc_a770());
    adapter.properties = None;
    let control = Arc::new(MockControl::single(adapter));
    let display = Arc::new(MockDisplay::empty());
    let gpu = build(&control, &display);

    assert!(!gpu.is_valid());
    assert_eq!(gpu.device_id(), "0x0000");
    assert_eq!(gpu.vendor_id(), None);
}

#[test]
fn test_identity() {
    let control = Arc::new(MockControl::single(MockAdapter::new(arc_a770())));
    let display = Arc::new(MockDisplay::empty());
    let gpu = build(&control, &display);

    assert!(gpu.is_valid());
    assert_eq!(gpu.device_id(), "0x56A0");
    assert_eq!(gpu.identifier(), "/gpu-intel/0x56A0");
    assert_eq!(gpu.hardware_type(), HardwareType::GpuIntel);
    assert_eq!(gpu.name(), "Intel(R) Arc(TM) A770 Graphics");
    assert_eq!(gpu.vendor_id(), Some(0x8086));
    assert_eq!(gpu.revision_id(), Some(8));
    assert_eq!(gpu.driver_version(), Some(0x0020_0000_1234_5678));
}

#[test]
fn test_fetch_failure_holds_previous_values() {
    let control = Arc::new(MockControl::single(MockAdapter::new(arc_a770()).with_snapshots(
        vec![energy_snapshot(0.0, 1000.0), energy_snapshot(5.0, 1500.0)],
    )));
    let display = Arc::new(MockDisplay::empty());
    let mut gpu = build(&control, &display);
    gpu.update();
    assert_eq!(value(&gpu, SensorType::Power, 0), Some(100.0));
    let clock = gpu.tick_clock();

    control.push_snapshot(0, None);
    gpu.update();

    assert!(gpu.is_valid());
    assert_eq!(value(&gpu, SensorType::Power, 0), Some(100.0));
    assert_eq!(gpu.tick_clock(), clock);

    // Next successful tick measures from the last good snapshot.
    control.push_snapshot(0, Some(energy_snapshot(10.0, 2500.0)));
    gpu.update();
    assert_eq!(value(&gpu, SensorType::Power, 0), Some(200.0));
}

#[test]
fn test_metrics_degrade_independently() {
    let first = TelemetrySnapshot {
        timestamp: seconds(0.0),
        gpu_energy: joules(100.0),
        global_activity: item(TelemetryUnit::TimeSeconds, 10.0),
        gpu_temperature: item(TelemetryUnit::TemperatureCelsius, 55.0),
        ..Default::default()
    };
    let second = TelemetrySnapshot {
        timestamp: seconds(2.0),
        gpu_energy: TelemetryItem::unsupported(),
        global_activity: item(TelemetryUnit::TimeSeconds, 11.0),
        gpu_temperature: item(TelemetryUnit::TemperatureCelsius, 57.5),
        ..Default::default()
    };
    let control = Arc::new(MockControl::single(
        MockAdapter::new(arc_a770()).with_snapshots(vec![first, second]),
    ));
    let display = Arc::new(MockDisplay::empty());
    let mut gpu = build(&control, &display);
    gpu.update();

    assert_eq!(value(&gpu, SensorType::Power, 0), None);
    assert_eq!(value(&gpu, SensorType::Load, 0), Some(50.0));
    assert_eq!(value(&gpu, SensorType::Temperature, 0), Some(57.5));
    assert_eq!(value(&gpu, SensorType::Temperature, 1), None);
}

#[test]
fn test_activity_counter_decrease_is_unsupported() {
    let at = |ts: f64, activity: f64| TelemetrySnapshot {
        timestamp: seconds(ts),
        render_compute_activity: item(TelemetryUnit::TimeSeconds, activity),
        ..Default::default()
    };
    let control = Arc::new(MockControl::single(
        MockAdapter::new(arc_a770()).with_snapshots(vec![at(0.0, 500.0), at(1.0, 2.0), at(2.0, 2.5)]),
    ));
    let display = Arc::new(MockDisplay::empty());
    let mut gpu = build(&control, &display);

    gpu.update();
    assert_eq!(value(&gpu, SensorType::Load, 1), None);

    gpu.update();
    assert_eq!(value(&gpu, SensorType::Load, 1), Some(50.0));
}

#[test]
fn test_bandwidth_normalized_to_bytes() {
    let snapshot = TelemetrySnapshot {
        timestamp: seconds(0.0),
        vram_read_bandwidth: item(TelemetryUnit::BandwidthMbps, 512.0),
        vram_write_bandwidth: item(TelemetryUnit::BandwidthMbps, -3.0),
        ..Default::default()
    };
    let control = Arc::new(MockControl::single(
        MockAdapter::new(arc_a770()).with_snapshots(vec![snapshot]),
    ));
    let display = Arc::new(MockDisplay::empty());
    let gpu = build(&control, &display);

    assert_eq!(
        value(&gpu, SensorType::Throughput, 0),
        Some((512 * MB) as f32)
    );
    assert_eq!(value(&gpu, SensorType::Throughput, 1), None);
}

#[test]
fn test_memory_clock_from_frequency_domain() {
    let snapshot = TelemetrySnapshot {
        timestamp: seconds(0.0),
        vram_clock: item(TelemetryUnit::FrequencyMhz, 1000.0),
        ..Default::default()
    };
    let mut adapter = MockAdapter::new(arc_a770()).with_snapshots(vec![snapshot]);
    adapter.memory_domain_actual = Some(16000.0);
    let control = Arc::new(MockControl::single(adapter));
    let display = Arc::new(MockDisplay::empty());
    let gpu = build(&control, &display);

    assert_eq!(value(&gpu, SensorType::Clock, 1), Some(2000.0));
}

#[test]
fn test_memory_clock_falls_back_to_snapshot() {
    let snapshot = TelemetrySnapshot {
        timestamp: seconds(0.0),
        vram_clock: item(TelemetryUnit::FrequencyMhz, 1000.0),
        ..Default::default()
    };
    let control = Arc::new(MockControl::single(
        MockAdapter::new(arc_a770()).with_snapshots(vec![snapshot]),
    ));
    let display = Arc::new(MockDisplay::empty());
    let gpu = build(&control, &display);

    assert_eq!(value(&gpu, SensorType::Clock, 1), Some(1000.0));
}

#[test]
fn test_missing_timestamp_uses_wall_clock() {
    let snapshot = TelemetrySnapshot {
        gpu_energy: joules(1.0),
        ..Default::default()
    };
    let control = Arc::new(MockControl::single(
        MockAdapter::new(arc_a770()).with_snapshots(vec![snapshot]),
    ));
    let display = Arc::new(MockDisplay::empty());
    let gpu = build(&control, &display);

    let current = gpu.tick_clock().and_then(|c| c.current).unwrap();
    assert!(current > 1_577_836_800.0);
}

#[test]
fn test_report_contains_only_activated_sensors() {
    let snapshot = TelemetrySnapshot {
        timestamp: seconds(0.0),
        gpu_temperature: item(TelemetryUnit::TemperatureCelsius, 48.0),
        ..Default::default()
    };
    let control = Arc::new(MockControl::single(
        MockAdapter::new(arc_a770()).with_snapshots(vec![snapshot]),
    ));
    let display = Arc::new(MockDisplay::empty());
    let gpu = build(&control, &display);

    let report = gpu.report();
    assert_eq!(report.sensors.len(), 1);
    assert_eq!(report.sensors[0].identifier, "/gpu-intel/0x56A0/temperature/0");
    assert_eq!(report.sensors[0].value, Some(48.0));
}
