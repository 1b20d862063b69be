// Fan enumeration through the GPU node

use std::sync::Arc;

use telemon::core::gpu::IntelDiscreteGpu;
use telemon::core::sensor::SensorType;
use telemon::core::Hardware;

use super::mock::*;

fn build(adapter: MockAdapter) -> IntelDiscreteGpu {
    let control = Arc::new(MockControl::single(
        adapter.with_snapshots(vec![energy_snapshot(0.0, 0.0)]),
    ));
    IntelDiscreteGpu::new(control, Arc::new(MockDisplay::empty()), adapter_handle(0))
}

#[test]
fn test_zero_fans() {
    let gpu = build(MockAdapter::new(arc_a770()).with_fans(Vec::new()));

    assert!(gpu.is_valid());
    assert_eq!(gpu.fan_count(), 0);
    assert!(gpu.sensor(SensorType::Fan, 0).is_none());
}

#[test]
fn test_failed_fan_probe_counts_as_zero() {
    let mut adapter = MockAdapter::new(arc_a770());
    adapter.fan_speeds = None;
    let gpu = build(adapter);

    assert!(gpu.is_valid());
    assert_eq!(gpu.fan_count(), 0);
}

#[test]
fn test_single_fan_name() {
    let gpu = build(MockAdapter::new(arc_a770()).with_fans(vec![1450]));

    let fan = gpu.sensor(SensorType::Fan, 0).unwrap();
    assert_eq!(fan.name(), "GPU Fan");
    assert_eq!(fan.value(), Some(1450.0));
}

#[test]
fn test_missing_reading_affects_one_fan() {
    let gpu = build(MockAdapter::new(arc_a770()).with_fans(vec![1200, -1, 1300]));

    assert_eq!(gpu.fan_count(), 3);
    let names: Vec<&str> = (0..3)
        .map(|i| gpu.sensor(SensorType::Fan, i).unwrap().name())
        .collect();
    assert_eq!(names, vec!["GPU Fan 1", "GPU Fan 2", "GPU Fan 3"]);

    assert_eq!(gpu.sensor(SensorType::Fan, 0).unwrap().value(), Some(1200.0));
    assert_eq!(gpu.sensor(SensorType::Fan, 1).unwrap().value(), None);
    assert_eq!(gpu.sensor(SensorType::Fan, 2).unwrap().value(), Some(1300.0));
}

#[test]
fn test_fans_missing_from_later_probe_lose_their_reading() {
    let control = Arc::new(MockControl::single(
        MockAdapter::new(arc_a770())
            .with_fans(vec![1200, 1250, 1300])
            .with_snapshots(vec![energy_snapshot(0.0, 0.0), energy_snapshot(1.0, 0.0)]),
    ));
    let mut gpu = IntelDiscreteGpu::new(control.clone(), Arc::new(MockDisplay::empty()), adapter_handle(0));
    assert_eq!(gpu.sensor(SensorType::Fan, 2).unwrap().value(), Some(1300.0));

    control.set_fans(0, vec![900]);
    gpu.update();

    assert_eq!(gpu.fan_count(), 3);
    assert_eq!(gpu.sensor(SensorType::Fan, 0).unwrap().value(), Some(900.0));
    assert_eq!(gpu.sensor(SensorType::Fan, 1).unwrap().value(), None);
    assert_eq!(gpu.sensor(SensorType::Fan, 2).unwrap().value(), None);
}
