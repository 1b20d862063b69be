// Adapter enumeration and polling

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use telemon::core::gpu::DeviceType;
use telemon::core::runtime;
use telemon::core::HardwareMonitor;
use telemon::error::TelemonError;
use tokio::sync::broadcast;

use super::mock::*;

fn display_adapter() -> MockAdapter {
    let mut properties = arc_a770();
    properties.device_type = DeviceType::Display;
    MockAdapter::new(properties)
}

fn ticking_adapter(ticks: usize) -> MockAdapter {
    let snapshots = (0..ticks)
        .map(|t| energy_snapshot(t as f64, t as f64 * 50.0))
        .collect();
    MockAdapter::new(arc_a770()).with_snapshots(snapshots)
}

#[test]
fn test_open_keeps_valid_adapters() {
    let control = Arc::new(MockControl::new(vec![display_adapter(), ticking_adapter(1)]));
    let monitor = HardwareMonitor::open(control, Arc::new(MockDisplay::empty())).unwrap();

    assert_eq!(monitor.len(), 1);
    assert_eq!(monitor.gpus()[0].device_id(), "0x56A0");
}

#[test]
fn test_open_without_graphics_adapters() {
    let control = Arc::new(MockControl::new(vec![display_adapter()]));
    let result = HardwareMonitor::open(control, Arc::new(MockDisplay::empty()));

    assert!(matches!(result, Err(TelemonError::NoDevices)));
}

#[test]
fn test_update_and_report() {
    let control = Arc::new(MockControl::new(vec![ticking_adapter(2)]));
    let mut monitor = HardwareMonitor::open(control, Arc::new(MockDisplay::empty())).unwrap();
    monitor.update();

    let reports = monitor.report();
    assert_eq!(reports.len(), 1);
    let power = reports[0]
        .sensors
        .iter()
        .find(|s| s.identifier == "/gpu-intel/0x56A0/power/0")
        .unwrap();
    assert_eq!(power.value, Some(50.0));

    let json = serde_json::to_string(&reports).unwrap();
    assert!(json.contains("\"hardware_type\":\"GpuIntel\""));
}

#[test]
fn test_poll_loop_stops_after_count() {
    let control = Arc::new(MockControl::new(vec![ticking_adapter(10)]));
    let mut monitor = HardwareMonitor::open(control.clone(), Arc::new(MockDisplay::empty())).unwrap();
    let (_tx, rx) = broadcast::channel(1);

    let mut seen = 0;
    let polls = runtime::run_blocking(&mut monitor, Duration::from_millis(5), rx, |reports| {
        assert_eq!(reports.len(), 1);
        seen += 1;
        if seen == 3 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .unwrap();

    assert_eq!(polls, 3);
    // One fetch at construction plus one per poll.
    assert_eq!(control.calls(), 4);
}

#[tokio::test]
async fn test_poll_loop_honors_shutdown() {
    let control = Arc::new(MockControl::new(vec![ticking_adapter(10)]));
    let mut monitor = HardwareMonitor::open(control, Arc::new(MockDisplay::empty())).unwrap();
    let (tx, rx) = broadcast::channel(1);

    let polls = runtime::poll_loop(&mut monitor, Duration::from_millis(5), rx, |_| {
        let _ = tx.send(());
        ControlFlow::Continue(())
    })
    .await;

    // The loop may take one extra tick before it sees the signal.
    assert!((1..=2).contains(&polls));
}
