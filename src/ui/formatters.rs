use chrono::{DateTime, Local};
use colored::*;

use crate::core::gpu::IntelDiscreteGpu;
use crate::core::hardware::HardwareReport;
use crate::core::sensor::{SensorReading, SensorType};

const SENSOR_ORDER: [SensorType; 8] = [
    SensorType::Temperature,
    SensorType::Clock,
    SensorType::Voltage,
    SensorType::Power,
    SensorType::Load,
    SensorType::SmallData,
    SensorType::Throughput,
    SensorType::Fan,
];

/// Format a byte count in human-readable form (B, KB, MB, GB)
pub fn format_size(size: u64) -> String {
    if size < 1024 {
        format!("{}B", size)
    } else if size < 1024 * 1024 {
        format!("{:.1}KB", size as f64 / 1024.0)
    } else if size < 1024 * 1024 * 1024 {
        format!("{:.1}MB", size as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1}GB", size as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a clock time (HH:MM:SS)
pub fn format_time(time: DateTime<Local>) -> String {
    time.format("%H:%M:%S").to_string()
}

/// Format a sensor value with its unit; `-` when there is no value
pub fn format_value(sensor_type: SensorType, value: Option<f32>) -> String {
    let Some(v) = value else {
        return "-".to_string();
    };
    match sensor_type {
        SensorType::Temperature => format!("{:.1}{}", v, sensor_type.unit()),
        SensorType::Clock | SensorType::Fan | SensorType::SmallData => {
            format!("{:.0} {}", v, sensor_type.unit())
        }
        SensorType::Voltage => format!("{:.3} {}", v, sensor_type.unit()),
        SensorType::Power => format!("{:.1} {}", v, sensor_type.unit()),
        SensorType::Load => format!("{:.1}{}", v, sensor_type.unit()),
        SensorType::Throughput => format!("{}/s", format_size(v.max(0.0) as u64)),
    }
}

fn colorize_load(text: String, percent: f32) -> ColoredString {
    if percent >= 90.0 {
        text.red()
    } else if percent >= 60.0 {
        text.yellow()
    } else {
        text.green()
    }
}

fn print_sensor(sensor: &SensorReading) {
    let current = format_value(sensor.sensor_type, sensor.value);
    let current = match (sensor.sensor_type, sensor.value) {
        (SensorType::Load, Some(v)) => colorize_load(current, v),
        (_, None) => current.dimmed(),
        _ => current.white().bold(),
    };

    println!(
        "    {:<22} {:>14}   {} {}  {} {}",
        sensor.name,
        current,
        "min".dimmed(),
        format_value(sensor.sensor_type, sensor.min),
        "max".dimmed(),
        format_value(sensor.sensor_type, sensor.max),
    );
}

/// Print one hardware report grouped by sensor type
pub fn print_report(report: &HardwareReport) {
    println!(
        "\n{} {}",
        report.name.bold().bright_cyan(),
        report.identifier.dimmed()
    );

    for sensor_type in SENSOR_ORDER {
        let sensors: Vec<&SensorReading> = report
            .sensors
            .iter()
            .filter(|s| s.sensor_type == sensor_type)
            .collect();
        if sensors.is_empty() {
            continue;
        }
        println!("  {}", sensor_type.to_string().yellow());
        for sensor in sensors {
            print_sensor(sensor);
        }
    }
}

/// Print a poll header followed by every report
pub fn print_reports(reports: &[HardwareReport], poll: u64) {
    println!(
        "\n{} {} {}",
        "Poll".bold(),
        poll.to_string().bold(),
        format!("at {}", format_time(Local::now())).dimmed()
    );
    println!("{}", "=".repeat(80));
    for report in reports {
        print_report(report);
    }
}

/// Print the static identity of an adapter
pub fn print_identity(gpu: &IntelDiscreteGpu) {
    use crate::core::hardware::Hardware;

    println!("{} {}", gpu.name().bold().bright_cyan(), gpu.identifier().dimmed());
    if let Some(identity) = gpu.identity() {
        println!("  {:<16} 0x{:04X}", "Vendor ID:", identity.vendor_id);
        println!("  {:<16} {}", "Device ID:", identity.device_id);
        println!("  {:<16} {}", "Revision:", identity.revision_id);
        println!("  {:<16} 0x{:X}", "Driver version:", identity.driver_version);
    }
    println!("  {:<16} {}", "Fans:", gpu.fan_count());
    match gpu.memory_device() {
        Some(device) => println!("  {:<16} {}", "Display device:", device.dimmed()),
        None => println!("  {:<16} {}", "Display device:", "not matched".dimmed()),
    }
}
