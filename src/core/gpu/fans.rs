use log::debug;

use super::api::{AdapterHandle, ControlApi};
use crate::error::Result;

/// Sensor name for fan `index` out of `count`.
pub fn fan_name(index: usize, count: usize) -> String {
    if count == 1 {
        "GPU Fan".to_string()
    } else {
        format!("GPU Fan {}", index + 1)
    }
}

/// Number of fans reported by the count probe. A failed probe counts as none.
pub fn enumerate_fan_count(api: &dyn ControlApi, adapter: AdapterHandle) -> u32 {
    match api.fan_count(adapter) {
        Ok(count) => count,
        Err(e) => {
            debug!("Fan enumeration unavailable: {}", e);
            0
        }
    }
}

/// RPM per fan, at most `slots` entries. A fan without a reading is `None`
/// and does not affect its neighbours.
pub fn read_fan_speeds(
    api: &dyn ControlApi,
    adapter: AdapterHandle,
    slots: usize,
) -> Result<Vec<Option<u32>>> {
    let count = (api.fan_count(adapter)? as usize).min(slots);
    if count == 0 {
        return Ok(Vec::new());
    }

    let handles = api.enum_fans(adapter, count as u32)?;
    Ok(handles
        .into_iter()
        .take(count)
        .map(|fan| match api.fan_speed_rpm(fan) {
            Ok(rpm) if rpm >= 0 => Some(rpm as u32),
            Ok(_) => None,
            Err(e) => {
                debug!("Fan {:?} has no reading: {}", fan, e);
                None
            }
        })
        .collect())
}
