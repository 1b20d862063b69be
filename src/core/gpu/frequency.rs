use log::debug;

use super::api::{AdapterHandle, ControlApi, FrequencyDomain};
use crate::core::telemetry::TelemetrySnapshot;
use crate::error::Result;

/// The memory domain reports the effective data rate; the clock is 1/8 of it.
pub const MEMORY_FREQUENCY_DIVISOR: f64 = 8.0;

/// Memory clock in MHz from the first memory frequency domain with a
/// non-negative `actual` value.
pub fn memory_domain_clock(api: &dyn ControlApi, adapter: AdapterHandle) -> Result<Option<f64>> {
    let count = api.frequency_domain_count(adapter)?;
    if count == 0 {
        return Ok(None);
    }

    for domain in api.enum_frequency_domains(adapter, count)? {
        let properties = match api.frequency_properties(domain) {
            Ok(p) => p,
            Err(e) => {
                debug!("Frequency domain {:?} properties: {}", domain, e);
                continue;
            }
        };
        if properties.domain != FrequencyDomain::Memory {
            continue;
        }
        match api.frequency_state(domain) {
            Ok(state) if state.actual >= 0.0 => {
                return Ok(Some(state.actual / MEMORY_FREQUENCY_DIVISOR));
            }
            Ok(_) => {}
            Err(e) => debug!("Frequency domain {:?} state: {}", domain, e),
        }
    }
    Ok(None)
}

/// Memory clock, falling back to the snapshot's VRAM clock counter.
pub fn memory_clock(
    api: &dyn ControlApi,
    adapter: AdapterHandle,
    snapshot: &TelemetrySnapshot,
) -> Option<f64> {
    let from_domains = memory_domain_clock(api, adapter).unwrap_or_else(|e| {
        debug!("Frequency domain enumeration failed: {}", e);
        None
    });
    from_domains.or_else(|| snapshot.vram_clock.reading())
}
