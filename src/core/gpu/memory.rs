//! Video memory accounting through the OS display-device source.
//!
//! The vendor telemetry has no reliable memory capacity, so the adapter is
//! matched to an OS display-device record by the `VEN_xxxx` / `DEV_xxxx`
//! fragments embedded in the record identifiers. The winning identifier is
//! cached and never re-searched while set.

use log::debug;

use super::api::{DisplayDeviceRecord, DisplayDeviceSource};
use crate::error::Result;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Memory sensor values, sizes in MB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryReading {
    pub total_mb: f64,
    pub used_mb: f64,
    pub free_mb: f64,
    pub load_percent: f64,
}

impl MemoryReading {
    /// `None` when the record reports no capacity.
    pub fn from_bytes(total: u64, used: u64) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let free = total.saturating_sub(used);
        Some(Self {
            total_mb: total as f64 / BYTES_PER_MB,
            used_mb: used as f64 / BYTES_PER_MB,
            free_mb: free as f64 / BYTES_PER_MB,
            load_percent: used as f64 / total as f64 * 100.0,
        })
    }

    pub fn from_record(record: &DisplayDeviceRecord) -> Option<Self> {
        Self::from_bytes(record.video_memory_limit, record.dedicated_memory_used)
    }
}

fn contains_ignore_case(haystack: &str, pattern: &str) -> bool {
    haystack
        .to_ascii_uppercase()
        .contains(&pattern.to_ascii_uppercase())
}

/// First identifier carrying both patterns whose record can be read.
pub fn find_exact(
    source: &dyn DisplayDeviceSource,
    vendor_pattern: &str,
    device_pattern: &str,
) -> Result<Option<String>> {
    for identifier in source.device_identifiers()? {
        if !contains_ignore_case(&identifier, vendor_pattern)
            || !contains_ignore_case(&identifier, device_pattern)
        {
            continue;
        }
        match source.device_info(&identifier) {
            Ok(_) => return Ok(Some(identifier)),
            Err(e) => debug!("Skipping display device {}: {}", identifier, e),
        }
    }
    Ok(None)
}

/// First vendor record that is discrete and has dedicated memory.
pub fn find_discrete(
    source: &dyn DisplayDeviceSource,
    vendor_pattern: &str,
) -> Result<Option<DisplayDeviceRecord>> {
    for identifier in source.device_identifiers()? {
        if !contains_ignore_case(&identifier, vendor_pattern) {
            continue;
        }
        match source.device_info(&identifier) {
            Ok(record) if record.dedicated_memory_limit > 0 && !record.integrated => {
                return Ok(Some(record));
            }
            Ok(_) => debug!("Display device {} is integrated or has no dedicated memory", identifier),
            Err(e) => debug!("Skipping display device {}: {}", identifier, e),
        }
    }
    Ok(None)
}

/// Resolve the record for a device, searching only when nothing is cached.
pub fn resolve_memory(
    source: &dyn DisplayDeviceSource,
    cached: Option<&str>,
    vendor_pattern: &str,
) -> Result<Option<DisplayDeviceRecord>> {
    match cached {
        Some(identifier) => source.device_info(identifier).map(Some),
        None => find_discrete(source, vendor_pattern),
    }
}

/// Cached identifier plus the patterns used to find it.
#[derive(Debug, Clone)]
pub struct MemoryResolver {
    vendor_pattern: String,
    device_pattern: String,
    cached: Option<String>,
}

impl MemoryResolver {
    pub fn new(vendor_pattern: String, device_pattern: String) -> Self {
        Self {
            vendor_pattern,
            device_pattern,
            cached: None,
        }
    }

    pub fn cached_identifier(&self) -> Option<&str> {
        self.cached.as_deref()
    }

    /// Exact vendor + device match; a no-op once an identifier is cached.
    pub fn prime(&mut self, source: &dyn DisplayDeviceSource) -> Result<()> {
        if self.cached.is_none() {
            self.cached = find_exact(source, &self.vendor_pattern, &self.device_pattern)?;
        }
        Ok(())
    }

    /// Current memory reading, or `None` if no record matches or the record
    /// reports zero capacity. While nothing is cached the exact match is
    /// retried before the vendor-only search.
    pub fn read(&mut self, source: &dyn DisplayDeviceSource) -> Result<Option<MemoryReading>> {
        self.prime(source)?;
        let record = match resolve_memory(source, self.cached.as_deref(), &self.vendor_pattern)? {
            Some(record) => record,
            None => return Ok(None),
        };
        if self.cached.is_none() {
            debug!("Matched display device {}", record.identifier);
            self.cached = Some(record.identifier.clone());
        }
        Ok(MemoryReading::from_record(&record))
    }
}
