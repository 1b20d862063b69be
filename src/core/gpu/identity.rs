use serde::Serialize;

use super::api::{AdapterHandle, ControlApi, DeviceProperties, DeviceType};
use crate::error::{Result, TelemonError};

/// Query static properties and reject anything that is not a graphics device.
pub fn resolve(api: &dyn ControlApi, adapter: AdapterHandle) -> Result<DeviceProperties> {
    let properties = api.device_properties(adapter)?;
    if properties.device_type != DeviceType::Graphics {
        return Err(TelemonError::not_a_gpu(format!(
            "{} reports device type {:?}",
            properties.name, properties.device_type
        )));
    }
    Ok(properties)
}

/// PCI device id as shown to users, e.g. `0x56A0`.
pub fn device_id(properties: &DeviceProperties) -> String {
    format!("0x{:04X}", properties.pci_device_id)
}

/// Read-only identity of an accepted adapter.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceIdentity {
    pub name: String,
    pub device_id: String,
    pub identifier: String,
    pub vendor_id: u32,
    pub pci_device_id: u32,
    pub revision_id: u32,
    pub driver_version: u64,
}

impl DeviceIdentity {
    pub fn from_properties(properties: &DeviceProperties) -> Self {
        let device_id = device_id(properties);
        Self {
            name: properties.name.clone(),
            identifier: format!("/gpu-intel/{}", device_id),
            device_id,
            vendor_id: properties.pci_vendor_id,
            pci_device_id: properties.pci_device_id,
            revision_id: properties.rev_id,
            driver_version: properties.driver_version,
        }
    }

    /// Identifier pattern for the vendor, e.g. `VEN_8086`.
    pub fn vendor_pattern(&self) -> String {
        format!("VEN_{:04X}", self.vendor_id)
    }

    pub fn device_pattern(&self) -> String {
        format!("DEV_{:04X}", self.pci_device_id)
    }
}
