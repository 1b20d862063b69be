//! The set of GPU nodes built from the control library's adapter list.

use std::sync::Arc;

use log::info;

use super::gpu::{ControlApi, DisplayDeviceSource, IntelDiscreteGpu};
use super::hardware::{Hardware, HardwareReport};
use crate::error::{Result, TelemonError};

pub struct HardwareMonitor {
    gpus: Vec<IntelDiscreteGpu>,
}

impl HardwareMonitor {
    /// Build one node per adapter and keep the valid ones.
    ///
    /// Fails with [`TelemonError::NoDevices`] when no adapter is a graphics
    /// device.
    pub fn open(api: Arc<dyn ControlApi>, display: Arc<dyn DisplayDeviceSource>) -> Result<Self> {
        let adapters = api.enumerate_adapters()?;
        let total = adapters.len();

        let gpus: Vec<IntelDiscreteGpu> = adapters
            .into_iter()
            .map(|adapter| IntelDiscreteGpu::new(Arc::clone(&api), Arc::clone(&display), adapter))
            .filter(IntelDiscreteGpu::is_valid)
            .collect();

        info!("{} of {} adapters accepted", gpus.len(), total);
        if gpus.is_empty() {
            return Err(TelemonError::NoDevices);
        }
        Ok(Self { gpus })
    }

    pub fn gpus(&self) -> &[IntelDiscreteGpu] {
        &self.gpus
    }

    pub fn len(&self) -> usize {
        self.gpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gpus.is_empty()
    }

    /// Update every node in turn.
    pub fn update(&mut self) {
        for gpu in &mut self.gpus {
            gpu.update();
        }
    }

    pub fn report(&self) -> Vec<HardwareReport> {
        self.gpus.iter().map(|gpu| gpu.report()).collect()
    }
}
