//! Dynamically loaded Intel Graphics Control Library.
//!
//! The library is opened with `libloading`, `ctlInit` is called once, and
//! the entry points are copied out as plain function pointers. All status
//! codes other than success become [`TelemonError::Control`].

pub mod ffi;

use std::ffi::c_void;
use std::mem::size_of;
use std::ptr;
use std::sync::Arc;

use libloading::Library;
use log::{debug, warn};
use once_cell::sync::OnceCell;

use self::ffi::*;
use crate::core::gpu::{
    AdapterHandle, ControlApi, DeviceProperties, DeviceType, FanHandle, FrequencyDomain,
    FrequencyHandle, FrequencyProperties, FrequencyState,
};
use crate::core::telemetry::TelemetrySnapshot;
use crate::error::{Result, TelemonError};

/// Library file searched for when no explicit path is configured.
pub fn default_library_name() -> String {
    if cfg!(windows) {
        "ControlLib.dll".to_string()
    } else {
        libloading::library_filename("ControlLib")
            .to_string_lossy()
            .into_owned()
    }
}

/// Singleton - the control library is initialised ONCE per process
static SHARED: OnceCell<Arc<ControlLibrary>> = OnceCell::new();

fn check(call: &'static str, code: CtlResult) -> Result<()> {
    if code == CTL_RESULT_SUCCESS {
        Ok(())
    } else {
        Err(TelemonError::control(call, code))
    }
}

#[derive(Clone, Copy)]
struct Entry {
    close: CtlCloseFn,
    enumerate_devices: CtlEnumerateDevicesFn,
    get_device_properties: CtlGetDevicePropertiesFn,
    power_telemetry_get: CtlPowerTelemetryGetFn,
    enum_frequency_domains: CtlEnumFrequencyDomainsFn,
    frequency_get_properties: CtlFrequencyGetPropertiesFn,
    frequency_get_state: CtlFrequencyGetStateFn,
    enum_fans: CtlEnumFansFn,
    fan_get_state: CtlFanGetStateFn,
}

/// Copy a function pointer out of the library.
fn symbol<T: Copy>(lib: &Library, name: &'static [u8]) -> Result<T> {
    // SAFETY: `T` is one of the `ffi` signatures matching the exported symbol;
    // the pointer stays valid as long as `lib` is loaded.
    unsafe {
        lib.get::<T>(name).map(|s| *s).map_err(|e| {
            TelemonError::library(format!(
                "missing symbol {}: {}",
                String::from_utf8_lossy(&name[..name.len() - 1]),
                e
            ))
        })
    }
}

/// An initialised control library session.
pub struct ControlLibrary {
    api_handle: usize,
    entry: Entry,
    _lib: Library,
}

impl ControlLibrary {
    /// Open the library at `path` (or the default name) and call `ctlInit`.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = path.map(str::to_string).unwrap_or_else(default_library_name);

        // SAFETY: loading runs the library's initialisers; the control
        // library has no unusual load-time requirements.
        let lib = unsafe { Library::new(&path) }
            .map_err(|e| TelemonError::library(format!("{}: {}", path, e)))?;

        let init: CtlInitFn = symbol(&lib, b"ctlInit\0")?;
        let entry = Entry {
            close: symbol(&lib, b"ctlClose\0")?,
            enumerate_devices: symbol(&lib, b"ctlEnumerateDevices\0")?,
            get_device_properties: symbol(&lib, b"ctlGetDeviceProperties\0")?,
            power_telemetry_get: symbol(&lib, b"ctlPowerTelemetryGet\0")?,
            enum_frequency_domains: symbol(&lib, b"ctlEnumFrequencyDomains\0")?,
            frequency_get_properties: symbol(&lib, b"ctlFrequencyGetProperties\0")?,
            frequency_get_state: symbol(&lib, b"ctlFrequencyGetState\0")?,
            enum_fans: symbol(&lib, b"ctlEnumFans\0")?,
            fan_get_state: symbol(&lib, b"ctlFanGetState\0")?,
        };

        let mut args = CtlInitArgs::zeroed();
        args.Size = size_of::<CtlInitArgs>() as u32;
        args.AppVersion = CTL_IMPL_VERSION;

        let mut api_handle: CtlApiHandle = ptr::null_mut();
        // SAFETY: both pointers refer to live locals of the expected types.
        check("ctlInit", unsafe { init(&mut args, &mut api_handle) })?;
        debug!(
            "Control library {} initialised (supported version 0x{:08X})",
            path, args.SupportedVersion
        );

        Ok(Self {
            api_handle: api_handle as usize,
            entry,
            _lib: lib,
        })
    }

    /// Process-wide instance, loaded on first use.
    pub fn shared(path: Option<&str>) -> Result<Arc<Self>> {
        SHARED
            .get_or_try_init(|| Self::load(path).map(Arc::new))
            .map(Arc::clone)
            .map_err(|e| {
                warn!("Control library unavailable: {}", e);
                e
            })
    }

    fn api(&self) -> CtlApiHandle {
        self.api_handle as CtlApiHandle
    }
}

impl Drop for ControlLibrary {
    fn drop(&mut self) {
        // SAFETY: the handle came from a successful ctlInit and is closed once.
        let code = unsafe { (self.entry.close)(self.api()) };
        if code != CTL_RESULT_SUCCESS {
            debug!("ctlClose returned 0x{:08X}", code);
        }
    }
}

fn adapter_ptr(adapter: AdapterHandle) -> CtlDeviceAdapterHandle {
    adapter.raw() as *mut c_void
}

/// Two-phase enumeration: probe the count with a null buffer, then fill.
fn probe_count(
    call: &'static str,
    f: impl Fn(*mut u32, *mut *mut c_void) -> CtlResult,
) -> Result<u32> {
    let mut count = 0u32;
    check(call, f(&mut count, ptr::null_mut()))?;
    Ok(count)
}

fn fill_handles(
    call: &'static str,
    count: u32,
    f: impl Fn(*mut u32, *mut *mut c_void) -> CtlResult,
) -> Result<Vec<usize>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let mut handles: Vec<*mut c_void> = vec![ptr::null_mut(); count as usize];
    let mut filled = count;
    check(call, f(&mut filled, handles.as_mut_ptr()))?;
    handles.truncate(filled.min(count) as usize);
    Ok(handles.into_iter().map(|h| h as usize).collect())
}

impl ControlApi for ControlLibrary {
    fn enumerate_adapters(&self) -> Result<Vec<AdapterHandle>> {
        let call = |count: *mut u32, buf: *mut *mut c_void| {
            // SAFETY: count is a live u32, buf is null or holds `*count` slots.
            unsafe { (self.entry.enumerate_devices)(self.api(), count, buf) }
        };
        let count = probe_count("ctlEnumerateDevices", call)?;
        Ok(fill_handles("ctlEnumerateDevices", count, call)?
            .into_iter()
            .map(AdapterHandle::new)
            .collect())
    }

    fn device_properties(&self, adapter: AdapterHandle) -> Result<DeviceProperties> {
        let mut luid = [0u8; 8];
        let mut props = CtlDeviceAdapterProperties::zeroed();
        props.Size = size_of::<CtlDeviceAdapterProperties>() as u32;
        props.Version = 2;
        props.pDeviceID = luid.as_mut_ptr() as *mut c_void;
        props.device_id_size = luid.len() as u32;

        // SAFETY: props is sized and versioned, pDeviceID points at `luid`.
        check("ctlGetDeviceProperties", unsafe {
            (self.entry.get_device_properties)(adapter_ptr(adapter), &mut props)
        })?;

        Ok(DeviceProperties {
            name: props.name(),
            pci_vendor_id: props.pci_vendor_id,
            pci_device_id: props.pci_device_id,
            rev_id: props.rev_id,
            driver_version: props.driver_version,
            device_type: DeviceType::from_raw(props.device_type),
        })
    }

    fn power_telemetry(&self, adapter: AdapterHandle) -> Result<TelemetrySnapshot> {
        let mut raw = CtlPowerTelemetry::zeroed();
        raw.Size = size_of::<CtlPowerTelemetry>() as u32;
        raw.Version = 1;

        // SAFETY: raw is a sized, versioned, zeroed telemetry struct.
        check("ctlPowerTelemetryGet", unsafe {
            (self.entry.power_telemetry_get)(adapter_ptr(adapter), &mut raw)
        })?;

        Ok(TelemetrySnapshot {
            timestamp: raw.timeStamp.to_item(),
            gpu_energy: raw.gpuEnergyCounter.to_item(),
            total_card_energy: raw.totalCardEnergyCounter.to_item(),
            gpu_temperature: raw.gpuCurrentTemperature.to_item(),
            vram_temperature: raw.vramCurrentTemperature.to_item(),
            gpu_clock: raw.gpuCurrentClockFrequency.to_item(),
            vram_clock: raw.vramCurrentClockFrequency.to_item(),
            gpu_voltage: raw.gpuVoltage.to_item(),
            vram_voltage: raw.vramVoltage.to_item(),
            global_activity: raw.globalActivityCounter.to_item(),
            render_compute_activity: raw.renderComputeActivityCounter.to_item(),
            media_activity: raw.mediaActivityCounter.to_item(),
            vram_read_bandwidth: raw.vramReadBandwidth.to_item(),
            vram_write_bandwidth: raw.vramWriteBandwidth.to_item(),
        })
    }

    fn frequency_domain_count(&self, adapter: AdapterHandle) -> Result<u32> {
        probe_count("ctlEnumFrequencyDomains", |count, buf| {
            // SAFETY: see `enumerate_adapters`.
            unsafe { (self.entry.enum_frequency_domains)(adapter_ptr(adapter), count, buf) }
        })
    }

    fn enum_frequency_domains(
        &self,
        adapter: AdapterHandle,
        count: u32,
    ) -> Result<Vec<FrequencyHandle>> {
        let handles = fill_handles("ctlEnumFrequencyDomains", count, |count, buf| {
            // SAFETY: see `enumerate_adapters`.
            unsafe { (self.entry.enum_frequency_domains)(adapter_ptr(adapter), count, buf) }
        })?;
        Ok(handles.into_iter().map(FrequencyHandle::new).collect())
    }

    fn frequency_properties(&self, domain: FrequencyHandle) -> Result<FrequencyProperties> {
        let mut props = CtlFreqProperties::zeroed();
        props.Size = size_of::<CtlFreqProperties>() as u32;

        // SAFETY: props is a sized, zeroed properties struct.
        check("ctlFrequencyGetProperties", unsafe {
            (self.entry.frequency_get_properties)(domain.raw() as CtlFreqHandle, &mut props)
        })?;

        Ok(FrequencyProperties {
            domain: FrequencyDomain::from_raw(props.domain_type),
            can_control: props.canControl,
            min: props.min,
            max: props.max,
        })
    }

    fn frequency_state(&self, domain: FrequencyHandle) -> Result<FrequencyState> {
        let mut state = CtlFreqState::zeroed();
        state.Size = size_of::<CtlFreqState>() as u32;

        // SAFETY: state is a sized, zeroed state struct.
        check("ctlFrequencyGetState", unsafe {
            (self.entry.frequency_get_state)(domain.raw() as CtlFreqHandle, &mut state)
        })?;

        Ok(FrequencyState {
            current_voltage: state.currentVoltage,
            request: state.request,
            tdp: state.tdp,
            efficient: state.efficient,
            actual: state.actual,
            throttle_reasons: state.throttleReasons,
        })
    }

    fn fan_count(&self, adapter: AdapterHandle) -> Result<u32> {
        probe_count("ctlEnumFans", |count, buf| {
            // SAFETY: see `enumerate_adapters`.
            unsafe { (self.entry.enum_fans)(adapter_ptr(adapter), count, buf) }
        })
    }

    fn enum_fans(&self, adapter: AdapterHandle, count: u32) -> Result<Vec<FanHandle>> {
        let handles = fill_handles("ctlEnumFans", count, |count, buf| {
            // SAFETY: see `enumerate_adapters`.
            unsafe { (self.entry.enum_fans)(adapter_ptr(adapter), count, buf) }
        })?;
        Ok(handles.into_iter().map(FanHandle::new).collect())
    }

    fn fan_speed_rpm(&self, fan: FanHandle) -> Result<i32> {
        let mut speed = -1i32;
        // SAFETY: speed is a live i32.
        check("ctlFanGetState", unsafe {
            (self.entry.fan_get_state)(fan.raw() as CtlFanHandle, CTL_FAN_SPEED_UNITS_RPM, &mut speed)
        })?;
        Ok(speed)
    }
}
