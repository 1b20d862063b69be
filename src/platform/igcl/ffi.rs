//! `#[repr(C)]` layouts and entry-point signatures of the Intel Graphics
//! Control Library. Field order matches the C headers exactly.

#![allow(non_snake_case)]

use std::ffi::{c_char, c_void};

use crate::core::telemetry::{TelemetryItem, TelemetryUnit, TelemetryValue};

pub type CtlResult = u32;
pub type CtlApiHandle = *mut c_void;
pub type CtlDeviceAdapterHandle = *mut c_void;
pub type CtlFreqHandle = *mut c_void;
pub type CtlFanHandle = *mut c_void;

pub const CTL_RESULT_SUCCESS: CtlResult = 0;

pub const CTL_IMPL_MAJOR_VERSION: u32 = 1;
pub const CTL_IMPL_MINOR_VERSION: u32 = 1;
pub const CTL_IMPL_VERSION: u32 = (CTL_IMPL_MAJOR_VERSION << 16) | CTL_IMPL_MINOR_VERSION;

pub const CTL_FAN_SPEED_UNITS_RPM: u32 = 0;

pub const CTL_PSU_COUNT: usize = 5;
pub const CTL_FAN_COUNT: usize = 5;
pub const CTL_MAX_DEVICE_NAME_LEN: usize = 100;
pub const CTL_MAX_RESERVED_SIZE: usize = 112;

const CTL_DATA_TYPE_INT8: u32 = 0;
const CTL_DATA_TYPE_UINT8: u32 = 1;
const CTL_DATA_TYPE_INT16: u32 = 2;
const CTL_DATA_TYPE_UINT16: u32 = 3;
const CTL_DATA_TYPE_INT32: u32 = 4;
const CTL_DATA_TYPE_UINT32: u32 = 5;
const CTL_DATA_TYPE_INT64: u32 = 6;
const CTL_DATA_TYPE_UINT64: u32 = 7;
const CTL_DATA_TYPE_FLOAT: u32 = 8;
const CTL_DATA_TYPE_DOUBLE: u32 = 9;

/// Zero-initialised value of a plain C struct.
pub trait Zeroed: Sized {
    fn zeroed() -> Self {
        // SAFETY: only implemented for #[repr(C)] structs made of integers,
        // floats, bools, raw pointers and arrays of those, where all-zero
        // bytes are a valid value.
        unsafe { std::mem::zeroed() }
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CtlApplicationId {
    pub Data1: u32,
    pub Data2: u16,
    pub Data3: u16,
    pub Data4: [u8; 8],
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CtlInitArgs {
    pub Size: u32,
    pub Version: u8,
    pub AppVersion: u32,
    pub flags: u32,
    pub SupportedVersion: u32,
    pub ApplicationUID: CtlApplicationId,
}

impl Zeroed for CtlInitArgs {}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CtlFirmwareVersion {
    pub major_version: u64,
    pub minor_version: u64,
    pub build_number: u64,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CtlAdapterBdf {
    pub bus: u8,
    pub device: u8,
    pub function: u8,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CtlDeviceAdapterProperties {
    pub Size: u32,
    pub Version: u8,
    /// Caller-owned buffer receiving the adapter LUID.
    pub pDeviceID: *mut c_void,
    pub device_id_size: u32,
    pub device_type: u32,
    pub supported_subfunction_flags: u32,
    pub driver_version: u64,
    pub firmware_version: CtlFirmwareVersion,
    pub pci_vendor_id: u32,
    pub pci_device_id: u32,
    pub rev_id: u32,
    pub num_eus_per_sub_slice: u32,
    pub num_sub_slices_per_slice: u32,
    pub num_slices: u32,
    pub name: [c_char; CTL_MAX_DEVICE_NAME_LEN],
    pub graphics_adapter_properties: u32,
    pub Frequency: u32,
    pub pci_subsys_id: u16,
    pub pci_subsys_vendor_id: u16,
    pub adapter_bdf: CtlAdapterBdf,
    pub reserved: [c_char; CTL_MAX_RESERVED_SIZE],
}

impl Zeroed for CtlDeviceAdapterProperties {}

impl CtlDeviceAdapterProperties {
    pub fn name(&self) -> String {
        let bytes: Vec<u8> = self
            .name
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        String::from_utf8_lossy(&bytes).trim().to_string()
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union CtlDataValue {
    pub data8: i8,
    pub datau8: u8,
    pub data16: i16,
    pub datau16: u16,
    pub data32: i32,
    pub datau32: u32,
    pub data64: i64,
    pub datau64: u64,
    pub datafloat: f32,
    pub datadouble: f64,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CtlOcTelemetryItem {
    pub bSupported: bool,
    pub units: u32,
    pub data_type: u32,
    pub value: CtlDataValue,
}

impl CtlOcTelemetryItem {
    /// Decode the union according to its type tag. This is the only place
    /// the payload is reinterpreted.
    pub fn to_item(&self) -> TelemetryItem {
        if !self.bSupported {
            return TelemetryItem::unsupported();
        }

        // SAFETY: every union member is plain data within the same 8 bytes;
        // the tag selects the member the driver wrote.
        let value = unsafe {
            match self.data_type {
                CTL_DATA_TYPE_INT8 => TelemetryValue::Int8(self.value.data8),
                CTL_DATA_TYPE_UINT8 => TelemetryValue::UInt8(self.value.datau8),
                CTL_DATA_TYPE_INT16 => TelemetryValue::Int16(self.value.data16),
                CTL_DATA_TYPE_UINT16 => TelemetryValue::UInt16(self.value.datau16),
                CTL_DATA_TYPE_INT32 => TelemetryValue::Int32(self.value.data32),
                CTL_DATA_TYPE_UINT32 => TelemetryValue::UInt32(self.value.datau32),
                CTL_DATA_TYPE_INT64 => TelemetryValue::Int64(self.value.data64),
                CTL_DATA_TYPE_UINT64 => TelemetryValue::UInt64(self.value.datau64),
                CTL_DATA_TYPE_FLOAT => TelemetryValue::Float(self.value.datafloat),
                CTL_DATA_TYPE_DOUBLE => TelemetryValue::Double(self.value.datadouble),
                other => TelemetryValue::Unknown(other),
            }
        };

        TelemetryItem::new(TelemetryUnit::from_raw(self.units), value)
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CtlPsuInfo {
    pub bSupported: bool,
    pub psuType: u32,
    pub energyCounter: CtlOcTelemetryItem,
    pub voltage: CtlOcTelemetryItem,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CtlPowerTelemetry {
    pub Size: u32,
    pub Version: u8,
    pub timeStamp: CtlOcTelemetryItem,
    pub gpuEnergyCounter: CtlOcTelemetryItem,
    pub gpuVoltage: CtlOcTelemetryItem,
    pub gpuCurrentClockFrequency: CtlOcTelemetryItem,
    pub gpuCurrentTemperature: CtlOcTelemetryItem,
    pub globalActivityCounter: CtlOcTelemetryItem,
    pub renderComputeActivityCounter: CtlOcTelemetryItem,
    pub mediaActivityCounter: CtlOcTelemetryItem,
    pub gpuPowerLimited: bool,
    pub gpuTemperatureLimited: bool,
    pub gpuCurrentLimited: bool,
    pub gpuVoltageLimited: bool,
    pub gpuUtilizationLimited: bool,
    pub vramEnergyCounter: CtlOcTelemetryItem,
    pub vramVoltage: CtlOcTelemetryItem,
    pub vramCurrentClockFrequency: CtlOcTelemetryItem,
    pub vramCurrentEffectiveFrequency: CtlOcTelemetryItem,
    pub vramReadBandwidthCounter: CtlOcTelemetryItem,
    pub vramWriteBandwidthCounter: CtlOcTelemetryItem,
    pub vramCurrentTemperature: CtlOcTelemetryItem,
    pub vramPowerLimited: bool,
    pub vramTemperatureLimited: bool,
    pub vramCurrentLimited: bool,
    pub vramVoltageLimited: bool,
    pub vramUtilizationLimited: bool,
    pub totalCardEnergyCounter: CtlOcTelemetryItem,
    pub psu: [CtlPsuInfo; CTL_PSU_COUNT],
    pub fanSpeed: [CtlOcTelemetryItem; CTL_FAN_COUNT],
    pub gpuVrTemp: CtlOcTelemetryItem,
    pub vramVrTemp: CtlOcTelemetryItem,
    pub saVrTemp: CtlOcTelemetryItem,
    pub gpuEffectiveClock: CtlOcTelemetryItem,
    pub gpuOverVoltagePercent: CtlOcTelemetryItem,
    pub gpuPowerPercent: CtlOcTelemetryItem,
    pub gpuTemperaturePercent: CtlOcTelemetryItem,
    pub vramReadBandwidth: CtlOcTelemetryItem,
    pub vramWriteBandwidth: CtlOcTelemetryItem,
}

impl Zeroed for CtlPowerTelemetry {}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CtlFreqProperties {
    pub Size: u32,
    pub Version: u8,
    pub domain_type: u32,
    pub canControl: bool,
    pub min: f64,
    pub max: f64,
}

impl Zeroed for CtlFreqProperties {}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CtlFreqState {
    pub Size: u32,
    pub Version: u8,
    pub currentVoltage: f64,
    pub request: f64,
    pub tdp: f64,
    pub efficient: f64,
    pub actual: f64,
    pub throttleReasons: u32,
}

impl Zeroed for CtlFreqState {}

pub type CtlInitFn = unsafe extern "C" fn(*mut CtlInitArgs, *mut CtlApiHandle) -> CtlResult;
pub type CtlCloseFn = unsafe extern "C" fn(CtlApiHandle) -> CtlResult;
pub type CtlEnumerateDevicesFn =
    unsafe extern "C" fn(CtlApiHandle, *mut u32, *mut CtlDeviceAdapterHandle) -> CtlResult;
pub type CtlGetDevicePropertiesFn =
    unsafe extern "C" fn(CtlDeviceAdapterHandle, *mut CtlDeviceAdapterProperties) -> CtlResult;
pub type CtlPowerTelemetryGetFn =
    unsafe extern "C" fn(CtlDeviceAdapterHandle, *mut CtlPowerTelemetry) -> CtlResult;
pub type CtlEnumFrequencyDomainsFn =
    unsafe extern "C" fn(CtlDeviceAdapterHandle, *mut u32, *mut CtlFreqHandle) -> CtlResult;
pub type CtlFrequencyGetPropertiesFn =
    unsafe extern "C" fn(CtlFreqHandle, *mut CtlFreqProperties) -> CtlResult;
pub type CtlFrequencyGetStateFn =
    unsafe extern "C" fn(CtlFreqHandle, *mut CtlFreqState) -> CtlResult;
pub type CtlEnumFansFn =
    unsafe extern "C" fn(CtlDeviceAdapterHandle, *mut u32, *mut CtlFanHandle) -> CtlResult;
pub type CtlFanGetStateFn = unsafe extern "C" fn(CtlFanHandle, u32, *mut i32) -> CtlResult;
