//! OS display-device enumeration.
//!
//! On Windows every display interface is listed through CfgMgr32 and its
//! memory accounting read through the D3DKMT thunks. Other platforms have
//! no equivalent source and report an empty device list.

use std::sync::Arc;

use crate::core::gpu::{DisplayDeviceRecord, DisplayDeviceSource};
use crate::error::{Result, TelemonError};

/// A source with no devices.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDisplayDevices;

impl DisplayDeviceSource for NoDisplayDevices {
    fn device_identifiers(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn device_info(&self, identifier: &str) -> Result<DisplayDeviceRecord> {
        Err(TelemonError::display_device(format!(
            "{}: display devices are not available on this platform",
            identifier
        )))
    }
}

/// Display-device source for the current platform.
pub fn system_display_devices() -> Arc<dyn DisplayDeviceSource> {
    #[cfg(windows)]
    {
        Arc::new(d3dkmt::D3dkmtDisplayDevices)
    }
    #[cfg(not(windows))]
    {
        Arc::new(NoDisplayDevices)
    }
}

/// Split a double-NUL terminated UTF-16 string list.
pub fn split_multi_sz(buffer: &[u16]) -> Vec<String> {
    buffer
        .split(|&c| c == 0)
        .filter(|s| !s.is_empty())
        .map(String::from_utf16_lossy)
        .collect()
}

const ADAPTER_SOFTWARE_DEVICE: u32 = 0x4;
const ADAPTER_HYBRID_INTEGRATED: u32 = 0x20;

/// Per-segment statistics used to build a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentUsage {
    pub aperture: bool,
    pub commit_limit: u64,
    pub bytes_resident: u64,
}

/// Fold adapter flags and segment statistics into a record.
pub fn build_record(
    identifier: &str,
    adapter_flags: u32,
    video_memory_limit: u64,
    segments: &[SegmentUsage],
) -> Result<DisplayDeviceRecord> {
    if adapter_flags & ADAPTER_SOFTWARE_DEVICE != 0 {
        return Err(TelemonError::display_device(format!(
            "{} is a software adapter",
            identifier
        )));
    }

    let dedicated: Vec<&SegmentUsage> = segments.iter().filter(|s| !s.aperture).collect();
    Ok(DisplayDeviceRecord {
        identifier: identifier.to_string(),
        integrated: adapter_flags & ADAPTER_HYBRID_INTEGRATED != 0 || dedicated.is_empty(),
        dedicated_memory_limit: dedicated.iter().map(|s| s.commit_limit).sum(),
        dedicated_memory_used: dedicated.iter().map(|s| s.bytes_resident).sum(),
        video_memory_limit,
    })
}

#[cfg(windows)]
mod d3dkmt {
    use std::ffi::c_void;
    use std::mem::size_of;
    use std::ptr;

    use windows_sys::core::GUID;
    use windows_sys::Wdk::Graphics::Direct3D::{
        D3DKMTCloseAdapter, D3DKMTOpenAdapterFromDeviceName, D3DKMTQueryAdapterInfo,
        D3DKMTQueryStatistics, D3DKMT_ADAPTERTYPE, D3DKMT_CLOSEADAPTER,
        D3DKMT_OPENADAPTERFROMDEVICENAME, D3DKMT_QUERYADAPTERINFO, D3DKMT_QUERYSTATISTICS,
        D3DKMT_QUERYSTATISTICS_ADAPTER, D3DKMT_QUERYSTATISTICS_QUERY_SEGMENT,
        D3DKMT_QUERYSTATISTICS_SEGMENT, D3DKMT_SEGMENTSIZEINFO, KMTQAITYPE_ADAPTERTYPE,
        KMTQAITYPE_GETSEGMENTSIZE,
    };
    use windows_sys::Win32::Devices::DeviceAndDriverInstallation::{
        CM_Get_Device_Interface_ListW, CM_Get_Device_Interface_List_SizeW,
        CM_GET_DEVICE_INTERFACE_LIST_PRESENT, CR_SUCCESS,
    };
    use windows_sys::Win32::Devices::Display::GUID_DISPLAY_DEVICE_ARRIVAL;
    use windows_sys::Win32::Foundation::LUID;

    use super::{build_record, split_multi_sz, SegmentUsage};
    use crate::core::gpu::{DisplayDeviceRecord, DisplayDeviceSource};
    use crate::error::{Result, TelemonError};

    const STATUS_SUCCESS: i32 = 0;

    fn zeroed<T>() -> T {
        // SAFETY: only used for the plain-data D3DKMT structs below, for which
        // all-zero bytes are the documented initial state.
        unsafe { std::mem::zeroed() }
    }

    fn nt_check(call: &str, status: i32) -> Result<()> {
        if status == STATUS_SUCCESS {
            Ok(())
        } else {
            Err(TelemonError::display_device(format!(
                "{} failed with NTSTATUS 0x{:08X}",
                call, status as u32
            )))
        }
    }

    /// Display devices enumerated through CfgMgr32 and D3DKMT.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct D3dkmtDisplayDevices;

    /// Open adapter, closed on drop.
    struct Adapter {
        handle: u32,
        luid: LUID,
    }

    impl Adapter {
        fn open(identifier: &str) -> Result<Self> {
            let wide: Vec<u16> = identifier.encode_utf16().chain(std::iter::once(0)).collect();
            let mut open: D3DKMT_OPENADAPTERFROMDEVICENAME = zeroed();
            open.pDeviceName = wide.as_ptr();

            // SAFETY: `wide` outlives the call and is NUL terminated.
            nt_check("D3DKMTOpenAdapterFromDeviceName", unsafe {
                D3DKMTOpenAdapterFromDeviceName(&mut open)
            })?;

            Ok(Self {
                handle: open.hAdapter,
                luid: open.AdapterLuid,
            })
        }

        fn query_info<T>(&self, kind: i32, out: &mut T) -> Result<()> {
            let mut query: D3DKMT_QUERYADAPTERINFO = zeroed();
            query.hAdapter = self.handle;
            query.Type = kind;
            query.pPrivateDriverData = out as *mut T as *mut c_void;
            query.PrivateDriverDataSize = size_of::<T>() as u32;

            // SAFETY: the output buffer is exactly `size_of::<T>()` bytes.
            nt_check("D3DKMTQueryAdapterInfo", unsafe {
                D3DKMTQueryAdapterInfo(&mut query)
            })
        }

        fn adapter_flags(&self) -> Result<u32> {
            let mut adapter_type: D3DKMT_ADAPTERTYPE = zeroed();
            self.query_info(KMTQAITYPE_ADAPTERTYPE, &mut adapter_type)?;
            // SAFETY: the union is a single 32-bit flag word.
            Ok(unsafe { adapter_type.Anonymous.Value })
        }

        fn segment_sizes(&self) -> Result<D3DKMT_SEGMENTSIZEINFO> {
            let mut sizes: D3DKMT_SEGMENTSIZEINFO = zeroed();
            self.query_info(KMTQAITYPE_GETSEGMENTSIZE, &mut sizes)?;
            Ok(sizes)
        }

        fn segment_count(&self) -> Result<u32> {
            let mut stats: D3DKMT_QUERYSTATISTICS = zeroed();
            stats.Type = D3DKMT_QUERYSTATISTICS_ADAPTER;
            stats.AdapterLuid = self.luid;

            // SAFETY: stats is initialised for an adapter query.
            nt_check("D3DKMTQueryStatistics", unsafe { D3DKMTQueryStatistics(&mut stats) })?;
            // SAFETY: an adapter query fills AdapterInformation.
            Ok(unsafe { stats.QueryResult.AdapterInformation.NbSegments })
        }

        fn segment(&self, segment_id: u32) -> Result<SegmentUsage> {
            let mut stats: D3DKMT_QUERYSTATISTICS = zeroed();
            stats.Type = D3DKMT_QUERYSTATISTICS_SEGMENT;
            stats.AdapterLuid = self.luid;
            stats.Anonymous.QuerySegment = D3DKMT_QUERYSTATISTICS_QUERY_SEGMENT {
                SegmentId: segment_id,
            };

            // SAFETY: stats is initialised for a segment query.
            nt_check("D3DKMTQueryStatistics", unsafe { D3DKMTQueryStatistics(&mut stats) })?;
            // SAFETY: a segment query fills SegmentInformation.
            let info = unsafe { stats.QueryResult.SegmentInformation };
            Ok(SegmentUsage {
                aperture: info.Aperture != 0,
                commit_limit: info.CommitLimit,
                bytes_resident: info.BytesResident,
            })
        }
    }

    impl Drop for Adapter {
        fn drop(&mut self) {
            let close = D3DKMT_CLOSEADAPTER {
                hAdapter: self.handle,
            };
            // SAFETY: the handle came from a successful open and is closed once.
            let _ = unsafe { D3DKMTCloseAdapter(&close) };
        }
    }

    impl DisplayDeviceSource for D3dkmtDisplayDevices {
        fn device_identifiers(&self) -> Result<Vec<String>> {
            let guid: GUID = GUID_DISPLAY_DEVICE_ARRIVAL;
            let mut len = 0u32;

            // SAFETY: len is a live u32, the GUID is a static constant.
            let status = unsafe {
                CM_Get_Device_Interface_List_SizeW(
                    &mut len,
                    &guid,
                    ptr::null(),
                    CM_GET_DEVICE_INTERFACE_LIST_PRESENT,
                )
            };
            if status != CR_SUCCESS {
                return Err(TelemonError::display_device(format!(
                    "CM_Get_Device_Interface_List_SizeW returned {}",
                    status
                )));
            }
            if len <= 1 {
                return Ok(Vec::new());
            }

            let mut buffer = vec![0u16; len as usize];
            // SAFETY: buffer holds `len` UTF-16 units as the size probe requested.
            let status = unsafe {
                CM_Get_Device_Interface_ListW(
                    &guid,
                    ptr::null(),
                    buffer.as_mut_ptr(),
                    len,
                    CM_GET_DEVICE_INTERFACE_LIST_PRESENT,
                )
            };
            if status != CR_SUCCESS {
                return Err(TelemonError::display_device(format!(
                    "CM_Get_Device_Interface_ListW returned {}",
                    status
                )));
            }

            Ok(split_multi_sz(&buffer))
        }

        fn device_info(&self, identifier: &str) -> Result<DisplayDeviceRecord> {
            let adapter = Adapter::open(identifier)?;
            let flags = adapter.adapter_flags()?;
            let sizes = adapter.segment_sizes()?;

            let segments = (0..adapter.segment_count()?)
                .map(|id| adapter.segment(id))
                .collect::<Result<Vec<_>>>()?;

            build_record(identifier, flags, sizes.DedicatedVideoMemorySize, &segments)
        }
    }
}

#[cfg(windows)]
pub use d3dkmt::D3dkmtDisplayDevices;
