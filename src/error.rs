use thiserror::Error;

/// Custom error type for telemon
#[derive(Error, Debug)]
pub enum TelemonError {
    #[error("Control library not available: {0}")]
    LibraryLoad(String),

    #[error("{call} failed with status 0x{code:08X}")]
    Control { call: &'static str, code: u32 },

    #[error("Not a graphics adapter: {0}")]
    NotAGpu(String),

    #[error("Display device error: {0}")]
    DisplayDevice(String),

    #[error("No supported GPU found")]
    NoDevices,
}

/// Result type alias for telemon
pub type Result<T> = std::result::Result<T, TelemonError>;

impl TelemonError {
    /// Create a library load error
    pub fn library<S: Into<String>>(msg: S) -> Self {
        TelemonError::LibraryLoad(msg.into())
    }

    /// Create an error for a vendor call that returned a non-success status
    pub fn control(call: &'static str, code: u32) -> Self {
        TelemonError::Control { call, code }
    }

    pub fn not_a_gpu<S: Into<String>>(msg: S) -> Self {
        TelemonError::NotAGpu(msg.into())
    }

    pub fn display_device<S: Into<String>>(msg: S) -> Self {
        TelemonError::DisplayDevice(msg.into())
    }
}
