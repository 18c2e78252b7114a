use core::fmt;

/// Error kinds produced by the Pool and Collector.
///
/// Mirrors the teacher crate's plain-enum-plus-`Display` pattern rather than
/// a derive-macro error crate: every variant is a status the caller is
/// expected to match on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RngError {
    /// `fetch` was called before `init` ever completed.
    NotInitialized,
    /// A buffer length or other argument fell outside its allowed range.
    InvalidArgument,
    /// Backing storage could not be allocated or locked.
    OutOfMemory,
    /// A required entropy source (OS RNG, timing jitter) failed.
    EntropySourceFailed,
}

impl fmt::Display for RngError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RngError::NotInitialized => {
                write!(f, "pool fetch attempted before initialization")
            }
            RngError::InvalidArgument => {
                write!(f, "argument out of range for this operation")
            }
            RngError::OutOfMemory => {
                write!(f, "failed to allocate or lock pool storage")
            }
            RngError::EntropySourceFailed => {
                write!(f, "a required entropy source failed")
            }
        }
    }
}

impl std::error::Error for RngError {}

/// Status codes returned by the three DRBG families, matching the code
/// taxonomy named in the public API surface.
///
/// States are left unchanged on [`DrbgStatus::InvalidArgument`] and
/// [`DrbgStatus::DoReseed`]; a [`DrbgStatus::Internal`] returned from a
/// generate call means the state has already been scrubbed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(i32)]
pub enum DrbgStatus {
    Success = 0,
    NotInit = -1,
    NullPtr = -2,
    InvalidArgument = -3,
    Internal = -4,
    MemFail = -5,
    DoReseed = -6,
}

impl DrbgStatus {
    /// Human-readable description, matching the `err_string(code) -> &str`
    /// surface named in the public API.
    pub fn err_string(self) -> &'static str {
        match self {
            DrbgStatus::Success => "success",
            DrbgStatus::NotInit => "DRBG not instantiated",
            DrbgStatus::NullPtr => "null pointer where non-null required",
            DrbgStatus::InvalidArgument => "argument out of range",
            DrbgStatus::Internal => "internal primitive failure",
            DrbgStatus::MemFail => "memory allocation failure",
            DrbgStatus::DoReseed => "reseed required before further generate calls",
        }
    }

    /// `true` for [`DrbgStatus::Success`].
    pub fn is_success(self) -> bool {
        matches!(self, DrbgStatus::Success)
    }

    /// Converts to a `Result`, folding [`DrbgStatus::Success`] into `Ok(())`.
    pub fn into_result(self) -> Result<(), DrbgStatus> {
        if self.is_success() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for DrbgStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.err_string())
    }
}

impl std::error::Error for DrbgStatus {}
