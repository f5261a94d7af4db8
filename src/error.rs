//! Error types for the UART ring-buffer bridge
//!
//! Errors are organized by domain for better diagnostics:
//! - [`RingBufferError`]: Storage rejected by a ring buffer
//! - [`PeripheralError`]: Failures reported by the UART/DMA driver
//!
//! The unified [`Error`] enum adds the lifecycle and argument errors and
//! is returned by every fallible [`UartRb`](crate::UartRb) method.

// =============================================================================
// Ring Buffer Errors
// =============================================================================

/// Ring buffer storage errors
///
/// Reported when binding storage to a [`RingBuffer`](crate::ring::RingBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RingBufferError {
    /// Storage cannot hold a single byte (one slot is reserved)
    StorageTooSmall,
}

impl core::fmt::Display for RingBufferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RingBufferError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RingBufferError::StorageTooSmall => "storage too small for ring buffer",
        }
    }
}

// =============================================================================
// Peripheral Errors
// =============================================================================

/// UART/DMA driver errors
///
/// Returned by [`UartDma`](crate::hal::UartDma) implementations when a
/// transfer request cannot be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeripheralError {
    /// Channel already has a transfer outstanding
    Busy,
    /// Request parameters rejected by the driver
    Rejected,
    /// Hardware fault (bus error, peripheral not clocked, ...)
    Hardware,
}

impl core::fmt::Display for PeripheralError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PeripheralError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PeripheralError::Busy => "peripheral busy",
            PeripheralError::Rejected => "request rejected by peripheral",
            PeripheralError::Hardware => "peripheral hardware fault",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps argument, lifecycle and domain errors for unified handling.
///
/// ```ignore
/// match uart.init(&periph, rx, tx) {
///     Err(Error::InvalidState) => { /* already initialized */ }
///     Err(Error::RingBuffer(RingBufferError::StorageTooSmall)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Argument failed validation (empty storage, position out of range)
    InvalidArgument,
    /// Operation not allowed in the current lifecycle state
    InvalidState,
    /// Ring buffer rejected its storage
    RingBuffer(RingBufferError),
    /// UART/DMA driver rejected a request
    Peripheral(PeripheralError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidArgument => f.write_str("invalid argument"),
            Error::InvalidState => f.write_str("invalid state for operation"),
            Error::RingBuffer(e) => write!(f, "ring buffer: {}", e.as_str()),
            Error::Peripheral(e) => write!(f, "peripheral: {}", e.as_str()),
        }
    }
}

// From impls for automatic conversion
impl From<RingBufferError> for Error {
    fn from(e: RingBufferError) -> Self {
        Error::RingBuffer(e)
    }
}

impl From<PeripheralError> for Error {
    fn from(e: PeripheralError) -> Self {
        Error::Peripheral(e)
    }
}

#[cfg(feature = "embedded-io")]
impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Error::InvalidArgument => embedded_io::ErrorKind::InvalidInput,
            Error::InvalidState => embedded_io::ErrorKind::NotConnected,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

/// Result type alias for bridge operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for peripheral requests
pub type PeripheralResult<T> = core::result::Result<T, PeripheralError>;

// =============================================================================
// Unit Tests
// =============================================================================
