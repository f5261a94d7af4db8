//! Hardware Abstraction Layer
//!
//! The seam between the bridge and the HAL that owns the UART and DMA
//! channels.
//!
//! # Modules
//!
//! - [`uart`]: The [`UartDma`] trait and the [`UartEvent`] notification type

pub mod uart;

// Re-export commonly used types
pub use uart::{UartDma, UartEvent};
