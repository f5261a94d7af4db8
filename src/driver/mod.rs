//! Core driver components for the UART ring-buffer bridge.
//!
//! - [`uart_rb`] - The [`UartRb`] structure and its lifecycle
//! - [`state`] - Lifecycle state
//! - [`rx`] - DMA write-offset reconciliation
//! - [`tx`] - Transmit chaining
//! - [`io`] - Reader/writer views for the application
//!
//! # Example
//!
//! ```ignore
//! use uart_rb::driver::{State, UartRb};
//!
//! static UART_RB: UartRb<'static, MyUartDma> = UartRb::new();
//! assert_eq!(UART_RB.state(), State::Uninitialized);
//! ```

// Submodules
pub mod io;
pub mod rx;
pub mod state;
pub mod tx;
pub mod uart_rb;

// Re-exports for convenience
pub use io::{RxReader, TxWriter};
pub use rx::rx_delta;
pub use state::State;
pub use uart_rb::UartRb;
