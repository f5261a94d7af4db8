//! UART DMA Ring-Buffer Bridge
//!
//! A `no_std`, `no_alloc` bridge between two lock-free byte ring buffers
//! and a DMA-driven UART peripheral.
//!
//! The application reads received bytes from an RX ring and writes bytes
//! to send into a TX ring. The bridge keeps both rings in step with the
//! hardware:
//!
//! - **RX**: the DMA writes straight into the RX ring's storage in circular
//!   "receive until idle" mode. The peripheral reports its write offset on
//!   half-transfer, transfer-complete and idle-line events, and the bridge
//!   turns each report into a write-cursor advance.
//! - **TX**: every write into the TX ring, and every transmit completion,
//!   tries to hand the next contiguous run of the ring to the DMA. A
//!   critical-section claim guarantees at most one transfer in flight.
//!
//! # Architecture
//!
//! 1. **Ring layer** ([`ring`]): SPSC byte ring over caller-owned storage
//! 2. **Driver layer** ([`driver`]): Lifecycle, RX reconciler, TX chain
//! 3. **HAL layer** ([`hal`]): The [`UartDma`] trait implemented by the
//!    platform's UART/DMA driver
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for public types and driver logging
//! - `embedded-io`: Implement the blocking `embedded_io` traits on
//!   [`RxReader`] and [`TxWriter`]
//!
//! A `critical-section` implementation must be provided by the HAL crate
//! (e.g. `cortex-m` with `critical-section-single-core`, or `esp-hal`).
//!
//! # Example
//!
//! ```ignore
//! use uart_rb::{UartEvent, UartRb};
//!
//! static UART_RB: UartRb<'static, MyUartDma> = UartRb::new();
//!
//! UART_RB.init(&UART_DMA, rx_storage, tx_storage).unwrap();
//! UART_RB.start().unwrap();
//!
//! // Application task
//! UART_RB.tx_writer().unwrap().write(b"AT\r\n");
//! let mut line = [0u8; 64];
//! let n = UART_RB.rx_reader().unwrap().read(&mut line);
//!
//! // UART/DMA interrupt handler
//! UART_RB.handle_event(UartEvent::RxPosition(dma_offset)).ok();
//! UART_RB.handle_event(UartEvent::TxComplete).ok();
//! ```
//!
//! # Memory Requirements
//!
//! Both storage slices are borrowed for the bridge's lifetime and must be
//! reachable by the DMA. Each ring keeps one slot empty, so a ring over
//! `N` bytes holds at most `N - 1`.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::struct_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod constants;
pub mod driver;
pub mod error;
pub mod hal;
pub mod ring;
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::{RxReader, State, TxWriter, UartRb};
pub use error::{Error, PeripheralError, PeripheralResult, Result, RingBufferError};
pub use hal::{UartDma, UartEvent};
pub use ring::{LinearBlock, RingBuffer};
