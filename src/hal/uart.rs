//! UART/DMA peripheral abstraction
//!
//! The bridge never touches UART or DMA registers itself. HAL glue code
//! implements [`UartDma`] for its peripheral and forwards the hardware
//! callbacks to [`UartRb`](crate::UartRb), either by calling the two
//! notification methods directly or by wrapping them in a [`UartEvent`].

use crate::error::PeripheralResult;

// =============================================================================
// UART DMA Trait
// =============================================================================

/// Trait for a DMA-driven UART peripheral
///
/// Methods take `&self` because the peripheral is shared between task
/// and interrupt context; implementations are expected to use the HAL's
/// own interior mutability (registers, critical sections).
///
/// # Contract
///
/// - After [`begin_receive_until_idle`](Self::begin_receive_until_idle)
///   succeeds the implementation reports the absolute DMA write offset
///   through [`UartRb::notify_rx_position`](crate::UartRb::notify_rx_position)
///   on half-transfer, transfer-complete and idle-line events, wrapping
///   circularly over the whole buffer until [`abort_receive`](Self::abort_receive).
/// - After [`begin_transmit`](Self::begin_transmit) succeeds the
///   implementation calls
///   [`UartRb::notify_tx_complete`](crate::UartRb::notify_tx_complete)
///   exactly once when the transfer finishes.
pub trait UartDma {
    /// Start continuous circular reception into `buffer[..len]`
    ///
    /// The memory stays valid and untouched by the CPU writer for as long as
    /// reception runs; the bridge only reads bytes the peripheral has
    /// reported as written.
    fn begin_receive_until_idle(&self, buffer: *mut u8, len: usize) -> PeripheralResult<()>;

    /// Start an asynchronous transmit of `len` bytes at `data`
    ///
    /// The bytes stay valid until the transfer completes, provided the
    /// transmit ring is larger than any single chunk handed to DMA.
    fn begin_transmit(&self, data: *const u8, len: usize) -> PeripheralResult<()>;

    /// Abort an outstanding reception, discarding anything not yet reported
    fn abort_receive(&self);
}

// =============================================================================
// Events
// =============================================================================

/// Hardware notification delivered to the bridge
///
/// # Example
///
/// ```ignore
/// #[interrupt]
/// fn USART1() {
///     if let Some(pos) = hal_rx_event_position() {
///         UART_RB.handle_event(UartEvent::RxPosition(pos)).ok();
///     }
///     if hal_tx_complete() {
///         UART_RB.handle_event(UartEvent::TxComplete).ok();
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartEvent {
    /// Absolute DMA write offset into the RX storage
    RxPosition(usize),
    /// Outstanding transmit finished
    TxComplete,
}
