//! Core bridge structure and lifecycle.
//!
//! This module contains the [`UartRb`] structure and its lifecycle
//! operations:
//!
//! - Initialization (binding storage and peripheral)
//! - Start/stop of continuous reception
//! - Deinitialization
//! - Event dispatch
//!
//! For the receive path, see the [`rx`](super::rx) module.
//! For the transmit chain, see the [`tx`](super::tx) module.

use core::sync::atomic::{AtomicUsize, Ordering};

use super::state::{Lifecycle, State};
use crate::error::{Error, Result};
use crate::hal::{UartDma, UartEvent};
use crate::ring::RingBuffer;
use crate::sync::{CriticalSectionCell, TxClaim};

// =============================================================================
// UART Ring-Buffer Bridge
// =============================================================================

/// DMA UART bridge over two ring buffers
///
/// Keeps the RX ring's write cursor in step with the DMA write offset and
/// keeps a chain of TX DMA transfers running while the TX ring has data.
///
/// Every method takes `&self`, so one instance can be shared between the
/// application task and the peripheral's interrupt handler. The instance
/// is `Sync` whenever the peripheral is.
///
/// # Example
/// ```ignore
/// static UART_RB: UartRb<'static, MyUartDma> = UartRb::new();
///
/// let rx = RX_STORAGE.take();
/// let tx = TX_STORAGE.take();
/// UART_RB.init(&UART_DMA, rx, tx).unwrap();
/// UART_RB.start().unwrap();
///
/// UART_RB.tx_writer().unwrap().write(b"hello");
///
/// let mut buf = [0u8; 32];
/// let n = UART_RB.rx_reader().unwrap().read(&mut buf);
/// ```
///
/// # Module Organization
///
/// - Lifecycle and accessors (this module)
/// - [`rx`](super::rx): position reconciliation
/// - [`tx`](super::tx): transmit chaining
/// - [`io`](super::io): application-facing buffer views
pub struct UartRb<'a, P: UartDma> {
    /// Receive ring, written by DMA
    pub(super) rx: RingBuffer<'a>,
    /// Transmit ring, drained by DMA
    pub(super) tx: RingBuffer<'a>,
    /// Lifecycle state and bound peripheral
    pub(super) lifecycle: CriticalSectionCell<Lifecycle<'a, P>>,
    /// Last reconciled DMA write offset, in `[0, rx storage len)`
    pub(super) rx_last_pos: AtomicUsize,
    /// Received bytes dropped because the RX ring was full
    pub(super) rx_overruns: AtomicUsize,
    /// Bytes currently owned by the TX DMA
    pub(super) tx_claim: TxClaim,
}

impl<'a, P: UartDma> UartRb<'a, P> {
    /// Create a new bridge
    ///
    /// This is a const function suitable for static initialization.
    /// The bridge is created in the `Uninitialized` state.
    pub const fn new() -> Self {
        Self {
            rx: RingBuffer::new(),
            tx: RingBuffer::new(),
            lifecycle: CriticalSectionCell::new(Lifecycle::new()),
            rx_last_pos: AtomicUsize::new(0),
            rx_overruns: AtomicUsize::new(0),
            tx_claim: TxClaim::new(),
        }
    }

    // =========================================================================
    // State Accessors
    // =========================================================================

    /// Get the current state
    #[inline]
    pub fn state(&self) -> State {
        self.lifecycle.with_ref(|lc| lc.state)
    }

    /// True once `init` has succeeded (and `deinit` has not run since)
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.state().is_initialized()
    }

    /// True between a successful `start` and the next `stop`
    #[inline]
    pub fn is_started(&self) -> bool {
        self.state().is_started()
    }

    /// Length of the RX storage, which is also the DMA reception length
    #[inline]
    pub fn rx_storage_len(&self) -> usize {
        self.rx.storage_len()
    }

    /// Length of the TX storage
    #[inline]
    pub fn tx_storage_len(&self) -> usize {
        self.tx.storage_len()
    }

    /// The bound peripheral, only while started
    pub(super) fn active_peripheral(&self) -> Option<&'a P> {
        self.lifecycle.with_ref(|lc| {
            if lc.state.is_started() {
                lc.peripheral
            } else {
                None
            }
        })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Bind storage and peripheral
    ///
    /// Both rings start empty. After initialization the bridge is in the
    /// `Initialized` state; call [`start`](Self::start) to begin receiving.
    ///
    /// Storage is borrowed for `'a`; after [`deinit`](Self::deinit) a new
    /// `init` must be given storage again.
    ///
    /// # Errors
    /// - `InvalidArgument` - a storage slice is empty
    /// - `InvalidState` - already initialized
    /// - `RingBuffer` - a ring rejected its storage; nothing is bound
    pub fn init(
        &self,
        peripheral: &'a P,
        rx_storage: &'a mut [u8],
        tx_storage: &'a mut [u8],
    ) -> Result<()> {
        if rx_storage.is_empty() || tx_storage.is_empty() {
            return Err(Error::InvalidArgument);
        }

        self.lifecycle.with(|lc| {
            if lc.state != State::Uninitialized {
                return Err(Error::InvalidState);
            }

            // Validate both before binding either
            RingBuffer::check_storage(rx_storage.len())?;
            RingBuffer::check_storage(tx_storage.len())?;

            self.rx.init(rx_storage)?;
            self.tx.init(tx_storage)?;

            self.rx_last_pos.store(0, Ordering::Relaxed);
            self.rx_overruns.store(0, Ordering::Relaxed);

            lc.peripheral = Some(peripheral);
            lc.state = State::Initialized;
            Ok(())
        })?;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "uart-rb initialized: rx {} bytes, tx {} bytes",
            self.rx.storage_len(),
            self.tx.storage_len()
        );

        Ok(())
    }

    /// Empty both rings and release storage and peripheral
    ///
    /// # Errors
    /// - `InvalidState` - not initialized, still started, or an
    ///   [`RxReader`](super::io::RxReader) / [`TxWriter`](super::io::TxWriter)
    ///   is still alive
    pub fn deinit(&self) -> Result<()> {
        self.lifecycle.with(|lc| {
            if lc.state != State::Initialized || lc.reader_live || lc.writer_live {
                return Err(Error::InvalidState);
            }

            self.rx.reset();
            self.tx.reset();
            self.rx.unbind();
            self.tx.unbind();

            lc.peripheral = None;
            lc.state = State::Uninitialized;
            Ok(())
        })?;

        #[cfg(feature = "defmt")]
        defmt::debug!("uart-rb deinitialized");

        Ok(())
    }

    /// Start continuous reception and arm the TX chain
    ///
    /// Requests a circular "receive until idle" transfer over the whole RX
    /// storage. The RX ring is emptied first so its write cursor lines up
    /// with the DMA, which always restarts at offset 0. Bytes already queued
    /// in the TX ring start draining immediately, unless a transfer issued
    /// before the last `stop` is still running; its completion then chains
    /// them.
    ///
    /// # Errors
    /// - `InvalidState` - not initialized, or already started
    /// - `Peripheral` - the receive request was rejected; the state is
    ///   left at `Initialized`
    pub fn start(&self) -> Result<()> {
        let peripheral = self.lifecycle.with(|lc| {
            if lc.state != State::Initialized {
                return Err(Error::InvalidState);
            }
            let peripheral = lc.peripheral.ok_or(Error::InvalidState)?;

            self.rx.reset();
            self.rx_last_pos.store(0, Ordering::Relaxed);

            // Started before the request so the first notification is not lost
            lc.state = State::Started;
            Ok(peripheral)
        })?;

        let rx_ptr = self.rx.storage_ptr();
        let rx_len = self.rx.storage_len();
        if let Err(e) = peripheral.begin_receive_until_idle(rx_ptr, rx_len) {
            self.lifecycle.with(|lc| lc.state = State::Initialized);

            #[cfg(feature = "defmt")]
            defmt::error!("uart-rb start failed: {}", e);

            return Err(e.into());
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("uart-rb started");

        self.attempt_transmit();
        Ok(())
    }

    /// Abort reception and disarm the TX chain
    ///
    /// Bytes the DMA wrote but has not yet reported are discarded. A
    /// transmit already handed to DMA is left to finish; its completion
    /// does not start another chunk.
    ///
    /// # Errors
    /// - `InvalidState` - not started
    pub fn stop(&self) -> Result<()> {
        let peripheral = self.lifecycle.with(|lc| {
            if lc.state != State::Started {
                return Err(Error::InvalidState);
            }
            let peripheral = lc.peripheral.ok_or(Error::InvalidState)?;
            lc.state = State::Initialized;
            Ok(peripheral)
        })?;

        peripheral.abort_receive();

        #[cfg(feature = "defmt")]
        defmt::debug!("uart-rb stopped");

        Ok(())
    }

    // =========================================================================
    // Event Dispatch
    // =========================================================================

    /// Deliver a hardware notification
    ///
    /// Equivalent to calling [`notify_rx_position`](Self::notify_rx_position)
    /// or [`notify_tx_complete`](Self::notify_tx_complete) directly.
    ///
    /// # Errors
    /// - `InvalidArgument` - RX position beyond the RX storage
    pub fn handle_event(&self, event: UartEvent) -> Result<()> {
        match event {
            UartEvent::RxPosition(pos) => self.notify_rx_position(pos),
            UartEvent::TxComplete => self.notify_tx_complete(),
        }
    }
}

impl<P: UartDma> Default for UartRb<'_, P> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
