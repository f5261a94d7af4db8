//! Testing utilities and mock implementations
//!
//! This module provides a mock UART/DMA peripheral for testing the bridge
//! on the host without hardware access.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::sync::atomic::{AtomicBool, AtomicPtr, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::vec::Vec;

use crate::error::{PeripheralError, PeripheralResult};
use crate::hal::UartDma;

// =============================================================================
// Mock UART DMA
// =============================================================================

/// A peripheral call recorded by [`MockUartDma`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `begin_receive_until_idle` with the requested length
    BeginReceive { len: usize },
    /// `begin_transmit` with a copy of the bytes handed to DMA
    BeginTransmit { data: Vec<u8> },
    /// `abort_receive`
    AbortReceive,
}

/// Mock UART/DMA peripheral
///
/// Records every call, copies transmit chunks at the moment they are
/// handed over, and tracks how many transmits are outstanding so tests can
/// detect a second transfer being started before the first completed.
///
/// # Example
///
/// ```ignore
/// let mock = MockUartDma::new();
/// uart.init(&mock, &mut rx, &mut tx).unwrap();
/// uart.start().unwrap();
///
/// mock.inject_rx(0, b"hi");
/// uart.notify_rx_position(2).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockUartDma {
    /// Every call in order
    calls: Mutex<Vec<Call>>,
    /// RX storage handed over by the last receive request
    rx_buffer: AtomicPtr<u8>,
    rx_len: AtomicUsize,
    /// Transmits started but not yet finished
    outstanding: AtomicUsize,
    /// Highest value `outstanding` ever reached
    max_outstanding: AtomicUsize,
    fail_receive: AtomicBool,
    fail_transmit: AtomicBool,
}

impl MockUartDma {
    /// Create a new mock peripheral
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls made so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Clear the call log
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Transmit chunks in the order they were handed to DMA
    pub fn transmits(&self) -> Vec<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                Call::BeginTransmit { data } => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of transmit requests
    pub fn transmit_count(&self) -> usize {
        self.transmits().len()
    }

    /// Number of receive requests
    pub fn receive_count(&self) -> usize {
        self.count(|call| matches!(call, Call::BeginReceive { .. }))
    }

    /// Number of receive aborts
    pub fn abort_count(&self) -> usize {
        self.count(|call| matches!(call, Call::AbortReceive))
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    /// Make subsequent receive requests fail
    pub fn set_fail_receive(&self, fail: bool) {
        self.fail_receive.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent transmit requests fail
    pub fn set_fail_transmit(&self, fail: bool) {
        self.fail_transmit.store(fail, Ordering::SeqCst);
    }

    /// Transmits started but not yet finished
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously outstanding transmits observed
    pub fn max_outstanding(&self) -> usize {
        self.max_outstanding.load(Ordering::SeqCst)
    }

    /// Mark the oldest outstanding transmit as done
    ///
    /// Returns false if nothing was outstanding. The caller then delivers
    /// the completion with `notify_tx_complete`.
    pub fn finish_transmit(&self) -> bool {
        self.outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Simulate the DMA writing `bytes` into the RX storage at `offset`,
    /// wrapping at the end of the storage
    pub fn inject_rx(&self, offset: usize, bytes: &[u8]) {
        let base = self.rx_buffer.load(Ordering::SeqCst);
        let len = self.rx_len.load(Ordering::SeqCst);
        assert!(!base.is_null(), "reception not started");

        for (i, byte) in bytes.iter().enumerate() {
            // SAFETY: `base` is the RX storage handed over by the bridge,
            // valid for `len` bytes while reception runs.
            unsafe { base.add((offset + i) % len).write(*byte) };
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl UartDma for MockUartDma {
    fn begin_receive_until_idle(&self, buffer: *mut u8, len: usize) -> PeripheralResult<()> {
        if self.fail_receive.load(Ordering::SeqCst) {
            return Err(PeripheralError::Hardware);
        }

        self.rx_buffer.store(buffer, Ordering::SeqCst);
        self.rx_len.store(len, Ordering::SeqCst);
        self.record(Call::BeginReceive { len });
        Ok(())
    }

    fn begin_transmit(&self, data: *const u8, len: usize) -> PeripheralResult<()> {
        if self.fail_transmit.load(Ordering::SeqCst) {
            return Err(PeripheralError::Busy);
        }

        // SAFETY: the bridge hands over a run inside its TX storage that
        // stays valid until completion.
        let data = unsafe { core::slice::from_raw_parts(data, len) }.to_vec();

        let now = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_outstanding.fetch_max(now, Ordering::SeqCst);
        self.record(Call::BeginTransmit { data });
        Ok(())
    }

    fn abort_receive(&self) {
        self.rx_buffer.store(core::ptr::null_mut(), Ordering::SeqCst);
        self.record(Call::AbortReceive);
    }
}
