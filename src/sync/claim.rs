//! Single-flight claim on a DMA channel.
//!
//! [`TxClaim`] records how many bytes the transmit DMA currently owns.
//! Zero means the channel is idle. The check for idleness and the
//! recording of a new chunk happen inside one critical section, so two
//! contexts racing to start a transfer can never both win.

use super::primitives::CriticalSectionCell;

/// In-flight transfer size guarded by a critical section
pub struct TxClaim {
    in_flight: CriticalSectionCell<usize>,
}

impl TxClaim {
    /// Create an idle claim (const, suitable for static initialization)
    pub const fn new() -> Self {
        Self {
            in_flight: CriticalSectionCell::new(0),
        }
    }

    /// Try to take the channel
    ///
    /// If the channel is idle, `select` runs inside the critical section and
    /// returns the chunk to hand over together with its size. A non-zero
    /// size is recorded as in flight and the chunk is returned to the
    /// caller, who issues the transfer after the critical section ends.
    ///
    /// Returns `None` without calling `select` if a chunk is already in
    /// flight, or if `select` finds nothing to send.
    pub fn try_claim<T, F>(&self, select: F) -> Option<T>
    where
        F: FnOnce() -> Option<(usize, T)>,
    {
        self.in_flight.with(|in_flight| {
            if *in_flight != 0 {
                return None;
            }

            let (size, chunk) = select()?;
            if size == 0 {
                return None;
            }

            *in_flight = size;
            Some(chunk)
        })
    }

    /// Mark the channel idle, returning the size that was in flight
    pub fn release(&self) -> usize {
        self.in_flight.with(|in_flight| core::mem::take(in_flight))
    }

    /// Bytes currently owned by DMA (0 when idle)
    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    /// True while a chunk is owned by DMA
    pub fn is_busy(&self) -> bool {
        self.in_flight() != 0
    }
}

impl Default for TxClaim {
    fn default() -> Self {
        Self::new()
    }
}
