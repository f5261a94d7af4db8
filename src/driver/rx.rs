//! Receive path: DMA write-offset reconciliation.
//!
//! The DMA writes received bytes straight into the RX ring's storage and
//! reports, on half-transfer, transfer-complete and idle-line events, the
//! absolute offset it has reached. Each report is turned into a cursor
//! advance on the RX ring; no bytes are copied.
//!
//! ```text
//!  last = 10, pos = 14            last = 60, pos = 3 (capacity 64)
//!  [....|====|..........]         [===|...........................|====]
//!       ^10  ^14                      ^3                          ^60
//!  delta = 14 - 10 = 4            delta = 64 + 3 - 60 = 7
//! ```

use core::sync::atomic::Ordering;

use super::uart_rb::UartRb;
use crate::error::{Error, Result};
use crate::hal::UartDma;

/// Bytes the DMA wrote going from offset `last` to offset `pos` on
/// circular storage of `capacity` bytes
///
/// Equal offsets mean nothing new; a smaller `pos` means the DMA wrapped
/// past the end of the storage.
#[inline]
pub const fn rx_delta(last: usize, pos: usize, capacity: usize) -> usize {
    if pos >= last {
        pos - last
    } else {
        capacity + pos - last
    }
}

impl<P: UartDma> UartRb<'_, P> {
    /// Reconcile a DMA write-offset report
    ///
    /// `pos` is the absolute offset into the RX storage the DMA has reached.
    /// A report equal to the storage length (transfer-complete of a circular
    /// transfer) is the same as offset 0. Repeating the previous offset is a
    /// no-op, so half-transfer and idle events landing on the same offset
    /// are harmless.
    ///
    /// If the DMA lapped the reader, the oldest unread bytes are dropped
    /// and counted in [`rx_overruns`](Self::rx_overruns); the ring stays in
    /// step with the DMA offset either way.
    ///
    /// Reports arriving while not started are ignored. Must not be called
    /// concurrently with itself.
    ///
    /// # Errors
    /// - `InvalidArgument` - `pos` is beyond the RX storage
    pub fn notify_rx_position(&self, pos: usize) -> Result<()> {
        if !self.is_started() {
            return Ok(());
        }

        let capacity = self.rx.storage_len();
        if pos > capacity {
            return Err(Error::InvalidArgument);
        }
        let pos = if pos == capacity { 0 } else { pos };

        let last = self.rx_last_pos.load(Ordering::Relaxed);
        if pos == last {
            return Ok(());
        }

        let delta = rx_delta(last, pos, capacity);
        let dropped = self.rx.advance(delta);
        if dropped > 0 {
            self.rx_overruns.fetch_add(dropped, Ordering::Relaxed);

            #[cfg(feature = "defmt")]
            defmt::warn!("uart-rb rx overrun: dropped {} oldest bytes", dropped);
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("uart-rb rx {} -> {}: +{}", last, pos, delta);

        self.rx_last_pos.store(pos, Ordering::Relaxed);
        Ok(())
    }

    /// Last reconciled DMA write offset
    #[inline]
    pub fn rx_last_pos(&self) -> usize {
        self.rx_last_pos.load(Ordering::Relaxed)
    }

    /// Received bytes dropped because the RX ring had no room for them
    #[inline]
    pub fn rx_overruns(&self) -> usize {
        self.rx_overruns.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
