//! Application-facing views of the two rings.
//!
//! [`RxReader`] drains received bytes; [`TxWriter`] queues bytes for
//! transmission and wakes the TX chain on every non-empty write. At most
//! one of each is alive at a time, so each ring has exactly one consumer
//! (the reader) and one producer (the writer) on the application side.
//! Dropping a view hands it back.
//!
//! With the `embedded-io` feature the views also implement the blocking
//! `embedded_io` traits. Blocking calls busy-wait and fail with
//! `InvalidState` when they could otherwise never return (bridge not
//! started, or not initialized).

use super::uart_rb::UartRb;
use crate::error::{Error, Result};
use crate::hal::UartDma;

impl<'a, P: UartDma> UartRb<'a, P> {
    /// Take the reader over the RX ring
    ///
    /// # Errors
    /// - `InvalidState` - not initialized, or a reader is already alive
    pub fn rx_reader(&self) -> Result<RxReader<'_, 'a, P>> {
        self.lifecycle.with(|lc| {
            if !lc.state.is_initialized() || lc.reader_live {
                return Err(Error::InvalidState);
            }
            lc.reader_live = true;
            Ok(())
        })?;
        Ok(RxReader { uart: self })
    }

    /// Take the writer into the TX ring
    ///
    /// # Errors
    /// - `InvalidState` - not initialized, or a writer is already alive
    pub fn tx_writer(&self) -> Result<TxWriter<'_, 'a, P>> {
        self.lifecycle.with(|lc| {
            if !lc.state.is_initialized() || lc.writer_live {
                return Err(Error::InvalidState);
            }
            lc.writer_live = true;
            Ok(())
        })?;
        Ok(TxWriter { uart: self })
    }
}

// =============================================================================
// RX Reader
// =============================================================================

/// Consumer side of the RX ring, obtained from [`UartRb::rx_reader`]
pub struct RxReader<'r, 'a, P: UartDma> {
    uart: &'r UartRb<'a, P>,
}

impl<P: UartDma> RxReader<'_, '_, P> {
    /// Copy out and consume up to `buf.len()` received bytes
    #[inline]
    pub fn read(&self, buf: &mut [u8]) -> usize {
        self.uart.rx.read(buf)
    }

    /// Copy out received bytes starting `skip` bytes in, without consuming
    #[inline]
    pub fn peek(&self, skip: usize, buf: &mut [u8]) -> usize {
        self.uart.rx.peek(skip, buf)
    }

    /// Discard up to `n` received bytes; returns the number discarded
    #[inline]
    pub fn skip(&self, n: usize) -> usize {
        self.uart.rx.skip(n)
    }

    /// Received bytes waiting to be read
    #[inline]
    pub fn len(&self) -> usize {
        self.uart.rx.len()
    }

    /// True if nothing is waiting
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.uart.rx.is_empty()
    }

    /// Maximum number of received bytes the ring can hold
    #[inline]
    pub fn capacity(&self) -> usize {
        self.uart.rx.capacity()
    }
}

impl<P: UartDma> Drop for RxReader<'_, '_, P> {
    fn drop(&mut self) {
        self.uart.lifecycle.with(|lc| lc.reader_live = false);
    }
}

// =============================================================================
// TX Writer
// =============================================================================

/// Producer side of the TX ring, obtained from [`UartRb::tx_writer`]
pub struct TxWriter<'r, 'a, P: UartDma> {
    uart: &'r UartRb<'a, P>,
}

impl<P: UartDma> TxWriter<'_, '_, P> {
    /// Queue as much of `data` as fits; returns the number of bytes queued
    ///
    /// Starts a transfer right away if the bridge is started and the DMA
    /// is idle.
    pub fn write(&self, data: &[u8]) -> usize {
        let n = self.uart.tx.write(data);
        if n > 0 {
            self.uart.on_buffer_write();
        }
        n
    }

    /// Bytes that can be queued right now
    #[inline]
    pub fn free(&self) -> usize {
        self.uart.tx.free()
    }

    /// Bytes queued but not yet handed to DMA
    #[inline]
    pub fn len(&self) -> usize {
        self.uart.tx.len()
    }

    /// True if nothing is waiting to be handed to DMA
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.uart.tx.is_empty()
    }

    /// Maximum number of bytes the ring can queue
    #[inline]
    pub fn capacity(&self) -> usize {
        self.uart.tx.capacity()
    }
}

impl<P: UartDma> Drop for TxWriter<'_, '_, P> {
    fn drop(&mut self) {
        self.uart.lifecycle.with(|lc| lc.writer_live = false);
    }
}

// =============================================================================
// embedded-io
// =============================================================================

#[cfg(feature = "embedded-io")]
mod embedded_io_impls {
    use super::{RxReader, TxWriter};
    use crate::error::Error;
    use crate::hal::UartDma;

    impl<P: UartDma> embedded_io::ErrorType for RxReader<'_, '_, P> {
        type Error = Error;
    }

    impl<P: UartDma> embedded_io::Read for RxReader<'_, '_, P> {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            if buf.is_empty() {
                return Ok(0);
            }

            loop {
                let n = self.uart.rx.read(buf);
                if n > 0 {
                    return Ok(n);
                }
                if !self.uart.is_started() {
                    return Err(Error::InvalidState);
                }
                core::hint::spin_loop();
            }
        }
    }

    impl<P: UartDma> embedded_io::ReadReady for RxReader<'_, '_, P> {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.uart.rx.is_empty())
        }
    }

    impl<P: UartDma> embedded_io::ErrorType for TxWriter<'_, '_, P> {
        type Error = Error;
    }

    impl<P: UartDma> embedded_io::Write for TxWriter<'_, '_, P> {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            if buf.is_empty() {
                return Ok(0);
            }

            loop {
                let n = TxWriter::write(self, buf);
                if n > 0 {
                    return Ok(n);
                }
                // Full ring only drains while started
                if !self.uart.is_started() {
                    return Err(Error::InvalidState);
                }
                core::hint::spin_loop();
            }
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            loop {
                if self.uart.tx.is_empty() && !self.uart.tx_claim.is_busy() {
                    return Ok(());
                }
                if !self.uart.is_started() {
                    return Err(Error::InvalidState);
                }
                core::hint::spin_loop();
            }
        }
    }

    impl<P: UartDma> embedded_io::WriteReady for TxWriter<'_, '_, P> {
        fn write_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(self.uart.tx.free() > 0)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
