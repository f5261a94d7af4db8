//! Transmit path: self-sustaining DMA chain.
//!
//! Two triggers try to start the next transfer:
//!
//! - a write into the TX ring ([`UartRb::on_buffer_write`])
//! - completion of the previous transfer ([`UartRb::notify_tx_complete`])
//!
//! At most one transfer is ever in flight. Each attempt claims the
//! longest contiguous readable run of the TX ring; a run that wraps the
//! end of the storage is therefore sent as two chunks, the second one on
//! the next trigger.
//!
//! Bytes are consumed from the ring as soon as they are handed to DMA, so
//! the producer sees their space as free while the transfer is still
//! running. The TX storage must be larger than any chunk the producer could
//! otherwise overwrite before the DMA has read it.

use super::uart_rb::UartRb;
use crate::error::Result;
use crate::hal::UartDma;

impl<P: UartDma> UartRb<'_, P> {
    /// Write-event hook of the TX ring
    ///
    /// Called by [`TxWriter::write`](super::io::TxWriter::write) after
    /// every non-empty write. Starts a transfer if the DMA is idle.
    pub fn on_buffer_write(&self) {
        self.attempt_transmit();
    }

    /// Transmit completion from the peripheral
    ///
    /// Releases the channel and immediately chains the next chunk, if any.
    /// Completions arriving after `stop` only release the channel.
    pub fn notify_tx_complete(&self) -> Result<()> {
        let _done = self.tx_claim.release();

        #[cfg(feature = "defmt")]
        defmt::trace!("uart-rb tx complete: {} bytes", _done);

        self.attempt_transmit();
        Ok(())
    }

    /// Bytes currently owned by the TX DMA (0 when idle)
    #[inline]
    pub fn tx_in_flight(&self) -> usize {
        self.tx_claim.in_flight()
    }

    /// Start the next transfer if started, idle and the ring has data
    ///
    /// The started check, the idle check, the claim and the read-cursor
    /// advance run inside one critical section; the DMA request itself runs
    /// after it.
    pub(super) fn attempt_transmit(&self) {
        let claimed = self.tx_claim.try_claim(|| {
            let peripheral = self.active_peripheral()?;
            let block = self.tx.linear_read_block();
            if block.is_empty() {
                return None;
            }
            self.tx.skip(block.len());
            Some((block.len(), (peripheral, block)))
        });
        let Some((peripheral, block)) = claimed else {
            return;
        };

        #[cfg(feature = "defmt")]
        defmt::trace!("uart-rb tx chunk: {} bytes", block.len());

        if let Err(_e) = peripheral.begin_transmit(block.as_ptr(), block.len()) {
            // No completion will come; free the channel so the chain can resume
            self.tx_claim.release();

            #[cfg(feature = "defmt")]
            defmt::error!(
                "uart-rb tx request failed, {} bytes dropped: {}",
                block.len(),
                _e
            );
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;
    use crate::testing::MockUartDma;

    /// Deliver one completion the way the interrupt handler would
    fn complete(mock: &MockUartDma, uart: &UartRb<'_, MockUartDma>) {
        assert!(mock.finish_transmit(), "no transmit outstanding");
        uart.notify_tx_complete().unwrap();
    }

    // =========================================================================
    // Single Flight
    // =========================================================================

    #[test]
    fn write_while_idle_sends_one_chunk() {
        let mock = MockUartDma::new();
        let (mut rx, mut tx) = ([0u8; 8], [0u8; 32]);
        let uart = UartRb::new();
        uart.init(&mock, &mut rx, &mut tx).unwrap();
        uart.start().unwrap();

        uart.tx_writer().unwrap().write(b"hello world");

        assert_eq!(mock.transmits(), [b"hello world".to_vec()]);
        assert_eq!(uart.tx_in_flight(), 11);
    }

    #[test]
    fn write_while_busy_waits_for_completion() {
        let mock = MockUartDma::new();
        let (mut rx, mut tx) = ([0u8; 8], [0u8; 32]);
        let uart = UartRb::new();
        uart.init(&mock, &mut rx, &mut tx).unwrap();
        uart.start().unwrap();
        let writer = uart.tx_writer().unwrap();

        writer.write(b"first");
        writer.write(b"second");
        writer.write(b"third");
        assert_eq!(mock.transmit_count(), 1);
        assert_eq!(uart.tx_in_flight(), 5);

        complete(&mock, &uart);
        assert_eq!(mock.transmits(), [b"first".to_vec(), b"secondthird".to_vec()]);
        assert_eq!(uart.tx_in_flight(), 11);

        complete(&mock, &uart);
        assert_eq!(mock.transmit_count(), 2);
        assert_eq!(uart.tx_in_flight(), 0);
        assert_eq!(mock.max_outstanding(), 1);
    }

    #[test]
    fn duplicate_trigger_is_noop() {
        let mock = MockUartDma::new();
        let (mut rx, mut tx) = ([0u8; 8], [0u8; 16]);
        let uart = UartRb::new();
        uart.init(&mock, &mut rx, &mut tx).unwrap();
        uart.start().unwrap();

        uart.tx_writer().unwrap().write(b"abc");
        uart.on_buffer_write();
        uart.on_buffer_write();

        assert_eq!(mock.transmit_count(), 1);
    }

    #[test]
    fn completion_with_empty_ring_goes_idle() {
        let mock = MockUartDma::new();
        let (mut rx, mut tx) = ([0u8; 8], [0u8; 16]);
        let uart = UartRb::new();
        uart.init(&mock, &mut rx, &mut tx).unwrap();
        uart.start().unwrap();

        uart.tx_writer().unwrap().write(b"x");
        complete(&mock, &uart);

        assert_eq!(mock.transmit_count(), 1);
        assert_eq!(uart.tx_in_flight(), 0);

        // Next write restarts the chain
        uart.tx_writer().unwrap().write(b"y");
        assert_eq!(mock.transmits(), [b"x".to_vec(), b"y".to_vec()]);
    }

    // =========================================================================
    // Wrap Split
    // =========================================================================

    #[test]
    fn wrapped_run_is_sent_as_two_chunks() {
        let mock = MockUartDma::new();
        let (mut rx, mut tx) = ([0u8; 8], [0u8; 16]);
        let uart = UartRb::new();
        uart.init(&mock, &mut rx, &mut tx).unwrap();
        uart.start().unwrap();
        let writer = uart.tx_writer().unwrap();

        // Move both cursors to offset 12
        writer.write(&[0u8; 12]);
        complete(&mock, &uart);
        mock.clear_calls();

        // 10 bytes from offset 12: 4 before the end, 6 after
        writer.write(b"0123456789");
        assert_eq!(mock.transmits(), [b"0123".to_vec()]);
        assert_eq!(uart.tx_in_flight(), 4);

        complete(&mock, &uart);
        assert_eq!(mock.transmits(), [b"0123".to_vec(), b"456789".to_vec()]);
        assert_eq!(uart.tx_in_flight(), 6);

        complete(&mock, &uart);
        assert_eq!(mock.transmit_count(), 2);
        assert_eq!(uart.tx_in_flight(), 0);
    }

    // =========================================================================
    // Lifecycle Gating
    // =========================================================================

    #[test]
    fn writes_before_start_are_sent_on_start() {
        let mock = MockUartDma::new();
        let (mut rx, mut tx) = ([0u8; 8], [0u8; 16]);
        let uart = UartRb::new();
        uart.init(&mock, &mut rx, &mut tx).unwrap();

        uart.tx_writer().unwrap().write(b"early");
        assert_eq!(mock.transmit_count(), 0);

        uart.start().unwrap();
        assert_eq!(mock.transmits(), [b"early".to_vec()]);
    }

    #[test]
    fn completion_after_stop_does_not_chain() {
        let mock = MockUartDma::new();
        let (mut rx, mut tx) = ([0u8; 8], [0u8; 16]);
        let uart = UartRb::new();
        uart.init(&mock, &mut rx, &mut tx).unwrap();
        uart.start().unwrap();
        let writer = uart.tx_writer().unwrap();

        writer.write(b"one");
        writer.write(b"two");
        uart.stop().unwrap();

        complete(&mock, &uart);
        assert_eq!(mock.transmit_count(), 1);
        assert_eq!(uart.tx_in_flight(), 0);
        assert_eq!(writer.len(), 3);
    }

    #[test]
    fn attempt_after_stop_claims_nothing() {
        let mock = MockUartDma::new();
        let (mut rx, mut tx) = ([0u8; 8], [0u8; 16]);
        let uart = UartRb::new();
        uart.init(&mock, &mut rx, &mut tx).unwrap();
        uart.start().unwrap();
        uart.stop().unwrap();

        uart.tx_writer().unwrap().write(b"held");
        uart.attempt_transmit();

        assert_eq!(uart.tx_in_flight(), 0);
        assert_eq!(mock.transmit_count(), 0);
        assert_eq!(uart.tx_writer().unwrap().len(), 4);
    }

    #[test]
    fn rejected_transmit_releases_channel() {
        let mock = MockUartDma::new();
        let (mut rx, mut tx) = ([0u8; 8], [0u8; 16]);
        let uart = UartRb::new();
        uart.init(&mock, &mut rx, &mut tx).unwrap();
        uart.start().unwrap();

        mock.set_fail_transmit(true);
        uart.tx_writer().unwrap().write(b"lost");
        assert_eq!(uart.tx_in_flight(), 0);
        assert_eq!(mock.transmit_count(), 0);

        mock.set_fail_transmit(false);
        uart.tx_writer().unwrap().write(b"kept");
        assert_eq!(mock.transmits(), [b"kept".to_vec()]);
    }

    // =========================================================================
    // Race Safety
    // =========================================================================

    #[test]
    fn writer_and_completion_contexts_never_double_claim() {
        const TOTAL: usize = 4096;

        let mock = MockUartDma::new();
        let (mut rx, mut tx) = ([0u8; 8], [0u8; 64]);
        let uart = UartRb::new();
        uart.init(&mock, &mut rx, &mut tx).unwrap();
        uart.start().unwrap();

        std::thread::scope(|s| {
            // Task context: produce bytes as space allows
            s.spawn(|| {
                let writer = uart.tx_writer().unwrap();
                let chunk: Vec<u8> = (0..7u8).collect();
                let mut sent = 0;
                while sent < TOTAL {
                    let n = (TOTAL - sent).min(chunk.len());
                    sent += writer.write(&chunk[..n]);
                    std::thread::yield_now();
                }
            });

            // Interrupt context: complete whatever is outstanding
            s.spawn(|| {
                let mut delivered = 0;
                while delivered < TOTAL {
                    if mock.finish_transmit() {
                        uart.notify_tx_complete().unwrap();
                        delivered = mock.transmits().iter().map(Vec::len).sum();
                    }
                    std::thread::yield_now();
                }
            });
        });

        // Drain whatever the last completion chained
        while mock.finish_transmit() {
            uart.notify_tx_complete().unwrap();
        }

        let total: usize = mock.transmits().iter().map(Vec::len).sum();
        assert_eq!(total, TOTAL);
        assert_eq!(mock.max_outstanding(), 1);
        assert_eq!(uart.tx_in_flight(), 0);
    }

    #[test]
    fn stop_start_cycles_never_double_claim() {
        use std::sync::atomic::{AtomicBool, Ordering};

        const TOTAL: usize = 2048;

        let mock = MockUartDma::new();
        let (mut rx, mut tx) = ([0u8; 8], [0u8; 32]);
        let uart = UartRb::new();
        uart.init(&mock, &mut rx, &mut tx).unwrap();
        uart.start().unwrap();
        let done = AtomicBool::new(false);

        std::thread::scope(|s| {
            let writer = s.spawn(|| {
                let writer = uart.tx_writer().unwrap();
                let mut sent = 0;
                while sent < TOTAL {
                    sent += writer.write(&[0x55; 5][..(TOTAL - sent).min(5)]);
                    std::thread::yield_now();
                }
            });

            let toggler = s.spawn(|| {
                for _ in 0..200 {
                    uart.stop().unwrap();
                    std::thread::yield_now();
                    uart.start().unwrap();
                    std::thread::yield_now();
                }
            });

            s.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    if mock.finish_transmit() {
                        uart.notify_tx_complete().unwrap();
                    }
                    std::thread::yield_now();
                }
            });

            writer.join().unwrap();
            toggler.join().unwrap();
            done.store(true, Ordering::SeqCst);
        });

        while mock.finish_transmit() {
            uart.notify_tx_complete().unwrap();
        }

        let total: usize = mock.transmits().iter().map(Vec::len).sum();
        assert_eq!(total, TOTAL);
        assert_eq!(mock.max_outstanding(), 1);
        assert_eq!(mock.outstanding(), 0);
        assert_eq!(uart.tx_in_flight(), 0);
    }
}
