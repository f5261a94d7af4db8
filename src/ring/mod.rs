//! Lock-free circular byte buffer over caller-owned storage.
//!
//! [`RingBuffer`] is a single-producer/single-consumer byte ring whose
//! cursors are atomics, so the producer and the consumer may live in
//! different execution contexts (task vs. interrupt) without a lock.
//!
//! Besides the usual copy-in/copy-out operations it exposes the two
//! out-of-band cursor moves a DMA engine needs:
//!
//! - [`RingBuffer::advance`] publishes bytes the hardware already wrote
//!   into the storage (RX), dropping the oldest unread bytes if the
//!   hardware lapped the consumer.
//! - [`RingBuffer::linear_read_block`] + [`RingBuffer::skip`] hand the
//!   longest contiguous readable run to the hardware (TX).
//!
//! ```text
//!  storage: [0 .............................................. len-1]
//!                  ^ r (read cursor)            ^ w (write cursor)
//!                  |<------ readable ---------->|
//! ```
//!
//! One slot is always left empty so that `r == w` unambiguously means
//! "empty"; the usable capacity is therefore `storage.len() - 1`.
//!
//! `w` is only stored by the producer. `r` is moved by the consumer and,
//! on overrun, by [`RingBuffer::advance`]; both sides move it with
//! compare-and-swap so neither can move it backwards.

use core::marker::PhantomData;
use core::ptr;
use core::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use crate::constants::{MIN_STORAGE_LEN, RESERVED_SLOTS};
use crate::error::RingBufferError;

// =============================================================================
// Linear Block
// =============================================================================

/// Contiguous readable run inside a ring's storage.
///
/// The pointer stays valid for as long as the storage borrow held by the
/// ring; the bytes stay meaningful until the producer overwrites them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBlock {
    ptr: *const u8,
    len: usize,
}

impl LinearBlock {
    /// Start address of the run
    #[inline(always)]
    pub const fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    /// Number of bytes in the run
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True if there is nothing to read
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    const fn empty() -> Self {
        Self {
            ptr: ptr::null(),
            len: 0,
        }
    }
}

// =============================================================================
// Ring Buffer
// =============================================================================

/// Circular byte buffer bound to `'a` storage.
///
/// Created unbound with [`RingBuffer::new`] (const, suitable for statics)
/// and bound once with [`RingBuffer::init`].
pub struct RingBuffer<'a> {
    /// Start of the bound storage (null while unbound)
    buf: AtomicPtr<u8>,
    /// Storage length in bytes (0 while unbound)
    size: AtomicUsize,
    /// Read cursor, in `[0, size)`
    r: AtomicUsize,
    /// Write cursor, in `[0, size)`
    w: AtomicUsize,
    _storage: PhantomData<&'a mut [u8]>,
}

impl<'a> RingBuffer<'a> {
    /// Create an unbound ring buffer
    pub const fn new() -> Self {
        Self {
            buf: AtomicPtr::new(ptr::null_mut()),
            size: AtomicUsize::new(0),
            r: AtomicUsize::new(0),
            w: AtomicUsize::new(0),
            _storage: PhantomData,
        }
    }

    /// Check whether storage of `len` bytes can back a ring buffer
    ///
    /// # Errors
    /// - `StorageTooSmall` - fewer than [`MIN_STORAGE_LEN`] bytes
    pub const fn check_storage(len: usize) -> Result<(), RingBufferError> {
        if len < MIN_STORAGE_LEN {
            Err(RingBufferError::StorageTooSmall)
        } else {
            Ok(())
        }
    }

    /// Bind storage and reset both cursors
    ///
    /// # Errors
    /// - `StorageTooSmall` - see [`RingBuffer::check_storage`]
    pub fn init(&self, storage: &'a mut [u8]) -> Result<(), RingBufferError> {
        Self::check_storage(storage.len())?;

        self.r.store(0, Ordering::Relaxed);
        self.w.store(0, Ordering::Relaxed);
        self.size.store(storage.len(), Ordering::Relaxed);
        self.buf.store(storage.as_mut_ptr(), Ordering::Release);
        Ok(())
    }

    /// Drop the storage binding
    pub(crate) fn unbind(&self) {
        self.buf.store(ptr::null_mut(), Ordering::Release);
        self.size.store(0, Ordering::Relaxed);
        self.r.store(0, Ordering::Relaxed);
        self.w.store(0, Ordering::Relaxed);
    }

    /// Empty the buffer
    ///
    /// Not safe against a concurrent producer or consumer; only call while
    /// neither side is active.
    pub fn reset(&self) {
        self.r.store(0, Ordering::Release);
        self.w.store(0, Ordering::Release);
    }

    /// True once storage has been bound
    #[inline]
    pub fn is_bound(&self) -> bool {
        !self.buf.load(Ordering::Acquire).is_null()
    }

    /// Length of the bound storage in bytes
    #[inline]
    pub fn storage_len(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    /// Start of the bound storage, for DMA programming
    #[inline]
    pub fn storage_ptr(&self) -> *mut u8 {
        self.buf.load(Ordering::Acquire)
    }

    /// Maximum number of bytes the ring can hold
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage_len().saturating_sub(RESERVED_SLOTS)
    }

    /// Number of bytes available to read
    pub fn len(&self) -> usize {
        let size = self.storage_len();
        let w = self.w.load(Ordering::Acquire);
        let r = self.r.load(Ordering::Acquire);
        Self::distance(r, w, size)
    }

    /// True if there is nothing to read
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of bytes that can be written
    pub fn free(&self) -> usize {
        self.capacity().saturating_sub(self.len())
    }

    /// Bytes from `r` forward to `w` on a ring of `size`
    #[inline(always)]
    fn distance(r: usize, w: usize, size: usize) -> usize {
        if w >= r { w - r } else { size - r + w }
    }

    // =========================================================================
    // Producer side
    // =========================================================================

    /// Copy as much of `data` as fits; returns the number of bytes written
    pub fn write(&self, data: &[u8]) -> usize {
        let n = data.len().min(self.free());
        if n == 0 {
            return 0;
        }

        let size = self.storage_len();
        let base = self.storage_ptr();
        let w = self.w.load(Ordering::Relaxed);
        let first = n.min(size - w);

        // SAFETY: `base` points to `size` bytes borrowed for 'a. The first
        // copy ends at or before `size`, the second starts at 0 and is at most
        // `n - first` bytes, and both lie in the free region the consumer
        // does not touch.
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), base.add(w), first);
            ptr::copy_nonoverlapping(data.as_ptr().add(first), base, n - first);
        }

        self.w.store((w + n) % size, Ordering::Release);
        n
    }

    /// Publish `n` bytes already written into the storage out-of-band
    ///
    /// The write cursor always moves by `n`, so it keeps tracking the
    /// hardware that wrote the bytes. If the ring has no room for all of
    /// them, the oldest unread bytes have been overwritten and are dropped
    /// by moving the read cursor past them. Returns the number dropped.
    ///
    /// `n` must not exceed [`capacity`](Self::capacity).
    pub fn advance(&self, n: usize) -> usize {
        let size = self.storage_len();
        if n == 0 || size == 0 {
            return 0;
        }

        let cap = self.capacity();
        let n = n.min(cap);
        let w = self.w.load(Ordering::Relaxed);
        let mut dropped = 0;

        // The consumer may move `r` concurrently; only push it forward from
        // the value the room was computed against.
        let mut r = self.r.load(Ordering::Acquire);
        loop {
            let free = cap - Self::distance(r, w, size);
            if n <= free {
                break;
            }
            let overrun = n - free;
            match self.r.compare_exchange_weak(
                r,
                (r + overrun) % size,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    dropped = overrun;
                    break;
                }
                Err(current) => r = current,
            }
        }

        self.w.store((w + n) % size, Ordering::Release);
        dropped
    }

    // =========================================================================
    // Consumer side
    // =========================================================================

    /// Copy up to `buf.len()` bytes out and consume them
    ///
    /// If an overrun moves the read cursor during the copy, the copy is
    /// repeated from the new position.
    pub fn read(&self, buf: &mut [u8]) -> usize {
        loop {
            let r = self.r.load(Ordering::Acquire);
            let n = self.copy_out(r, 0, buf);
            if n == 0 {
                return 0;
            }
            if self.try_consume(r, n) {
                return n;
            }
        }
    }

    /// Copy up to `buf.len()` bytes starting `skip` bytes past the read cursor
    /// without consuming anything
    pub fn peek(&self, skip: usize, buf: &mut [u8]) -> usize {
        self.copy_out(self.r.load(Ordering::Acquire), skip, buf)
    }

    /// Consume up to `n` bytes without copying; returns the number consumed
    pub fn skip(&self, n: usize) -> usize {
        loop {
            let r = self.r.load(Ordering::Acquire);
            let w = self.w.load(Ordering::Acquire);
            let n = n.min(Self::distance(r, w, self.storage_len()));
            if n == 0 {
                return 0;
            }
            if self.try_consume(r, n) {
                return n;
            }
        }
    }

    /// Copy readable bytes from `r + skip` into `buf`
    fn copy_out(&self, r: usize, skip: usize, buf: &mut [u8]) -> usize {
        let size = self.storage_len();
        let w = self.w.load(Ordering::Acquire);
        let full = Self::distance(r, w, size);
        if skip >= full {
            return 0;
        }

        let n = buf.len().min(full - skip);
        if n == 0 {
            return 0;
        }

        let base = self.storage_ptr();
        let r = (r + skip) % size;
        let first = n.min(size - r);

        // SAFETY: the `n` bytes starting at `r` (wrapping once at `size`) are
        // readable and the producer does not write them until they are
        // consumed or dropped by an overrun.
        unsafe {
            ptr::copy_nonoverlapping(base.add(r), buf.as_mut_ptr(), first);
            ptr::copy_nonoverlapping(base, buf.as_mut_ptr().add(first), n - first);
        }
        n
    }

    /// Move the read cursor from `r` by `n`, unless an overrun moved it first
    fn try_consume(&self, r: usize, n: usize) -> bool {
        let size = self.storage_len();
        self.r
            .compare_exchange(r, (r + n) % size, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Longest readable run starting at the read cursor that does not cross
    /// the physical end of the storage
    pub fn linear_read_block(&self) -> LinearBlock {
        let size = self.storage_len();
        if size == 0 {
            return LinearBlock::empty();
        }

        let w = self.w.load(Ordering::Acquire);
        let r = self.r.load(Ordering::Relaxed);
        let len = if w >= r { w - r } else { size - r };
        if len == 0 {
            return LinearBlock::empty();
        }

        LinearBlock {
            // SAFETY: r < size, so the offset stays inside the storage.
            ptr: unsafe { self.storage_ptr().add(r) },
            len,
        }
    }
}

impl Default for RingBuffer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
