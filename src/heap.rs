//! The heap-extension primitive, and the bootstrap/extend operations that sit on top of it.
//!
//! The allocator core never calls `sbrk` directly; it talks to a [`HeapPrimitive`],
//! so the whole block allocator can be exercised in tests against a fake,
//! bounds-tracking heap instead of the real process break.

use libc::{c_void, intptr_t, sbrk};

use crate::block;
use crate::tag::Tag;

/// The one way the core allocator can fail: the underlying primitive refused to grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// The brk-like primitive reported it cannot extend the region any further.
    OutOfMemory,
}

/// The narrow interface the block allocator consumes from its backing store.
///
/// An implementation owns a single, grow-only, contiguous byte region and reports
/// its current bounds. It never shrinks: the allocator never asks it to.
pub trait HeapPrimitive {
    /// Advances the break by `n` bytes and returns the address of the first new byte.
    ///
    /// # Safety
    /// Implementations typically wrap a raw syscall; `n` must be a size previously
    /// agreed with the caller (the allocator always passes an already-aligned size).
    unsafe fn extend(&mut self, n: usize) -> Result<*mut u8, HeapError>;

    /// Inclusive lower bound of the region granted so far.
    fn low(&self) -> *mut u8;

    /// Inclusive upper bound of the region granted so far.
    fn high(&self) -> *mut u8;
}

/// A [`HeapPrimitive`] backed by the process's real data-segment break, via `sbrk(2)`.
///
/// # Thread Safety
///
/// Not thread-safe: `sbrk` manipulates process-wide state and this struct tracks
/// the bounds of what it has seen locally. Concurrent use from more than one
/// `Allocator` (or more than one thread) is undefined, matching the allocator's
/// own single-flow-of-control assumption.
pub struct SbrkHeap {
    low: *mut u8,
    high: *mut u8,
}

impl SbrkHeap {
    pub fn new() -> Self {
        Self { low: core::ptr::null_mut(), high: core::ptr::null_mut() }
    }
}

impl Default for SbrkHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapPrimitive for SbrkHeap {
    unsafe fn extend(&mut self, n: usize) -> Result<*mut u8, HeapError> {
        unsafe {
            let raw = sbrk(n as intptr_t);
            if raw == usize::MAX as *mut c_void {
                return Err(HeapError::OutOfMemory);
            }
            let base = raw as *mut u8;
            if self.low.is_null() {
                self.low = base;
            }
            self.high = base.add(n);
            Ok(base)
        }
    }

    fn low(&self) -> *mut u8 {
        self.low
    }

    fn high(&self) -> *mut u8 {
        self.high
    }
}

/// Installs the prologue and epilogue sentinels on a fresh heap.
///
/// Returns the address of the prologue tag, which doubles as the heap base for
/// invariant-checking walks.
///
/// # Safety
/// Must be called at most once per `HeapPrimitive` instance, before any other
/// operation touches it.
pub(crate) unsafe fn bootstrap<H: HeapPrimitive>(heap: &mut H) -> Result<*mut u8, HeapError> {
    unsafe {
        let base = heap.extend(2 * crate::tag::TAG_SIZE as usize)?;
        Tag::new(crate::tag::TAG_SIZE, true, true, true, false).write(base);
        let epilogue = base.add(crate::tag::TAG_SIZE as usize);
        Tag::new(0, true, true, true, true).write(epilogue);
        Ok(base)
    }
}

/// Grows the heap by `size` bytes (already rounded and at least the minimum block
/// size) and installs a fresh, already-reserved block header where the old
/// epilogue used to be, followed by a new epilogue.
///
/// The returned block is reserved; it is never inserted into the free index.
///
/// # Safety
/// `size` must be the exact byte count to request from `heap`; the bytes it
/// returns must not overlap any block already known to the allocator.
pub(crate) unsafe fn extend_heap<H: HeapPrimitive>(heap: &mut H, size: u64) -> Result<*mut u8, HeapError> {
    unsafe {
        let header = heap.extend(size as usize)?;
        Tag::new(size, true, true, true, false).write(header);
        let epilogue = header.add(size as usize);
        Tag::new(0, true, true, true, true).write(epilogue);
        block::refresh_neighbors(header);
        Ok(header)
    }
}
