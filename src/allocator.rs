//! The top-level operations — reserve, release, resize, zero-allocate — composed
//! from the placer, splitter, and coalescer.
//!
//! # Thread Safety
//!
//! `Allocator` is not thread-safe: it owns its backing [`HeapPrimitive`] and its
//! free-list heads directly, with no internal locking. For multi-threaded use,
//! wrap it behind external synchronization.

use core::ptr;

use crate::align16;
use crate::block;
use crate::checker;
use crate::freelist::FreeIndex;
use crate::heap::{self, HeapError, HeapPrimitive, SbrkHeap};
use crate::placer;
use crate::tag::{self, Tag, MIN_BLOCK_SIZE, TAG_SIZE};

/// A segregated-free-list allocator over a single, grow-only heap region.
///
/// ```text
///   Allocator
///   ┌───────────────────────────────────────────────────────┐
///   │ heap: H            (the grow-only backing store)      │
///   │ base: *mut u8       -> prologue tag                    │
///   │ free_index: FreeIndex  (six bucket heads)              │
///   └───────────────────────────────────────────────────────┘
/// ```
///
/// Encapsulating the heap base and bucket heads in one value (rather than a
/// process-wide singleton) makes the allocator reentrant per instance: tests
/// build one `Allocator` per case, each over its own heap.
pub struct Allocator<H: HeapPrimitive = SbrkHeap> {
    pub(crate) heap: H,
    pub(crate) base: *mut u8,
    pub(crate) free_index: FreeIndex,
}

impl Allocator<SbrkHeap> {
    /// Initializes an allocator backed by the process's real `sbrk`-managed heap.
    ///
    /// # Safety
    /// Must be called at most once per process; the allocator assumes it has
    /// sole ownership of the data-segment break.
    pub unsafe fn init_sbrk() -> Result<Self, HeapError> {
        unsafe { Self::init(SbrkHeap::new()) }
    }
}

impl<H: HeapPrimitive> Allocator<H> {
    /// Bootstraps a fresh allocator over `heap`: installs the prologue and
    /// epilogue sentinels and clears the free index.
    ///
    /// # Safety
    /// `heap` must not have been extended before this call.
    pub unsafe fn init(mut heap: H) -> Result<Self, HeapError> {
        unsafe {
            let base = heap::bootstrap(&mut heap)?;
            Ok(Self { heap, base, free_index: FreeIndex::new() })
        }
    }

    /// Reserves a block of at least `requested` bytes, returning a 16-byte
    /// aligned pointer to its data region, or null on misuse or out-of-memory.
    ///
    /// `requested = 0` is a documented no-op that returns null, matching
    /// `malloc(0)`'s permitted behavior.
    ///
    /// # Safety
    /// Must not be called concurrently with any other operation on `self`.
    pub unsafe fn reserve(&mut self, requested: usize) -> *mut u8 {
        if requested == 0 {
            return ptr::null_mut();
        }

        unsafe {
            let size = round_request(requested);

            if let Some(found) = placer::find_fit(&self.free_index, size) {
                self.free_index.unlink(found);
                let found_tag = Tag::read(found);
                if found_tag.size > size + MIN_BLOCK_SIZE {
                    let tail = block::split(found, size);
                    let tail_tag = Tag::read(tail);
                    self.free_index.insert(tail, tail_tag.size);
                } else {
                    block::reserve_whole(found);
                }
                tag::data_ptr(found)
            } else {
                match heap::extend_heap(&mut self.heap, size) {
                    Ok(header) => tag::data_ptr(header),
                    Err(HeapError::OutOfMemory) => ptr::null_mut(),
                }
            }
        }
    }

    /// Releases a block previously returned by [`Self::reserve`], [`Self::resize`],
    /// or [`Self::zalloc`]. `ptr = null` is a documented no-op.
    ///
    /// Marks the block free, coalesces it with any free neighbor(s) using their
    /// `P`/`N` bits, and reinserts the (possibly merged) result into the free
    /// index.
    ///
    /// # Safety
    /// `ptr` must either be null or a pointer this allocator returned exactly
    /// once and that has not already been released (double-free is undefined
    /// behavior, as is releasing a foreign pointer).
    pub unsafe fn release(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }

        unsafe {
            let header = tag::header_of_data(ptr);
            let mut current = Tag::read(header);
            let next = tag::next_header(header, current.size);
            let next_tag = Tag::read(next);

            current.alloc = false;
            current.next_alloc = next_tag.alloc;
            current.write(header);
            current.write(tag::footer_of(header, current.size));
            block::refresh_neighbors(header);

            let prev_free = !current.prev_alloc;
            let next_free = !next_tag.alloc && !next_tag.epilogue;

            let merged = if prev_free && next_free {
                let prev_header = tag::prev_free_header(header);
                let next_next = tag::next_header(next, next_tag.size);
                self.free_index.unlink(prev_header);
                self.free_index.unlink(next);
                block::merge(prev_header, next_next)
            } else if prev_free {
                let prev_header = tag::prev_free_header(header);
                self.free_index.unlink(prev_header);
                block::merge(prev_header, next)
            } else if next_free {
                let next_next = tag::next_header(next, next_tag.size);
                self.free_index.unlink(next);
                block::merge(header, next_next)
            } else {
                header
            };

            let merged_tag = Tag::read(merged);
            self.free_index.insert(merged, merged_tag.size);
        }
    }

    /// Resizes the block at `ptr` to hold at least `requested` bytes.
    ///
    /// - `ptr = null` behaves as [`Self::reserve`].
    /// - `requested = 0` behaves as [`Self::release`] and returns null.
    /// - If the existing block is already large enough, `ptr` is returned
    ///   unchanged.
    /// - Otherwise a new block is reserved, the overlap between the old and
    ///   new usable regions is copied, the old block is released, and the new
    ///   data pointer is returned.
    ///
    /// # Safety
    /// Same requirements as [`Self::reserve`] and [`Self::release`]; `ptr` must
    /// be null or a live pointer returned by this allocator.
    pub unsafe fn resize(&mut self, ptr: *mut u8, requested: usize) -> *mut u8 {
        unsafe {
            if ptr.is_null() {
                return self.reserve(requested);
            }
            if requested == 0 {
                self.release(ptr);
                return ptr::null_mut();
            }

            let header = tag::header_of_data(ptr);
            let old_tag = Tag::read(header);
            let old_usable = old_tag.size - TAG_SIZE;
            if old_usable >= requested as u64 {
                return ptr;
            }

            let new_ptr = self.reserve(requested);
            if new_ptr.is_null() {
                return ptr::null_mut();
            }

            let new_header = tag::header_of_data(new_ptr);
            let new_usable = Tag::read(new_header).size - TAG_SIZE;
            let copy_len = old_usable.min(new_usable) as usize;
            ptr::copy_nonoverlapping(ptr, new_ptr, copy_len);

            self.release(ptr);
            new_ptr
        }
    }

    /// Reserves space for `count` elements of `size` bytes each and zeroes it.
    ///
    /// # Safety
    /// Same requirements as [`Self::reserve`].
    pub unsafe fn zalloc(&mut self, count: usize, size: usize) -> *mut u8 {
        unsafe {
            let total = count * size;
            let ptr = self.reserve(total);
            if !ptr.is_null() {
                ptr::write_bytes(ptr, 0, total);
            }
            ptr
        }
    }

    /// Walks the heap and the free index, validating every invariant in §3.5 of
    /// the design: containment, footer fidelity, bucket membership, and link
    /// symmetry. Diagnostic only — compiled to an unconditional `true` outside
    /// debug builds.
    pub fn check_heap(&self) -> bool {
        checker::check_heap(self)
    }

    /// Prints the size and allocation state of the block at `ptr`, followed by
    /// the heap's current high-water mark, for interactive inspection.
    ///
    /// # Safety
    /// `ptr` must be a live pointer this allocator returned.
    pub unsafe fn describe_heap(&self, ptr: *mut u8) {
        unsafe {
            let header = tag::header_of_data(ptr);
            let tag = Tag::read(header);
            println!(
                "block at {:p}: {} bytes, {}, heap high = {:p}",
                ptr,
                tag.size,
                if tag.alloc { "reserved" } else { "free" },
                self.heap.high(),
            );
        }
    }
}

fn round_request(requested: usize) -> u64 {
    let padded = requested as u64 + TAG_SIZE;
    align16!(padded).max(MIN_BLOCK_SIZE)
}
