//! The invariant checker: a diagnostic, read-only walk of the heap and the free
//! index. Compiled out entirely in release builds, where it always reports success.

use crate::allocator::Allocator;
use crate::freelist::{self};
use crate::heap::HeapPrimitive;
use crate::tag::{self, Tag};

#[cfg(debug_assertions)]
pub(crate) fn check_heap<H: HeapPrimitive>(alloc: &Allocator<H>) -> bool {
    unsafe { walk_heap(alloc) && walk_buckets(alloc) }
}

#[cfg(not(debug_assertions))]
pub(crate) fn check_heap<H: HeapPrimitive>(_alloc: &Allocator<H>) -> bool {
    true
}

#[cfg(debug_assertions)]
unsafe fn in_heap<H: HeapPrimitive>(alloc: &Allocator<H>, addr: *mut u8) -> bool {
    addr >= alloc.heap.low() && addr <= alloc.heap.high()
}

/// Walks every block from the prologue to the epilogue, checking containment,
/// header/footer agreement on free blocks, and that every free block is
/// reachable from its expected bucket.
#[cfg(debug_assertions)]
unsafe fn walk_heap<H: HeapPrimitive>(alloc: &Allocator<H>) -> bool {
    unsafe {
        let prologue_tag = Tag::read(alloc.base);
        let mut current = tag::next_header(alloc.base, prologue_tag.size);

        loop {
            if !in_heap(alloc, current) {
                return false;
            }

            let current_tag = Tag::read(current);
            if current_tag.epilogue {
                return true;
            }

            if !current_tag.alloc {
                let footer = Tag::read(tag::footer_of(current, current_tag.size));
                if footer != current_tag {
                    return false;
                }
                if !bucket_contains(alloc, current, current_tag.size) {
                    return false;
                }
            }

            current = tag::next_header(current, current_tag.size);
        }
    }
}

#[cfg(debug_assertions)]
unsafe fn bucket_contains<H: HeapPrimitive>(alloc: &Allocator<H>, header: *mut u8, size: u64) -> bool {
    unsafe {
        let bucket = freelist::bucket_for(size);
        let mut current = alloc.free_index.head(bucket);
        while !current.is_null() {
            if current == header {
                return true;
            }
            current = freelist::next_free(current);
        }
        false
    }
}

/// Walks every bucket, checking that every linked block lies within the heap
/// and is actually marked free.
#[cfg(debug_assertions)]
unsafe fn walk_buckets<H: HeapPrimitive>(alloc: &Allocator<H>) -> bool {
    unsafe {
        for bucket in 0..freelist::NUM_BUCKETS {
            let mut current = alloc.free_index.head(bucket);
            while !current.is_null() {
                if !in_heap(alloc, current) {
                    return false;
                }
                if Tag::read(current).alloc {
                    return false;
                }
                current = freelist::next_free(current);
            }
        }
        true
    }
}
