//! Tag maintenance, splitting, and coalescing — the pointer-level mechanics that
//! keep the P/N neighbor bits and free-block footers consistent across every
//! state change.

use crate::tag::{self, Tag, MIN_BLOCK_SIZE, TAG_SIZE};

/// After a block's own tag has just been written, refreshes the bits that
/// describe it from its neighbors' point of view:
///
/// - the next block's `P` bit (and, if that neighbor is free, its footer too)
/// - the previous block's `N` bit, *if* the previous block is free (found via
///   its footer, since only free blocks carry one)
///
/// This is the one place neighbor-bit discipline lives; every operation that
/// changes a block's allocation state calls it exactly once on the result.
///
/// # Safety
/// `header` must address a live, correctly-sized block with valid neighbors on
/// both sides (the prologue and epilogue sentinels make this true at the edges
/// of the heap).
pub(crate) unsafe fn refresh_neighbors(header: *mut u8) {
    unsafe {
        let tag = Tag::read(header);

        let next = tag::next_header(header, tag.size);
        let mut next_tag = Tag::read(next);
        next_tag.prev_alloc = tag.alloc;
        next_tag.write(next);
        if !next_tag.epilogue && !next_tag.alloc {
            next_tag.write(tag::footer_of(next, next_tag.size));
        }

        if !tag.prev_alloc {
            let prev_footer = header.sub(TAG_SIZE as usize);
            let mut prev_tag = Tag::read(prev_footer);
            prev_tag.next_alloc = tag.alloc;
            prev_tag.write(prev_footer);
            let prev_header = prev_footer.sub((prev_tag.size - TAG_SIZE) as usize);
            prev_tag.write(prev_header);
        }
    }
}

/// Splits a block at `header` (currently sized `> size + MIN_BLOCK_SIZE`) into a
/// reserved low block of exactly `size` bytes and a free tail holding the rest.
/// Returns the tail's header; the caller is responsible for inserting it into
/// the free index.
///
/// Both new tags are derived from a snapshot of the original tag taken before
/// either write lands, so the tail's header is never computed from memory this
/// same call has already overwritten.
///
/// # Safety
/// `header` must be a free block of at least `size + MIN_BLOCK_SIZE + 1` bytes.
pub(crate) unsafe fn split(header: *mut u8, size: u64) -> *mut u8 {
    unsafe {
        let old = Tag::read(header);
        debug_assert!(
            old.size > size + MIN_BLOCK_SIZE,
            "split called on a block too small to leave a valid free remainder"
        );

        let low = Tag::new(size, true, old.prev_alloc, false, false);
        low.write(header);

        let tail_header = tag::next_header(header, size);
        let remaining = old.size - size;
        let tail = Tag::new(remaining, false, true, old.next_alloc, old.epilogue);
        tail.write(tail_header);
        tail.write(tag::footer_of(tail_header, remaining));

        refresh_neighbors(header);
        refresh_neighbors(tail_header);

        tail_header
    }
}

/// Converts a whole free block at `header` into a reserved block in place,
/// without splitting. Used when the remainder after a hypothetical split would
/// be too small to stand alone as a free block.
///
/// # Safety
/// `header` must address a currently-free block.
pub(crate) unsafe fn reserve_whole(header: *mut u8) {
    unsafe {
        let mut tag = Tag::read(header);
        tag.alloc = true;
        tag.write(header);
        refresh_neighbors(header);
    }
}

/// Merges the free region `[header, end)` into a single free block, where `end`
/// points at the header of the (not necessarily free) block that follows the
/// merged range. The merged block's `N` bit is taken from that true successor's
/// own `A` bit, matching the P/N consistency invariant.
///
/// # Safety
/// `[header, end)` must consist of one or two free blocks with no reserved gaps,
/// already unlinked from the free index; `end` must be a live tag.
pub(crate) unsafe fn merge(header: *mut u8, end: *mut u8) -> *mut u8 {
    unsafe {
        let start = Tag::read(header);
        let successor = Tag::read(end);
        let merged_size = end as usize as u64 - header as usize as u64;

        let merged = Tag::new(merged_size, false, start.prev_alloc, successor.alloc, start.epilogue);
        merged.write(header);
        merged.write(tag::footer_of(header, merged_size));

        refresh_neighbors(header);
        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freelist::FreeIndex;

    #[test]
    fn split_produces_a_correctly_sized_reserved_low_block_and_free_tail() {
        let mut heap = vec![0u8; 256];
        unsafe {
            let base = heap.as_mut_ptr();
            // [prologue 8][block 240][epilogue 0]
            Tag::new(8, true, true, true, false).write(base);
            let block_header = base.add(8);
            Tag::new(240, false, true, true, false).write(block_header);
            Tag::new(240, false, true, true, false).write(block_header.add(232));
            Tag::new(0, true, false, true, true).write(base.add(248));

            let tail = split(block_header, 80);

            let low = Tag::read(block_header);
            assert_eq!(low.size, 80);
            assert!(low.alloc);
            assert!(low.prev_alloc);
            assert!(!low.next_alloc);

            let tail_tag = Tag::read(tail);
            assert_eq!(tail_tag.size, 160);
            assert!(!tail_tag.alloc);
            assert!(tail_tag.prev_alloc);
            let tail_footer = Tag::read(tag::footer_of(tail, 160));
            assert_eq!(tail_footer, tail_tag);
        }
    }

    #[test]
    fn merge_spans_from_predecessor_start_to_successor_end() {
        let mut heap = vec![0u8; 256];
        unsafe {
            let a = heap.as_mut_ptr();
            Tag::new(80, false, true, true, false).write(a);
            Tag::new(80, false, true, true, false).write(a.add(72));

            let b = a.add(80);
            Tag::new(80, false, false, true, false).write(b);
            Tag::new(80, false, false, true, false).write(b.add(72));

            let c = b.add(80);
            Tag::new(0, true, false, true, true).write(c); // stands in for a reserved/epilogue successor

            let mut index = FreeIndex::new();
            index.insert(a, 80);
            index.insert(b, 80);

            index.unlink(a);
            index.unlink(b);
            let merged = merge(a, c);

            assert_eq!(merged, a);
            let tag = Tag::read(merged);
            assert_eq!(tag.size, 160);
            assert!(!tag.alloc);
            assert!(tag.prev_alloc);
            assert!(tag.next_alloc);
        }
    }
}
