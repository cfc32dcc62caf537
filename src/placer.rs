//! Best-fit-with-early-accept placement over the segregated free index.

use crate::freelist::{self, FreeIndex};
use crate::tag::Tag;

/// Candidates within this fraction of the requested size are accepted immediately
/// instead of continuing to hunt for something tighter.
const EARLY_ACCEPT_MARGIN: f64 = 0.225;

/// Finds a free block of at least `size` bytes, starting at `size`'s own bucket
/// and falling through to larger buckets (the last bucket is also the universal
/// fallback). Within a bucket this tracks the smallest-size candidate seen so
/// far, short-circuiting as soon as one lands within the early-accept margin.
///
/// # Safety
/// Every block reachable from `index` must be a valid, currently-free block.
pub(crate) unsafe fn find_fit(index: &FreeIndex, size: u64) -> Option<*mut u8> {
    unsafe {
        for bucket in freelist::bucket_for(size)..freelist::NUM_BUCKETS {
            let mut current = index.head(bucket);
            let mut best: Option<(*mut u8, u64)> = None;

            while !current.is_null() {
                let tag = Tag::read(current);
                if tag.size >= size {
                    let is_smaller_than_best = match best {
                        None => true,
                        Some((_, best_size)) => tag.size < best_size,
                    };
                    if is_smaller_than_best {
                        best = Some((current, tag.size));
                        let ceiling = size as f64 + size as f64 * EARLY_ACCEPT_MARGIN;
                        if tag.size as f64 <= ceiling {
                            break;
                        }
                    }
                }
                current = freelist::next_free(current);
            }

            if let Some((block, _)) = best {
                return Some(block);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::TAG_SIZE;

    unsafe fn block(storage: &mut [u8], size: u64) -> *mut u8 {
        unsafe {
            let header = storage.as_mut_ptr();
            Tag::new(size, false, true, true, false).write(header);
            Tag::new(size, false, true, true, false).write(header.add((size - TAG_SIZE) as usize));
            header
        }
    }

    #[test]
    fn early_accept_picks_within_margin_of_requested_size() {
        let mut s64 = [0u8; 64];
        let mut s96 = [0u8; 96];
        let mut s128 = [0u8; 128];

        unsafe {
            let b64 = block(&mut s64, 64);
            let b96 = block(&mut s96, 96);
            let b128 = block(&mut s128, 128);

            let mut index = FreeIndex::new();
            index.insert(b64, 64);
            index.insert(b96, 96);
            index.insert(b128, 128);

            // Request rounds to 80: bucket_for(80) is the <=96 bucket, which only
            // holds the 96 block; 96 is within [80, 80*1.225] so it's returned
            // without falling through to the catch-all bucket holding 128.
            let found = find_fit(&index, 80).expect("a fit should be found");
            assert_eq!(found, b96);
        }
    }

    #[test]
    fn falls_through_to_larger_bucket_when_none_fits() {
        let mut s256 = [0u8; 256];
        unsafe {
            let b256 = block(&mut s256, 256);
            let mut index = FreeIndex::new();
            index.insert(b256, 256);

            // bucket_for(40) is the <=48 bucket, which is empty; the search must
            // fall through all the way to the catch-all bucket holding 256.
            let found = find_fit(&index, 40).expect("a fit should be found");
            assert_eq!(found, b256);
        }
    }

    #[test]
    fn returns_none_when_nothing_is_large_enough() {
        let mut s32 = [0u8; 32];
        unsafe {
            let b32 = block(&mut s32, 32);
            let mut index = FreeIndex::new();
            index.insert(b32, 32);
            assert!(find_fit(&index, 1024).is_none());
        }
    }
}
