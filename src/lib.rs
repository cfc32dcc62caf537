//! # segalloc - A Segregated-Free-List Memory Allocator
//!
//! This crate provides a general-purpose dynamic memory allocator built on a
//! single grow-only heap region, boundary-tag block metadata, and segregated
//! explicit free lists.
//!
//! ## Overview
//!
//! ```text
//!   Heap layout:
//!
//!   ┌──────────┬─────────────────────────────────────────────────┬──────────┐
//!   │ prologue │  block  │  block  │  block  │ ... │  block       │ epilogue │
//!   │  (8B)    │         │         │         │     │              │   (8B)   │
//!   └──────────┴─────────────────────────────────────────────────┴──────────┘
//! ```
//!
//! Every block begins with an 8-byte boundary tag packing its size and three
//! allocation bits (`A`: this block, `P`: previous neighbor, `N`: next
//! neighbor). Free blocks carry a second, identical tag (the footer) at their
//! high end; reserved blocks don't, trading 8 bytes of savings for the P/N bit
//! discipline that keeps neighbor lookups cheap regardless.
//!
//! Free blocks of similar size are linked together using their own payload as
//! back-pointers, bucketed by size so placement only has to search the buckets
//! that could possibly satisfy a request.
//!
//! ## Crate Structure
//!
//! ```text
//!   segalloc
//!   ├── align      - the align16! rounding macro
//!   ├── tag        - the boundary-tag codec and pointer arithmetic
//!   ├── freelist   - the segregated bucket index
//!   ├── placer     - best-fit-with-early-accept block search
//!   ├── block      - split / coalesce / tag-maintenance mechanics
//!   ├── heap       - the HeapPrimitive trait, sbrk backing, bootstrap/extend
//!   ├── checker    - debug-only invariant walker
//!   └── allocator  - reserve / release / resize / zalloc
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use segalloc::Allocator;
//!
//! fn main() {
//!     unsafe {
//!         let mut alloc = Allocator::init_sbrk().expect("failed to bootstrap heap");
//!
//!         let ptr = alloc.reserve(64);
//!         ptr.write(42);
//!
//!         let ptr = alloc.resize(ptr, 256);
//!         alloc.release(ptr);
//!     }
//! }
//! ```
//!
//! ## Placement
//!
//! Requests are rounded up to a 16-byte-aligned, tag-inclusive size and matched
//! against six size buckets. Within a bucket the search tracks the smallest
//! candidate at least as large as the request, accepting early once one lands
//! within 22.5% of the request instead of scanning the whole bucket for the
//! tightest possible fit.
//!
//! ## Coalescing
//!
//! Released blocks are merged with any free neighbor using the P/N bits to
//! decide, without probing, whether a neighbor has a footer to read at all.
//! Prologue and epilogue sentinels bound the heap on both ends so the merge
//! logic never special-cases its edges.
//!
//! ## Safety
//!
//! This crate is inherently unsafe: every operation works directly on raw
//! pointers into a region it manages itself. Callers must uphold the contracts
//! documented on each `unsafe fn`.

mod align;
mod allocator;
mod block;
mod checker;
#[cfg(test)]
mod fake_heap;
mod freelist;
mod heap;
mod placer;
mod tag;

pub use allocator::Allocator;
pub use heap::{HeapError, HeapPrimitive, SbrkHeap};
