//! A test-only [`HeapPrimitive`] backed by a fixed-capacity buffer, so the block
//! allocator's logic can be exercised without touching the real process break.

use crate::heap::{HeapError, HeapPrimitive};

pub(crate) struct FakeHeap {
    storage: Box<[u8]>,
    used: usize,
}

impl FakeHeap {
    /// Creates a fake heap with room for up to `capacity` bytes. Boxed once up
    /// front so every address handed out stays valid for the fake's lifetime,
    /// unlike a `Vec<u8>` that might reallocate and move on growth.
    pub(crate) fn new(capacity: usize) -> Self {
        Self { storage: vec![0u8; capacity].into_boxed_slice(), used: 0 }
    }
}

impl HeapPrimitive for FakeHeap {
    unsafe fn extend(&mut self, n: usize) -> Result<*mut u8, HeapError> {
        if self.used + n > self.storage.len() {
            return Err(HeapError::OutOfMemory);
        }
        let base = unsafe { self.storage.as_mut_ptr().add(self.used) };
        self.used += n;
        Ok(base)
    }

    fn low(&self) -> *mut u8 {
        self.storage.as_ptr() as *mut u8
    }

    fn high(&self) -> *mut u8 {
        unsafe { self.storage.as_ptr().add(self.used) as *mut u8 }
    }
}
