//! A small interactive walkthrough of the four allocator operations over the
//! real process heap, in the spirit of a hands-on demo rather than a test.
//!
//! Run with `cargo run --example walkthrough`.

use segalloc::Allocator;

fn main() {
    unsafe {
        let mut alloc = Allocator::init_sbrk().expect("failed to bootstrap the heap");

        println!("reserving 48 bytes...");
        let a = alloc.reserve(48);
        assert!(!a.is_null());
        a.write(0xAA);
        println!("  got {:p}, wrote a byte, check_heap = {}", a, alloc.check_heap());

        println!("reserving 4096 bytes...");
        let b = alloc.reserve(4096);
        assert!(!b.is_null());
        println!("  got {:p}, check_heap = {}", b, alloc.check_heap());

        println!("releasing the 48-byte block...");
        alloc.release(a);
        println!("  check_heap = {}", alloc.check_heap());

        println!("reserving 32 bytes (should reuse the freed block's space)...");
        let c = alloc.reserve(32);
        assert!(!c.is_null());
        println!("  got {:p}, check_heap = {}", c, alloc.check_heap());

        println!("growing the 4096-byte block to 8192 bytes via resize...");
        let b = alloc.resize(b, 8192);
        assert!(!b.is_null());
        println!("  got {:p}, check_heap = {}", b, alloc.check_heap());

        println!("zero-allocating 16 elements of 8 bytes each...");
        let d = alloc.zalloc(16, 8);
        assert!(!d.is_null());
        for i in 0..128usize {
            assert_eq!(d.add(i).read(), 0);
        }
        println!("  got {:p}, all zeroed, check_heap = {}", d, alloc.check_heap());

        alloc.release(b);
        alloc.release(c);
        alloc.release(d);
        println!("released everything, check_heap = {}", alloc.check_heap());
    }
}
