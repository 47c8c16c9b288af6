//! tree-sitter allocator override for `wasm32`.
//!
//! `wasm32-unknown-unknown` builds of tree-sitter link tiny libc shims whose `malloc`/`free`
//! corrupt memory under repeated parse/drop cycles. On that target we route tree-sitter's
//! allocations through Rust's global allocator. Everywhere else this is a no-op.

#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_tree_sitter_allocator() {}

#[cfg(target_arch = "wasm32")]
pub fn ensure_tree_sitter_allocator() {
    use std::sync::Once;

    static INSTALL: Once = Once::new();

    INSTALL.call_once(|| {
        // SAFETY: runs once, before any tree-sitter object is created by this crate.
        unsafe {
            tree_sitter::set_allocator(
                Some(shim::malloc),
                Some(shim::calloc),
                Some(shim::realloc),
                Some(shim::free),
            );
        }
    });
}

/// C allocator entry points backed by `std::alloc`.
///
/// Every block is prefixed with a `usize` header holding the caller-visible size, so `free` and
/// `realloc` can rebuild the layout without an external size.
#[cfg(target_arch = "wasm32")]
mod shim {
    use core::ffi::c_void;
    use core::ptr;
    use std::alloc::{Layout, alloc, dealloc};

    const ALIGN: usize = 16;
    const HEADER: usize = core::mem::size_of::<usize>();

    fn layout_for(size: usize) -> Option<Layout> {
        let total = size.checked_add(HEADER)?;
        Layout::from_size_align(total, ALIGN).ok()
    }

    /// Returns the block base and the stored size for a user pointer.
    unsafe fn header_of(user: *mut c_void) -> (*mut u8, usize) {
        let base = unsafe { (user as *mut u8).sub(HEADER) };
        let size = unsafe { (base as *mut usize).read() };
        (base, size)
    }

    pub unsafe extern "C" fn malloc(size: usize) -> *mut c_void {
        if size == 0 {
            return ptr::null_mut();
        }
        let Some(layout) = layout_for(size) else {
            return ptr::null_mut();
        };
        // SAFETY: layout has a non-zero size.
        let base = unsafe { alloc(layout) };
        if base.is_null() {
            return ptr::null_mut();
        }
        unsafe {
            (base as *mut usize).write(size);
            base.add(HEADER) as *mut c_void
        }
    }

    pub unsafe extern "C" fn calloc(nmemb: usize, size: usize) -> *mut c_void {
        let Some(total) = nmemb.checked_mul(size) else {
            return ptr::null_mut();
        };
        let user = unsafe { malloc(total) };
        if !user.is_null() {
            unsafe { ptr::write_bytes(user as *mut u8, 0, total) };
        }
        user
    }

    pub unsafe extern "C" fn free(user: *mut c_void) {
        if user.is_null() {
            return;
        }
        let (base, size) = unsafe { header_of(user) };
        if let Some(layout) = layout_for(size) {
            unsafe { dealloc(base, layout) };
        }
    }

    pub unsafe extern "C" fn realloc(user: *mut c_void, new_size: usize) -> *mut c_void {
        if user.is_null() {
            return unsafe { malloc(new_size) };
        }
        if new_size == 0 {
            unsafe { free(user) };
            return ptr::null_mut();
        }

        let (_, old_size) = unsafe { header_of(user) };
        let moved = unsafe { malloc(new_size) };
        if moved.is_null() {
            return ptr::null_mut();
        }
        unsafe {
            ptr::copy_nonoverlapping(
                user as *const u8,
                moved as *mut u8,
                old_size.min(new_size),
            );
            free(user);
        }
        moved
    }
}
