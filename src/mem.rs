//!Rust allocator hooks for zstd contexts
//!
//!Every compression/decompression session is allocated through these, so codec memory is
//!accounted for by the global allocator of the program.
use zstd_sys as sys;

use core::ffi::c_void;
use core::{mem, ptr};
use std::alloc::Layout;

//Linux & win 32 bit are 8
#[cfg(not(any(target_os = "macos", all(windows, target_pointer_width = "64"))))]
const MIN_ALIGN: usize = 8;
//Mac and  win 64 bit are 16
#[cfg(any(target_os = "macos", all(windows, target_pointer_width = "64")))]
const MIN_ALIGN: usize = 16;

const LAYOUT_OFFSET: usize = mem::size_of::<usize>();

#[cold]
#[inline(never)]
fn unlikely_null() -> *mut c_void {
    ptr::null_mut()
}

#[inline]
///`malloc` impl with Rust allocator
pub unsafe extern "C" fn zframe_malloc(size: usize) -> *mut c_void {
    if let Ok(layout) = Layout::from_size_align(size + LAYOUT_OFFSET, MIN_ALIGN) {
        let mem = std::alloc::alloc(layout);
        if !mem.is_null() {
            ptr::write(mem as *mut usize, size);
            return mem.add(LAYOUT_OFFSET) as _
        }
    }

    unlikely_null()
}

#[inline]
///`free` impl with Rust allocator
pub unsafe extern "C" fn zframe_free(mem: *mut c_void) {
    if !mem.is_null() {
        let mem = (mem as *mut u8).offset(-(LAYOUT_OFFSET as isize));
        let size = ptr::read(mem as *const usize);
        let layout = Layout::from_size_align_unchecked(size + LAYOUT_OFFSET, MIN_ALIGN);
        std::alloc::dealloc(mem, layout);
    }
}

unsafe extern "C" fn zframe_malloc_with_state(_: *mut c_void, size: usize) -> *mut c_void {
    zframe_malloc(size)
}

unsafe extern "C" fn zframe_free_with_state(_: *mut c_void, mem: *mut c_void) {
    zframe_free(mem)
}

#[inline(always)]
///Allocator descriptor passed to `ZSTD_create*_advanced`
pub(crate) const fn custom_mem() -> sys::ZSTD_customMem {
    sys::ZSTD_customMem {
        customAlloc: Some(zframe_malloc_with_state),
        customFree: Some(zframe_free_with_state),
        opaque: ptr::null_mut(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_allocate_and_release() {
        unsafe {
            let block = zframe_malloc(64) as *mut u8;
            assert!(!block.is_null());
            assert_eq!(block as usize % mem::align_of::<usize>(), 0);
            ptr::write_bytes(block, 0xAB, 64);
            assert_eq!(*block.add(63), 0xAB);
            zframe_free(block as _);
            zframe_free(ptr::null_mut());
        }
    }
}
