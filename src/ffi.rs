//! Drop-in C allocator symbols backed by the process heap.
//!
//! Compiled only with the `c-abi` feature. Linking a binary (or preloading
//! a `cdylib`) built this way routes every `malloc` in the process through
//! [`crate::global`].

use core::ffi::c_void;

use crate::global;

#[unsafe(no_mangle)]
pub unsafe extern "C" fn malloc(size: usize) -> *mut c_void {
  unsafe { global::allocate(size) }.cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn free(ptr: *mut c_void) {
  unsafe { global::release(ptr.cast()) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn calloc(
  nmemb: usize,
  size: usize,
) -> *mut c_void {
  unsafe { global::zero_allocate(nmemb, size) }.cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn realloc(
  ptr: *mut c_void,
  size: usize,
) -> *mut c_void {
  unsafe { global::resize_allocate(ptr.cast(), size) }.cast()
}
