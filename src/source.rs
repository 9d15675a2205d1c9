//! Where heap memory comes from.
//!
//! ```text
//!   before extend(n):   ... ─┬─────────────── break
//!                            ▼
//!   after extend(n):    ... ─┬──── n bytes ───┬── new break
//!                            ▲
//!                            └── returned (prior break)
//! ```

use std::{
  alloc::{self, Layout},
  ptr::NonNull,
};

use libc::{c_void, intptr_t, sbrk};

use crate::{align, align::ALIGNMENT, error::SourceError};

/// A contiguous, grow-only range of memory.
///
/// # Safety
///
/// Implementors must guarantee that a successful `extend(n)` returns the
/// previous end of the range, that the returned address is aligned to
/// [`ALIGNMENT`], that `n` bytes starting there are valid for reads and
/// writes, and that consecutive extensions are contiguous.
pub unsafe trait HeapSource {
  /// Current end of the range (`sbrk(0)`).
  fn current(&mut self) -> *mut u8;

  /// Grows the range by `increment` bytes and returns the previous end.
  fn extend(
    &mut self,
    increment: usize,
  ) -> Result<NonNull<u8>, SourceError>;
}

/// The process data segment, grown with `sbrk(2)`.
///
/// Only one `Sbrk`-backed heap may exist per process, and nothing else may
/// move the break while it is in use.
#[derive(Debug, Default)]
pub struct Sbrk {
  aligned: bool,
}

impl Sbrk {
  pub const fn new() -> Self {
    Self { aligned: false }
  }

  /// Moves a misaligned initial break up to the word boundary.
  fn align_break(&mut self) -> Result<(), SourceError> {
    let pad = break_padding(self.current() as usize);

    if pad > 0 && unsafe { sbrk(pad as intptr_t) } == usize::MAX as *mut c_void {
      return Err(SourceError::Refused);
    }

    self.aligned = true;
    Ok(())
  }
}

/// Bytes needed to bring `brk` up to the next word boundary.
fn break_padding(brk: usize) -> usize {
  align!(brk) - brk
}

unsafe impl HeapSource for Sbrk {
  fn current(&mut self) -> *mut u8 {
    unsafe { sbrk(0) }.cast()
  }

  fn extend(
    &mut self,
    increment: usize,
  ) -> Result<NonNull<u8>, SourceError> {
    if !self.aligned {
      self.align_break()?;
    }

    let increment = intptr_t::try_from(increment).map_err(|_| SourceError::Refused)?;

    let before = self.current();
    let address = unsafe { sbrk(increment) };

    if address == usize::MAX as *mut c_void {
      return Err(SourceError::Refused);
    }

    debug_assert_eq!(before, address.cast::<u8>(), "program break moved outside the heap");

    NonNull::new(address.cast()).ok_or(SourceError::Refused)
  }
}

/// A fixed-capacity buffer handed out bump-style.
///
/// Gives every heap its own address range, which makes it possible to run
/// several independent heaps side by side and to test deterministically.
#[derive(Debug)]
pub struct Arena {
  base: NonNull<u8>,
  capacity: usize,
  used: usize,
}

impl Arena {
  const ALIGN: usize = 16;

  /// Reserves `capacity` bytes (rounded up to the word size).
  ///
  /// # Panics
  ///
  /// When the capacity cannot be described by a [`Layout`].
  pub fn new(capacity: usize) -> Self {
    let capacity = align!(capacity.max(ALIGNMENT));
    let layout = match Layout::from_size_align(capacity, Self::ALIGN) {
      Ok(layout) => layout,
      Err(_) => panic!("arena capacity {capacity} is too large"),
    };

    let base = unsafe { alloc::alloc(layout) };
    let base = NonNull::new(base).unwrap_or_else(|| alloc::handle_alloc_error(layout));

    Self {
      base,
      capacity,
      used: 0,
    }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Bytes already handed out.
  pub fn used(&self) -> usize {
    self.used
  }

  pub fn remaining(&self) -> usize {
    self.capacity - self.used
  }

  /// Whether `address` lies inside the bytes handed out so far.
  pub fn contains(
    &self,
    address: *const u8,
  ) -> bool {
    let start = self.base.as_ptr() as usize;
    (start..start + self.used).contains(&(address as usize))
  }
}

unsafe impl HeapSource for Arena {
  fn current(&mut self) -> *mut u8 {
    unsafe { self.base.as_ptr().add(self.used) }
  }

  fn extend(
    &mut self,
    increment: usize,
  ) -> Result<NonNull<u8>, SourceError> {
    if increment > self.remaining() {
      return Err(SourceError::Exhausted {
        requested: increment,
        remaining: self.remaining(),
      });
    }

    let prior = self.current();
    self.used += increment;

    NonNull::new(prior).ok_or(SourceError::Refused)
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    if let Ok(layout) = Layout::from_size_align(self.capacity, Self::ALIGN) {
      unsafe { alloc::dealloc(self.base.as_ptr(), layout) };
    }
  }
}
