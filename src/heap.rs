use std::ptr::{self, NonNull};

use tracing::{debug, trace, warn};

use crate::{
  align::align_up,
  config::HeapConfig,
  error::{AllocError, AllocResult, HeapError},
  region::{HEADER_SIZE, Region, RegionInfo, Walk},
  search::{SearchMode, search},
  source::HeapSource,
  stats::Stats,
};

/// Extra bytes, beyond a header, a leftover must exceed before a region is
/// split.
pub const SPLIT_SLACK: usize = 4;

/// A growable heap of regions carved out of one [`HeapSource`].
///
/// All regions, free or in use, sit in one address-ordered list:
///
/// ```text
///   first                                              last
///     │                                                  │
///     ▼                                                  ▼
///   ┌────┬──────┐  ┌────┬──────────┐  ┌────┬────┐  ┌────┬──────┐
///   │ H  │ used │─▶│ H  │   free   │─▶│ H  │used│─▶│ H  │ used │─▶ null
///   └────┴──────┘  └────┴──────────┘  └────┴────┘  └────┴──────┘
///                                                          ▲
///                                               source break
/// ```
///
/// Not thread-safe: callers must serialise every operation.
#[derive(Debug)]
pub struct Heap<S: HeapSource> {
  first: *mut Region,
  last: *mut Region,
  /// Region returned by the previous allocation (next-fit start point).
  cursor: *mut Region,
  mode: SearchMode,
  stats: Stats,
  source: S,
}

impl<S: HeapSource> Heap<S> {
  pub fn new(
    source: S,
    mode: SearchMode,
  ) -> Self {
    Self {
      first: ptr::null_mut(),
      last: ptr::null_mut(),
      cursor: ptr::null_mut(),
      mode,
      stats: Stats::default(),
      source,
    }
  }

  pub fn with_config(
    source: S,
    config: &HeapConfig,
  ) -> Self {
    Self::new(source, config.mode)
  }

  pub fn mode(&self) -> SearchMode {
    self.mode
  }

  pub fn stats(&self) -> &Stats {
    &self.stats
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  /// Snapshot of every region in address order.
  pub fn regions(&self) -> impl Iterator<Item = RegionInfo> + '_ {
    Walk::from(self.first).map(|region| unsafe { RegionInfo::of(region) })
  }

  /// Payload bytes usable behind `ptr`, which may exceed what was asked.
  ///
  /// # Safety
  ///
  /// `ptr` must be a live allocation of this heap.
  pub unsafe fn payload_size(
    &self,
    ptr: NonNull<u8>,
  ) -> usize {
    unsafe { (*Region::from_payload(ptr.as_ptr())).size }
  }

  /// Allocates at least `size` bytes, aligned to [`crate::align::ALIGNMENT`].
  ///
  /// Reuses a free region picked by the heap's [`SearchMode`], splitting it
  /// when the leftover is worth keeping, and grows the heap otherwise.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> AllocResult<NonNull<u8>> {
    let size = align_up(size).ok_or(AllocError::Overflow)?;

    if size == 0 {
      return Err(AllocError::ZeroSize);
    }

    let scan = unsafe { search(self.first, self.cursor, size, self.mode) };

    let (region, reused) = if scan.found.is_null() {
      debug_assert_eq!(scan.last_visited, self.last, "search did not reach the tail");
      (self.grow(size)?, false)
    } else {
      unsafe { self.split(scan.found, size) };
      (scan.found, true)
    };

    unsafe { (*region).free = false };
    self.cursor = region;
    self.stats.record_allocation(size, reused);

    let payload = unsafe { NonNull::new_unchecked(Region::payload(region)) };
    trace!(size, reused, addr = ?payload, mode = %self.mode, "allocated");

    Ok(payload)
  }

  /// Returns `ptr` to the heap and merges every run of adjacent free
  /// regions. Null is ignored.
  ///
  /// Releasing a region twice trips a debug assertion; release builds do
  /// not check.
  ///
  /// # Safety
  ///
  /// `ptr` must be null or an allocation of this heap that has not been
  /// released yet.
  pub unsafe fn release(
    &mut self,
    ptr: *mut u8,
  ) {
    if ptr.is_null() {
      return;
    }

    unsafe {
      let region = Region::from_payload(ptr);
      debug_assert!(!(*region).free, "double release of {ptr:p}");

      (*region).free = true;
      trace!(size = (*region).size, addr = ?ptr, "released");
    }

    self.stats.releases += 1;
    self.coalesce();
  }

  /// Allocates `count * element_size` bytes and zeroes the whole payload.
  pub fn zero_allocate(
    &mut self,
    count: usize,
    element_size: usize,
  ) -> AllocResult<NonNull<u8>> {
    let total = count.checked_mul(element_size).ok_or(AllocError::Overflow)?;
    let payload = self.allocate(total)?;

    unsafe {
      let size = self.payload_size(payload);
      ptr::write_bytes(payload.as_ptr(), 0, size);
    }

    Ok(payload)
  }

  /// Resizes the allocation behind `ptr`.
  ///
  /// - null `ptr`: plain [`Heap::allocate`].
  /// - `new_size == 0`: releases `ptr` and yields `Ok(None)`.
  /// - payload already large enough: `ptr` unchanged, nothing shrinks.
  /// - otherwise the bytes move to a new region and `ptr` is released. If
  ///   that allocation fails, `ptr` stays valid.
  ///
  /// # Safety
  ///
  /// Same contract as [`Heap::release`].
  pub unsafe fn resize_allocate(
    &mut self,
    ptr: *mut u8,
    new_size: usize,
  ) -> AllocResult<Option<NonNull<u8>>> {
    let Some(old) = NonNull::new(ptr) else {
      return self.allocate(new_size).map(Some);
    };

    if new_size == 0 {
      unsafe { self.release(ptr) };
      return Ok(None);
    }

    let old_size = unsafe { self.payload_size(old) };
    if old_size >= new_size {
      return Ok(Some(old));
    }

    let new = self.allocate(new_size)?;

    unsafe {
      ptr::copy_nonoverlapping(old.as_ptr(), new.as_ptr(), old_size.min(new_size));
      self.release(ptr);
    }

    Ok(Some(new))
  }

  /// Verifies the list: regions are contiguous, no two neighbours are
  /// both free, and the tracked tail is the real tail.
  pub fn check(&self) -> Result<(), HeapError> {
    let mut tail: *mut Region = ptr::null_mut();

    for region in Walk::from(self.first) {
      tail = region;
      let next = unsafe { (*region).next };
      if next.is_null() {
        continue;
      }

      unsafe {
        if Region::end(region) != next.cast() {
          return Err(HeapError::Gap {
            at: region as usize,
            next: next as usize,
          });
        }
        if (*region).free && (*next).free {
          return Err(HeapError::UncoalescedFree {
            first: Region::payload(region) as usize,
            second: Region::payload(next) as usize,
          });
        }
      }
    }

    if tail != self.last {
      return Err(HeapError::TailMismatch {
        tracked: self.last as usize,
        actual: tail as usize,
      });
    }

    Ok(())
  }

  /// Appends a new in-use region of `size` payload bytes after the tail.
  fn grow(
    &mut self,
    size: usize,
  ) -> AllocResult<*mut Region> {
    let increment = HEADER_SIZE.checked_add(size).ok_or(AllocError::Overflow)?;

    let at = self.source.extend(increment).map_err(|err| {
      warn!(%err, size, "heap growth failed");
      AllocError::OutOfMemory { requested: increment }
    })?;

    let region = unsafe { Region::init(at.as_ptr(), size, false, ptr::null_mut()) };

    if self.first.is_null() {
      self.first = region;
    } else {
      unsafe { (*self.last).next = region };
    }
    self.last = region;

    self.stats.record_growth(increment);
    debug!(increment, addr = ?at, "heap grown");

    Ok(region)
  }

  /// Shrinks `region` to `size` and turns its trailing space into a new free
  /// region, if the leftover exceeds a header plus [`SPLIT_SLACK`].
  unsafe fn split(
    &mut self,
    region: *mut Region,
    size: usize,
  ) {
    unsafe {
      let leftover = (*region).size - size;
      if leftover <= HEADER_SIZE + SPLIT_SLACK {
        return;
      }

      let at = Region::payload(region).add(size);
      let remainder = Region::init(at, leftover - HEADER_SIZE, true, (*region).next);

      (*region).size = size;
      (*region).next = remainder;

      if region == self.last {
        self.last = remainder;
      }

      self.stats.splits += 1;
      trace!(size, remainder = (*remainder).size, "split region");
    }
  }

  /// One forward pass over the whole list, folding every free successor of
  /// a free region into it.
  fn coalesce(&mut self) {
    let mut current = self.first;

    while !current.is_null() {
      unsafe {
        let next = (*current).next;

        if !next.is_null() && (*current).free && (*next).free {
          (*current).size += HEADER_SIZE + (*next).size;
          (*current).next = (*next).next;

          if next == self.last {
            self.last = current;
          }
          if next == self.cursor {
            self.cursor = current;
          }

          self.stats.coalesces += 1;
          trace!(size = (*current).size, "coalesced regions");
          continue;
        }

        current = next;
      }
    }
  }
}
