use core::{mem, ptr};

/// Header prefixed to every region in the heap.
///
/// ```text
///   ┌───────────────────────┬────────────────────────────────┐
///   │    Region Header      │         Payload                │
///   │  size / free / next   │      `size` bytes              │
///   └───────────────────────┴────────────────────────────────┘
///                           ▲
///                           └── address handed to the client
/// ```
///
/// `size` never includes the header itself.
#[derive(Debug)]
#[repr(C)]
pub(crate) struct Region {
  pub size: usize,
  pub next: *mut Region,
  pub free: bool,
}

pub const HEADER_SIZE: usize = mem::size_of::<Region>();

const _: () = assert!(HEADER_SIZE % crate::align::ALIGNMENT == 0);

impl Region {
  /// Writes a fresh header at `at` and returns it.
  ///
  /// # Safety
  ///
  /// `at` must be word aligned and valid for `HEADER_SIZE + size` bytes.
  pub unsafe fn init(
    at: *mut u8,
    size: usize,
    free: bool,
    next: *mut Region,
  ) -> *mut Region {
    let region = at.cast::<Region>();
    unsafe { region.write(Region { size, next, free }) };
    region
  }

  /// Locates the header of a payload handed out by the heap.
  ///
  /// # Safety
  ///
  /// `payload` must have been returned by the same heap.
  pub unsafe fn from_payload(payload: *mut u8) -> *mut Region {
    unsafe { payload.sub(HEADER_SIZE) }.cast()
  }

  /// # Safety
  ///
  /// `region` must point to a live header.
  pub unsafe fn payload(region: *mut Region) -> *mut u8 {
    unsafe { region.cast::<u8>().add(HEADER_SIZE) }
  }

  /// First byte past the payload.
  ///
  /// # Safety
  ///
  /// `region` must point to a live header.
  pub unsafe fn end(region: *mut Region) -> *mut u8 {
    unsafe { Self::payload(region).add((*region).size) }
  }
}

/// Snapshot of one region, as reported by [`crate::Heap::regions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionInfo {
  /// Address of the payload.
  pub address: usize,
  pub size: usize,
  pub free: bool,
}

impl RegionInfo {
  pub(crate) unsafe fn of(region: *mut Region) -> Self {
    unsafe {
      Self {
        address: Region::payload(region) as usize,
        size: (*region).size,
        free: (*region).free,
      }
    }
  }
}

/// Forward iterator over the raw region list.
pub(crate) struct Walk {
  current: *mut Region,
}

impl Walk {
  pub fn from(head: *mut Region) -> Self {
    Self { current: head }
  }
}

impl Iterator for Walk {
  type Item = *mut Region;

  fn next(&mut self) -> Option<Self::Item> {
    if self.current.is_null() {
      return None;
    }
    let region = self.current;
    self.current = unsafe { (*region).next };
    Some(region)
  }
}

impl Default for Walk {
  fn default() -> Self {
    Self::from(ptr::null_mut())
  }
}
