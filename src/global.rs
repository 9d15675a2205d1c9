//! The process-wide heap.
//!
//! One [`Heap`] over the program break, built on first use from
//! [`HeapConfig::from_env`]. Every failure collapses into a null pointer,
//! which is all a `malloc`-style caller can observe.
//!
//! ```rust,ignore
//! use fitalloc::FitAlloc;
//!
//! #[global_allocator]
//! static GLOBAL: FitAlloc = FitAlloc;
//! ```
//!
//! Nothing here is synchronised. Only single-threaded programs may use it,
//! and no `tracing` subscriber that allocates may be installed (build with
//! the `quiet` feature to compile the events out).

use core::{
  alloc::{GlobalAlloc, Layout},
  cell::UnsafeCell,
  fmt::{self, Write},
  ptr,
  sync::atomic::{AtomicBool, Ordering},
};

use crate::{
  align::ALIGNMENT,
  config::HeapConfig,
  heap::Heap,
  source::Sbrk,
  stats::Stats,
};

struct Process {
  heap: Heap<Sbrk>,
  config: HeapConfig,
}

struct ProcessHolder(UnsafeCell<Option<Process>>);

unsafe impl Sync for ProcessHolder {}

static PROCESS: ProcessHolder = ProcessHolder(UnsafeCell::new(None));
static REPORT_REGISTERED: AtomicBool = AtomicBool::new(false);

/// # Safety
///
/// Single-threaded access only; the returned reference must not outlive
/// the current call.
unsafe fn process() -> &'static mut Process {
  let slot = unsafe { &mut *PROCESS.0.get() };
  slot.get_or_insert_with(|| {
    let config = unsafe { HeapConfig::from_env() };
    Process {
      heap: Heap::with_config(Sbrk::new(), &config),
      config,
    }
  })
}

/// Registers [`report_statistics`] with `atexit(3)` the first time it runs.
fn register_report(config: &HeapConfig) {
  register_once(&REPORT_REGISTERED, config, || unsafe {
    libc::atexit(report_statistics);
  });
}

fn register_once(
  registered: &AtomicBool,
  config: &HeapConfig,
  register: impl FnOnce(),
) {
  if !config.report_at_exit || registered.swap(true, Ordering::Relaxed) {
    return;
  }
  register();
}

/// Whether the exit report has been registered with `atexit(3)`.
pub fn report_registered() -> bool {
  REPORT_REGISTERED.load(Ordering::Relaxed)
}

extern "C" fn report_statistics() {
  let stats = unsafe { stats() };
  let mut out = StackWriter::<512>::new();
  // A truncated report is still worth printing.
  let _ = write!(out, "{stats}");
  out.flush_to(libc::STDOUT_FILENO);
}

/// Counters of the process heap (all zero before the first allocation).
///
/// # Safety
///
/// Single-threaded access only.
pub unsafe fn stats() -> Stats {
  match unsafe { &*PROCESS.0.get() } {
    Some(process) => *process.heap.stats(),
    None => Stats::default(),
  }
}

/// `malloc`: null on a zero-size request or when the break cannot move.
///
/// # Safety
///
/// Single-threaded access only.
pub unsafe fn allocate(size: usize) -> *mut u8 {
  let process = unsafe { process() };
  register_report(&process.config);

  process
    .heap
    .allocate(size)
    .map_or(ptr::null_mut(), |payload| payload.as_ptr())
}

/// `free`: null is ignored.
///
/// # Safety
///
/// `ptr` must be null or a live allocation of the process heap.
pub unsafe fn release(ptr: *mut u8) {
  if ptr.is_null() {
    return;
  }
  unsafe { process().heap.release(ptr) };
}

/// `calloc`.
///
/// # Safety
///
/// Single-threaded access only.
pub unsafe fn zero_allocate(
  count: usize,
  element_size: usize,
) -> *mut u8 {
  let process = unsafe { process() };
  register_report(&process.config);

  process
    .heap
    .zero_allocate(count, element_size)
    .map_or(ptr::null_mut(), |payload| payload.as_ptr())
}

/// `realloc`.
///
/// # Safety
///
/// `ptr` must be null or a live allocation of the process heap.
pub unsafe fn resize_allocate(
  ptr: *mut u8,
  new_size: usize,
) -> *mut u8 {
  let process = unsafe { process() };
  register_report(&process.config);

  match unsafe { process.heap.resize_allocate(ptr, new_size) } {
    Ok(Some(payload)) => payload.as_ptr(),
    Ok(None) | Err(_) => ptr::null_mut(),
  }
}

/// [`GlobalAlloc`] over the process heap.
///
/// Layouts aligned beyond [`ALIGNMENT`] are refused with null.
pub struct FitAlloc;

unsafe impl GlobalAlloc for FitAlloc {
  #[inline]
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if layout.align() > ALIGNMENT {
      return ptr::null_mut();
    }
    if layout.size() == 0 {
      return layout.align() as *mut u8;
    }
    unsafe { allocate(layout.size()) }
  }

  #[inline]
  unsafe fn alloc_zeroed(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if layout.align() > ALIGNMENT {
      return ptr::null_mut();
    }
    if layout.size() == 0 {
      return layout.align() as *mut u8;
    }
    unsafe { zero_allocate(1, layout.size()) }
  }

  #[inline]
  unsafe fn dealloc(
    &self,
    ptr: *mut u8,
    layout: Layout,
  ) {
    if layout.size() == 0 {
      return;
    }
    unsafe { release(ptr) };
  }

  #[inline]
  unsafe fn realloc(
    &self,
    ptr: *mut u8,
    layout: Layout,
    new_size: usize,
  ) -> *mut u8 {
    if layout.size() == 0 {
      return unsafe { self.alloc(Layout::from_size_align_unchecked(new_size, layout.align())) };
    }
    unsafe { resize_allocate(ptr, new_size) }
  }
}

/// Fixed-size formatting buffer; output beyond `N` bytes is dropped.
struct StackWriter<const N: usize> {
  buf: [u8; N],
  len: usize,
}

impl<const N: usize> StackWriter<N> {
  const fn new() -> Self {
    Self { buf: [0; N], len: 0 }
  }

  fn as_bytes(&self) -> &[u8] {
    &self.buf[..self.len]
  }

  fn flush_to(
    &self,
    fd: libc::c_int,
  ) {
    let bytes = self.as_bytes();
    unsafe { libc::write(fd, bytes.as_ptr().cast(), bytes.len()) };
  }
}

impl<const N: usize> Write for StackWriter<N> {
  fn write_str(
    &mut self,
    s: &str,
  ) -> fmt::Result {
    let room = N - self.len;
    let take = s.len().min(room);
    self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
    self.len += take;

    if take < s.len() { Err(fmt::Error) } else { Ok(()) }
  }
}
