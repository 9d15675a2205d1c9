//! # fitalloc - A Free-List Memory Allocator
//!
//! This crate provides a general-purpose heap allocator that keeps every
//! region it has ever handed out in one address-ordered list, reuses free
//! regions with a selectable search policy, and grows the heap with `sbrk`
//! only when nothing fits.
//!
//! ## Overview
//!
//! ```text
//!   Heap Layout:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         HEAP MEMORY                                  │
//!   │                                                                      │
//!   │   ┌─────┬─────┬───────────┬─────┬─────────┐                          │
//!   │   │ A1  │free │    A3     │free │   A5    │                          │
//!   │   └─────┴─────┴───────────┴─────┴─────────┘                          │
//!   │     ▲                                     ▲                          │
//!   │     │                                     │                          │
//!   │   first                                Program                       │
//!   │   region                                Break                        │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   allocate: search free regions -> split if oversized -> else grow.
//!   release:  mark free -> merge every pair of neighbouring free regions.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   fitalloc
//!   ├── align      - Word alignment (align!, align_up)
//!   ├── region     - Region header layout (internal)
//!   ├── search     - First/best/worst/next-fit policies
//!   ├── source     - Heap sources: Sbrk, Arena
//!   ├── heap       - Heap: allocate, release, zero/resize allocate
//!   ├── stats      - Counters and the exit report
//!   ├── config     - HeapConfig and its environment variables
//!   ├── global     - Process-wide heap, FitAlloc
//!   └── ffi        - malloc/free/calloc/realloc (feature `c-abi`)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use fitalloc::{Arena, Heap, SearchMode};
//!
//! let mut heap = Heap::new(Arena::new(4096), SearchMode::BestFit);
//!
//! let ptr = heap.allocate(24).unwrap();
//! unsafe {
//!     ptr.as_ptr().write(42);
//!     heap.release(ptr.as_ptr());
//! }
//!
//! assert_eq!(heap.stats().allocations, 1);
//! ```
//!
//! ## How It Works
//!
//! Each region carries a header in front of its payload:
//!
//! ```text
//!   Single Region:
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Region Header      │         Payload                │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size: N         │  │  ┌──────────────────────────┐  │
//!   │  │ next: ptr/null  │  │  │                          │  │
//!   │  │ free: bool      │  │  │     N bytes usable       │  │
//!   │  └─────────────────┘  │  │                          │  │
//!   │      24 bytes         │  └──────────────────────────┘  │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! Splitting carves the unused tail of a reused region into a new free
//! region; releasing folds neighbouring free regions back together:
//!
//! ```text
//!   split (request R from free F):
//!   [H|      F free      ]  ->  [H| R used ][H| F-R-H free ]
//!
//!   coalesce:
//!   [H| a free ][H| b free ]  ->  [H|    a+H+b free     ]
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **Grow-only**: Memory is never returned to the OS
//! - **Word alignment**: Payloads are aligned to `size_of::<usize>()` only
//! - **Unix-only**: `Sbrk` requires `libc` (POSIX systems)
//!
//! ## Safety
//!
//! Releasing or resizing takes raw pointers; both are `unsafe` and require
//! the pointer to come from the same heap.

pub mod align;
pub mod config;
pub mod error;
#[cfg(feature = "c-abi")]
pub mod ffi;
pub mod global;
mod heap;
mod region;
mod search;
mod source;
mod stats;

pub use config::HeapConfig;
pub use error::{AllocError, AllocResult, HeapError, SourceError};
pub use global::{FitAlloc, allocate, release, resize_allocate, zero_allocate};
pub use heap::{Heap, SPLIT_SLACK};
pub use region::{HEADER_SIZE, RegionInfo};
pub use search::{SearchMode, UnknownSearchMode};
pub use source::{Arena, HeapSource, Sbrk};
pub use stats::Stats;
