use thiserror::Error;

/// Why an allocation produced no address.
///
/// The process-wide entry points collapse every variant into a null
/// pointer; only [`crate::Heap`] callers can tell them apart.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
  #[error("zero-size request")]
  ZeroSize,

  #[error("requested size overflows usize")]
  Overflow,

  #[error("out of memory: heap could not grow by {requested} bytes")]
  OutOfMemory { requested: usize },
}

/// Failure reported by a [`crate::HeapSource`] when asked to extend.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceError {
  #[error("arena exhausted: {requested} bytes requested, {remaining} remaining")]
  Exhausted { requested: usize, remaining: usize },

  #[error("operating system refused to move the program break")]
  Refused,
}

/// Structural damage found by [`crate::Heap::check`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
  #[error("region at 0x{at:x} is not contiguous with its successor at 0x{next:x}")]
  Gap { at: usize, next: usize },

  #[error("adjacent free regions at 0x{first:x} and 0x{second:x}")]
  UncoalescedFree { first: usize, second: usize },

  #[error("tracked tail 0x{tracked:x} differs from list tail 0x{actual:x}")]
  TailMismatch { tracked: usize, actual: usize },
}

pub type AllocResult<T> = Result<T, AllocError>;
