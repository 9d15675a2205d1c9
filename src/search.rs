//! Block search policies.
//!
//! Every policy answers the same question: which free region, if any,
//! should satisfy a request of `size` bytes. They differ in where they
//! start scanning and in which candidate they keep.
//!
//! ```text
//!   list:   [A 16 used] -> [B 64 free] -> [C 24 free] -> [D 128 free]
//!   request 20:
//!     first-fit  -> B   (first match from head)
//!     best-fit   -> C   (smallest match)
//!     worst-fit  -> D   (largest match)
//!     next-fit   -> depends on the previous allocation's region
//! ```

use core::{fmt, ptr, str::FromStr};

use thiserror::Error;

use crate::region::{Region, Walk};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
  #[default]
  FirstFit,
  BestFit,
  WorstFit,
  NextFit,
}

impl SearchMode {
  pub const ALL: [SearchMode; 4] = [
    SearchMode::FirstFit,
    SearchMode::BestFit,
    SearchMode::WorstFit,
    SearchMode::NextFit,
  ];

  pub fn name(self) -> &'static str {
    match self {
      SearchMode::FirstFit => "first",
      SearchMode::BestFit => "best",
      SearchMode::WorstFit => "worst",
      SearchMode::NextFit => "next",
    }
  }
}

impl fmt::Display for SearchMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{}-fit", self.name())
  }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown search mode, expected one of: first, best, worst, next")]
pub struct UnknownSearchMode;

impl FromStr for SearchMode {
  type Err = UnknownSearchMode;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let name = s.trim();
    let name = match name.len().checked_sub(4) {
      Some(at) if name.is_char_boundary(at) && name[at..].eq_ignore_ascii_case("-fit") => &name[..at],
      _ => name,
    };
    SearchMode::ALL
      .into_iter()
      .find(|mode| mode.name().eq_ignore_ascii_case(name))
      .ok_or(UnknownSearchMode)
  }
}

/// Result of one scan over the region list.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Search {
  /// Free region with at least the requested payload, or null.
  pub found: *mut Region,
  /// Last region the scan touched.
  pub last_visited: *mut Region,
}

/// # Safety
///
/// `region` must be a live region.
unsafe fn fits(
  region: *mut Region,
  size: usize,
) -> bool {
  unsafe { (*region).free && (*region).size >= size }
}

/// Scans the list starting at `head`.
///
/// `cursor` is only consulted by [`SearchMode::NextFit`]: the scan starts
/// at its successor and wraps to `head`.
///
/// # Safety
///
/// `head` and `cursor` must be null or live regions of one list.
pub(crate) unsafe fn search(
  head: *mut Region,
  cursor: *mut Region,
  size: usize,
  mode: SearchMode,
) -> Search {
  unsafe {
    match mode {
      SearchMode::FirstFit => first_fit(head, ptr::null_mut(), size),
      SearchMode::BestFit => full_scan(head, size, |candidate, kept| candidate < kept),
      SearchMode::WorstFit => full_scan(head, size, |candidate, kept| candidate > kept),
      SearchMode::NextFit => next_fit(head, cursor, size),
    }
  }
}

/// Walks from `start` until a fit is found or `stop` is reached.
///
/// # Safety
///
/// `start` must be null or a live region; `stop` null or further along.
unsafe fn first_fit(
  start: *mut Region,
  stop: *mut Region,
  size: usize,
) -> Search {
  let mut last_visited = ptr::null_mut();

  for region in Walk::from(start) {
    if region == stop {
      break;
    }
    last_visited = region;
    if unsafe { fits(region, size) } {
      return Search { found: region, last_visited };
    }
  }

  Search { found: ptr::null_mut(), last_visited }
}

/// Keeps the candidate for which `better(candidate_size, kept_size)` holds.
/// Ties keep the earlier region.
///
/// # Safety
///
/// `head` must be null or a live region.
unsafe fn full_scan(
  head: *mut Region,
  size: usize,
  better: impl Fn(usize, usize) -> bool,
) -> Search {
  let mut found: *mut Region = ptr::null_mut();
  let mut last_visited = ptr::null_mut();

  for region in Walk::from(head) {
    last_visited = region;
    if !unsafe { fits(region, size) } {
      continue;
    }
    if found.is_null() || unsafe { better((*region).size, (*found).size) } {
      found = region;
    }
  }

  Search { found, last_visited }
}

/// # Safety
///
/// `head` and `cursor` must be null or live regions of one list.
unsafe fn next_fit(
  head: *mut Region,
  cursor: *mut Region,
  size: usize,
) -> Search {
  let start = if cursor.is_null() {
    ptr::null_mut()
  } else {
    unsafe { (*cursor).next }
  };

  if start.is_null() {
    return unsafe { first_fit(head, ptr::null_mut(), size) };
  }

  let tail_pass = unsafe { first_fit(start, ptr::null_mut(), size) };
  if !tail_pass.found.is_null() {
    return tail_pass;
  }

  let wrapped = unsafe { first_fit(head, start, size) };
  if !wrapped.found.is_null() {
    return wrapped;
  }

  // Nothing fits anywhere; report the true tail seen by the first pass.
  Search {
    found: ptr::null_mut(),
    last_visited: tail_pass.last_visited,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::region::HEADER_SIZE;

  /// Lays regions out back to back in `buf` and links them.
  fn build(
    buf: &mut [usize],
    layout: &[(usize, bool)],
  ) -> Vec<*mut Region> {
    let mut at = buf.as_mut_ptr().cast::<u8>();
    let mut regions: Vec<*mut Region> = Vec::new();

    for &(size, free) in layout {
      let region = unsafe { Region::init(at, size, free, ptr::null_mut()) };
      if let Some(&prev) = regions.last() {
        unsafe { (*prev).next = region };
      }
      regions.push(region);
      at = unsafe { at.add(HEADER_SIZE + size) };
    }

    regions
  }

  #[test]
  fn test_policies_pick_expected_candidate() {
    let mut buf = [0usize; 128];
    let r = build(&mut buf, &[(16, false), (64, true), (24, true), (128, true), (24, true)]);

    let pick = |mode| unsafe { search(r[0], ptr::null_mut(), 20, mode) };

    assert_eq!(pick(SearchMode::FirstFit).found, r[1]);
    assert_eq!(pick(SearchMode::BestFit).found, r[2]);
    assert_eq!(pick(SearchMode::WorstFit).found, r[3]);
    assert_eq!(pick(SearchMode::NextFit).found, r[1]);
  }

  #[test]
  fn test_full_scans_visit_tail() {
    let mut buf = [0usize; 64];
    let r = build(&mut buf, &[(16, true), (32, false), (8, false)]);

    for mode in [SearchMode::BestFit, SearchMode::WorstFit] {
      let s = unsafe { search(r[0], ptr::null_mut(), 8, mode) };
      assert_eq!(s.found, r[0]);
      assert_eq!(s.last_visited, r[2]);
    }

    let s = unsafe { search(r[0], ptr::null_mut(), 8, SearchMode::FirstFit) };
    assert_eq!(s.found, r[0]);
    assert_eq!(s.last_visited, r[0]);
  }

  #[test]
  fn test_not_found_reports_tail() {
    let mut buf = [0usize; 64];
    let r = build(&mut buf, &[(16, true), (32, false), (8, true)]);

    for mode in SearchMode::ALL {
      let s = unsafe { search(r[0], r[1], 64, mode) };
      assert!(s.found.is_null(), "{mode}");
      assert_eq!(s.last_visited, r[2], "{mode}");
    }
  }

  #[test]
  fn test_next_fit_rotates_and_wraps() {
    let mut buf = [0usize; 128];
    let r = build(&mut buf, &[(32, true), (16, false), (32, true), (16, false)]);

    let after_first = unsafe { search(r[0], r[0], 32, SearchMode::NextFit) };
    assert_eq!(after_first.found, r[2]);

    let wrapped = unsafe { search(r[0], r[2], 32, SearchMode::NextFit) };
    assert_eq!(wrapped.found, r[0]);

    let from_tail = unsafe { search(r[0], r[3], 32, SearchMode::NextFit) };
    assert_eq!(from_tail.found, r[0]);
  }

  #[test]
  fn test_ties_keep_first_region() {
    let mut buf = [0usize; 128];
    let r = build(&mut buf, &[(32, true), (32, true), (48, true), (48, true)]);

    assert_eq!(unsafe { search(r[0], ptr::null_mut(), 8, SearchMode::BestFit) }.found, r[0]);
    assert_eq!(unsafe { search(r[0], ptr::null_mut(), 8, SearchMode::WorstFit) }.found, r[2]);
  }

  #[test]
  fn test_mode_parsing() {
    assert_eq!("first".parse(), Ok(SearchMode::FirstFit));
    assert_eq!("Best-Fit".parse(), Ok(SearchMode::BestFit));
    assert_eq!(" worst ".parse(), Ok(SearchMode::WorstFit));
    assert_eq!("next-fit".parse(), Ok(SearchMode::NextFit));
    assert_eq!("buddy".parse::<SearchMode>(), Err(UnknownSearchMode));
    assert_eq!(SearchMode::NextFit.to_string(), "next-fit");
  }
}
