use core::ffi::CStr;

use crate::search::SearchMode;

/// Environment variable selecting the search policy of the process heap.
pub const SEARCH_ENV: &CStr = c"FITALLOC_SEARCH";
/// Environment variable that disables the exit report when set to `0`.
pub const STATS_ENV: &CStr = c"FITALLOC_STATS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
  pub mode: SearchMode,
  /// Print [`crate::Stats`] when the process exits (process heap only).
  pub report_at_exit: bool,
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self {
      mode: SearchMode::FirstFit,
      report_at_exit: true,
    }
  }
}

impl HeapConfig {
  pub fn with_mode(
    mut self,
    mode: SearchMode,
  ) -> Self {
    self.mode = mode;
    self
  }

  pub fn with_report(
    mut self,
    report_at_exit: bool,
  ) -> Self {
    self.report_at_exit = report_at_exit;
    self
  }

  /// Reads `FITALLOC_SEARCH` and `FITALLOC_STATS`.
  ///
  /// Goes through `getenv(3)` rather than `std::env` so it never allocates
  /// and can run before the process heap exists. Values that do not parse
  /// leave the default in place.
  ///
  /// # Safety
  ///
  /// `getenv` is not thread-safe; no other thread may modify the
  /// environment concurrently.
  pub unsafe fn from_env() -> Self {
    unsafe { Self::from_values(getenv_str(SEARCH_ENV), getenv_str(STATS_ENV)) }
  }

  /// Builds a config from raw `FITALLOC_SEARCH` / `FITALLOC_STATS` values.
  pub fn from_values(
    search: Option<&str>,
    stats: Option<&str>,
  ) -> Self {
    let mut config = Self::default();

    if let Some(mode) = search.and_then(|v| v.parse().ok()) {
      config.mode = mode;
    }
    if let Some(flag) = stats.and_then(parse_flag) {
      config.report_at_exit = flag;
    }

    config
  }
}

fn parse_flag(value: &str) -> Option<bool> {
  match value.trim() {
    "1" | "true" | "on" | "yes" => Some(true),
    "0" | "false" | "off" | "no" => Some(false),
    _ => None,
  }
}

/// # Safety
///
/// Calls `libc::getenv`.
unsafe fn getenv_str(key: &CStr) -> Option<&'static str> {
  let value = unsafe { libc::getenv(key.as_ptr()) };
  if value.is_null() {
    return None;
  }
  unsafe { CStr::from_ptr(value) }.to_str().ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = HeapConfig::default();
    assert_eq!(config.mode, SearchMode::FirstFit);
    assert!(config.report_at_exit);
  }

  #[test]
  fn test_builders() {
    let config = HeapConfig::default().with_mode(SearchMode::WorstFit).with_report(false);
    assert_eq!(config.mode, SearchMode::WorstFit);
    assert!(!config.report_at_exit);
  }

  #[test]
  fn test_parse_flag() {
    assert_eq!(parse_flag("0"), Some(false));
    assert_eq!(parse_flag(" on "), Some(true));
    assert_eq!(parse_flag("maybe"), None);
  }

  #[test]
  fn test_from_values() {
    let config = HeapConfig::from_values(Some("worst-fit"), Some("0"));
    assert_eq!(config.mode, SearchMode::WorstFit);
    assert!(!config.report_at_exit);

    let config = HeapConfig::from_values(Some("NEXT"), Some("yes"));
    assert_eq!(config.mode, SearchMode::NextFit);
    assert!(config.report_at_exit);

    assert_eq!(HeapConfig::from_values(None, None), HeapConfig::default());
  }

  #[test]
  fn test_bad_values_fall_back_to_defaults() {
    let config = HeapConfig::from_values(Some("buddy"), Some("sometimes"));
    assert_eq!(config, HeapConfig::default());

    let config = HeapConfig::from_values(Some("best"), Some(""));
    assert_eq!(config.mode, SearchMode::BestFit);
    assert!(config.report_at_exit);
  }

  #[test]
  fn test_unset_env_keeps_defaults() {
    let missing = c"FITALLOC_TEST_SURELY_UNSET";
    assert_eq!(unsafe { getenv_str(missing) }, None);
  }
}
