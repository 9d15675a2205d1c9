use core::fmt;

/// Counters kept by every [`crate::Heap`]. They only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
  pub allocations: u64,
  pub releases: u64,
  /// Allocations served from an existing free region.
  pub reuses: u64,
  pub growths: u64,
  pub splits: u64,
  pub coalesces: u64,
  /// Regions created by growth.
  pub regions: u64,
  /// Sum of the (aligned) sizes of successful requests.
  pub requested_bytes: u64,
  /// Bytes obtained from the heap source, headers included.
  pub heap_bytes: u64,
}

impl Stats {
  pub(crate) fn record_allocation(
    &mut self,
    size: usize,
    reused: bool,
  ) {
    self.allocations += 1;
    self.requested_bytes += size as u64;
    if reused {
      self.reuses += 1;
    }
  }

  pub(crate) fn record_growth(
    &mut self,
    increment: usize,
  ) {
    self.growths += 1;
    self.regions += 1;
    self.heap_bytes += increment as u64;
  }
}

impl fmt::Display for Stats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "\nheap management statistics")?;
    writeln!(f, "mallocs:\t{}", self.allocations)?;
    writeln!(f, "frees:\t\t{}", self.releases)?;
    writeln!(f, "reuses:\t\t{}", self.reuses)?;
    writeln!(f, "grows:\t\t{}", self.growths)?;
    writeln!(f, "splits:\t\t{}", self.splits)?;
    writeln!(f, "coalesces:\t{}", self.coalesces)?;
    writeln!(f, "blocks:\t\t{}", self.regions)?;
    writeln!(f, "requested:\t{}", self.requested_bytes)?;
    writeln!(f, "max heap:\t{}", self.heap_bytes)
  }
}
