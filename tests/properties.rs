//! Property tests for heap invariants under arbitrary operation sequences.

use fitalloc::{
  Arena, HEADER_SIZE, Heap, SPLIT_SLACK, SearchMode,
  align::{ALIGNMENT, align_up},
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
  Allocate(usize),
  Release(usize),
  Resize(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
  prop_oneof![
    (1usize..200).prop_map(Op::Allocate),
    any::<usize>().prop_map(Op::Release),
    (any::<usize>(), 1usize..300).prop_map(|(i, size)| Op::Resize(i, size)),
  ]
}

fn mode() -> impl Strategy<Value = SearchMode> {
  prop_oneof![
    Just(SearchMode::FirstFit),
    Just(SearchMode::BestFit),
    Just(SearchMode::WorstFit),
    Just(SearchMode::NextFit),
  ]
}

/// A live allocation and the byte it was filled with.
struct Live {
  ptr: *mut u8,
  len: usize,
  fill: u8,
}

fn fill(live: &Live) {
  unsafe { std::ptr::write_bytes(live.ptr, live.fill, live.len) };
}

fn intact(live: &Live) -> bool {
  let bytes = unsafe { std::slice::from_raw_parts(live.ptr, live.len) };
  bytes.iter().all(|&b| b == live.fill)
}

// ---------------------------------------------------------------------------
// Property: the list stays well formed and live data is never clobbered
// ---------------------------------------------------------------------------

proptest! {
  #![proptest_config(ProptestConfig::with_cases(64))]

  #[test]
  fn random_ops_keep_heap_consistent(
    mode in mode(),
    ops in proptest::collection::vec(op(), 1..120),
  ) {
    let mut heap = Heap::new(Arena::new(256 * 1024), mode);
    let mut live: Vec<Live> = Vec::new();
    let mut next_fill = 1u8;

    for op in ops {
      match op {
        Op::Allocate(size) => {
          let ptr = heap.allocate(size).unwrap();
          let entry = Live { ptr: ptr.as_ptr(), len: size, fill: next_fill };
          fill(&entry);
          live.push(entry);
        }
        Op::Release(i) if !live.is_empty() => {
          let entry = live.swap_remove(i % live.len());
          unsafe { heap.release(entry.ptr) };

          let regions: Vec<_> = heap.regions().collect();
          for pair in regions.windows(2) {
            prop_assert!(!(pair[0].free && pair[1].free));
          }
        }
        Op::Resize(i, size) if !live.is_empty() => {
          let idx = i % live.len();
          let old = &live[idx];
          let kept = old.len.min(size);
          let ptr = unsafe { heap.resize_allocate(old.ptr, size) }.unwrap().unwrap();

          let entry = Live { ptr: ptr.as_ptr(), len: kept, fill: old.fill };
          prop_assert!(intact(&entry));

          live[idx] = Live { ptr: ptr.as_ptr(), len: size, fill: next_fill };
          fill(&live[idx]);
        }
        _ => {}
      }

      next_fill = next_fill.wrapping_add(1).max(1);
      prop_assert!(heap.check().is_ok());
      for entry in &live {
        prop_assert!(intact(entry));
      }
    }

    let stats = heap.stats();
    prop_assert_eq!(stats.reuses + stats.growths, stats.allocations);
    prop_assert_eq!(stats.regions, stats.growths);
  }

  #[test]
  fn split_leaves_exact_remainder(
    mode in mode(),
    free_words in 1usize..64,
    request in 1usize..512,
  ) {
    let free_size = free_words * ALIGNMENT;
    prop_assume!(request <= free_size);

    let mut heap = Heap::new(Arena::new(16 * 1024), mode);
    let region = heap.allocate(free_size).unwrap();
    let _guard = heap.allocate(8).unwrap();
    unsafe { heap.release(region.as_ptr()) };

    let got = heap.allocate(request).unwrap();
    prop_assert_eq!(got, region);

    let request = align_up(request).unwrap();
    let regions: Vec<_> = heap.regions().map(|r| (r.size, r.free)).collect();

    if free_size - request > HEADER_SIZE + SPLIT_SLACK {
      prop_assert_eq!(heap.stats().splits, 1);
      prop_assert_eq!(regions.len(), 3);
      prop_assert_eq!(regions[0], (request, false));
      prop_assert_eq!(regions[1], (free_size - request - HEADER_SIZE, true));
    } else {
      prop_assert_eq!(heap.stats().splits, 0);
      prop_assert_eq!(regions[0], (free_size, false));
    }
  }

  #[test]
  fn zero_allocate_returns_zeroed_bytes(
    mode in mode(),
    count in 1usize..32,
    element_size in 1usize..32,
  ) {
    let mut heap = Heap::new(Arena::new(16 * 1024), mode);

    let dirty = heap.allocate(count * element_size).unwrap();
    unsafe {
      std::ptr::write_bytes(dirty.as_ptr(), 0xFF, count * element_size);
      heap.release(dirty.as_ptr());
    }

    let ptr = heap.zero_allocate(count, element_size).unwrap();
    let bytes = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), heap.payload_size(ptr)) };
    prop_assert!(bytes.iter().all(|&b| b == 0));
  }

  #[test]
  fn growing_resize_preserves_prefix(
    mode in mode(),
    data in proptest::collection::vec(any::<u8>(), 1..128),
    extra in 1usize..256,
  ) {
    let mut heap = Heap::new(Arena::new(16 * 1024), mode);

    let ptr = heap.allocate(data.len()).unwrap();
    unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.as_ptr(), data.len()) };
    let _neighbour = heap.allocate(8).unwrap();

    let resized = unsafe { heap.resize_allocate(ptr.as_ptr(), data.len() + extra) }.unwrap().unwrap();
    let bytes = unsafe { std::slice::from_raw_parts(resized.as_ptr(), data.len()) };

    prop_assert_eq!(bytes, data.as_slice());
  }
}
