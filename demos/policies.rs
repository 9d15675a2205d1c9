use fitalloc::{Arena, Heap, HeapSource, SearchMode};
use tracing_subscriber::EnvFilter;

/// Prints every region of the heap, one per line.
fn print_regions<S: HeapSource>(
  label: &str,
  heap: &Heap<S>,
) {
  println!("[{}] {} regions", label, heap.regions().count());
  for region in heap.regions() {
    println!(
      "    {:#x}  {:>5} bytes  {}",
      region.address,
      region.size,
      if region.free { "free" } else { "used" }
    );
  }
}

fn main() {
  // RUST_LOG=fitalloc=trace shows every split, growth and coalesce.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  for mode in SearchMode::ALL {
    println!("\n=== {mode} ===");

    let mut heap = Heap::new(Arena::new(64 * 1024), mode);
    assert_eq!(heap.mode(), mode);

    // --------------------------------------------------------------------
    // 1) Lay out regions of different sizes, separated by small ones so
    //    releasing the large ones leaves three non-adjacent holes.
    // --------------------------------------------------------------------
    let sizes = [64, 16, 256, 16, 128, 16];
    let ptrs: Vec<_> = sizes
      .iter()
      .map(|&size| heap.allocate(size).expect("arena is large enough"))
      .collect();

    unsafe {
      heap.release(ptrs[0].as_ptr());
      heap.release(ptrs[2].as_ptr());
      heap.release(ptrs[4].as_ptr());
    }
    print_regions("holes", &heap);

    // --------------------------------------------------------------------
    // 2) A 40 byte request: each policy picks a different hole, and the
    //    leftover is split off as a new free region.
    // --------------------------------------------------------------------
    let picked = heap.allocate(40).expect("a hole fits");
    assert!(heap.source().contains(picked.as_ptr()));
    println!(
      "\n[pick] 40 bytes -> {:p} ({} of {} arena bytes in use)",
      picked,
      heap.source().used(),
      heap.source().capacity()
    );
    print_regions("after pick", &heap);

    // --------------------------------------------------------------------
    // 3) Release everything; the list folds back into one free region.
    // --------------------------------------------------------------------
    unsafe {
      heap.release(picked.as_ptr());
      for (i, ptr) in ptrs.iter().enumerate() {
        if i % 2 == 1 {
          heap.release(ptr.as_ptr());
        }
      }
    }
    print_regions("all released", &heap);

    if let Err(err) = heap.check() {
      println!("heap damaged: {err}");
    }
    print!("{}", heap.stats());
  }
}
