use std::io::Read;

use rfreelist::{HEADER_SIZE, Heap};

/// Waits until the user presses ENTER, so the free list can be compared
/// between steps. Skipped when `WALKTHROUGH_NO_PAUSE` is set.
fn block_until_enter_pressed() {
  if std::env::var_os("WALKTHROUGH_NO_PAUSE").is_some() {
    return;
  }
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn show(
  label: &str,
  heap: &mut Heap,
) {
  println!(
    "[{}] {} free node(s), {} bytes available",
    label,
    heap.number_of_free_nodes(),
    heap.available_memory(),
  );
  heap.print_free_list();
}

fn main() {
  pretty_env_logger::init();

  let mut heap = Heap::new();
  show("start", &mut heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Two allocations carved off the front of the single free node.
  // --------------------------------------------------------------------
  let p1 = heap.allocate(100);
  let p2 = heap.allocate(200);
  println!("\n[1] p1 = {:?}, p2 = {:?}", p1, p2);
  show("1", &mut heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Release p1. It is pushed on the list head but cannot merge with the
  //    tail node, since p2 sits between them.
  // --------------------------------------------------------------------
  unsafe { heap.release(p1) };
  println!("\n[2] released p1");
  show("2", &mut heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) A small request reuses the block p1 vacated (first fit).
  // --------------------------------------------------------------------
  let p3 = heap.allocate(50);
  let start = p1 as usize - HEADER_SIZE;
  let reused = (start..p1 as usize + 100).contains(&(p3 as usize));
  println!("\n[3] p3 = {:?}, inside p1's old block? {}", p3, reused);
  show("3", &mut heap);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) A request larger than anything left returns null.
  // --------------------------------------------------------------------
  let too_big = heap.allocate(heap.capacity());
  println!("\n[4] allocate(capacity) = {:?}", too_big);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) Release everything and reset to a fresh region.
  // --------------------------------------------------------------------
  unsafe {
    heap.release(p3);
    heap.release(p2);
  }
  show("5", &mut heap);

  if let Err(err) = heap.reset() {
    eprintln!("reset failed: {err}");
    return;
  }
  show("reset", &mut heap);
}
