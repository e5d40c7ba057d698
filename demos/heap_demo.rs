use std::{io::Read, ptr::NonNull};

use libc::sbrk;
use rchunk::{ChunkHeap, HeapConfig, MemoryProvider, SbrkProvider, config::CLEAN_FILL};

const NUM_PTRS: usize = 8;

/// Waits until the user presses ENTER when running with `--step`.
/// Useful when you want to inspect the process with `pmap` or `gdb`
/// between steps.
fn block_until_enter_pressed(step: bool) {
  if step {
    println!("\n>>> Press ENTER to continue...");
    let _ = std::io::stdin().bytes().next();
  }
}

/// Prints the current program break using `sbrk(0)`.
fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { sbrk(0) },
  );
}

fn print_heap(
  label: &str,
  heap: &ChunkHeap<SbrkProvider>,
) {
  println!("~~~~\nHEAP: ({label})");
  println!("region base = {:?}", heap.provider().base());
  print!("{}", heap.hex_dump());
  println!();
  print!("{}", heap.chunk_table());
  println!("~~~~");
}

fn allocate(
  heap: &mut ChunkHeap<SbrkProvider>,
  size: usize,
) -> *mut u8 {
  match heap.allocate(size) {
    Ok(ptr) => ptr.as_ptr(),
    Err(err) => {
      println!("allocate({size}) failed: {err}");
      std::ptr::null_mut()
    }
  }
}

fn main() {
  let step = std::env::args().any(|arg| arg == "--step");

  // Payloads are filled with 0xAA so fresh allocations stand out in the dump.
  let mut heap = ChunkHeap::with_sbrk(HeapConfig::default().with_fill(CLEAN_FILL));
  let mut ptrs = [std::ptr::null_mut::<u8>(); NUM_PTRS];

  print_program_break("start");
  block_until_enter_pressed(step);

  // --------------------------------------------------------------------
  // 1) A zero-sized allocation still gets a header-only chunk.
  // --------------------------------------------------------------------
  ptrs[0] = allocate(&mut heap, 0);
  print_heap("allocate(0)", &heap);
  heap.free(ptrs[0]);
  print_heap("free", &heap);
  block_until_enter_pressed(step);

  // --------------------------------------------------------------------
  // 2) Allocations of 0..8 bytes; odd sizes round up, growth kicks in
  //    once the first increment is used up.
  // --------------------------------------------------------------------
  for (i, slot) in ptrs.iter_mut().enumerate() {
    *slot = allocate(&mut heap, i);
    println!("ptr: {:?}, size: {}", *slot, i);
  }
  print_heap("after 8 allocations", &heap);
  print_program_break("after growth");
  block_until_enter_pressed(step);

  // --------------------------------------------------------------------
  // 3) Free one chunk and reuse it for a smaller request.
  // --------------------------------------------------------------------
  heap.free(ptrs[3]);
  print_heap("free ptrs[3]", &heap);
  ptrs[3] = allocate(&mut heap, 0);
  print_heap("allocate(0) into the hole", &heap);
  block_until_enter_pressed(step);

  // --------------------------------------------------------------------
  // 4) Free two neighbours; the next request fits the merged chunk.
  // --------------------------------------------------------------------
  heap.free(ptrs[3]);
  print_heap("free ptrs[3]", &heap);
  heap.free(ptrs[4]);
  print_heap("free ptrs[4]", &heap);
  ptrs[3] = allocate(&mut heap, 7);
  print_heap("allocate(7)", &heap);

  // Double frees are reported, not fatal.
  let outcome = heap.free(ptrs[4]);
  println!("second free of ptrs[4]: {outcome:?}");

  // --------------------------------------------------------------------
  // 5) Write through a payload pointer.
  // --------------------------------------------------------------------
  if let Some(value) = NonNull::new(allocate(&mut heap, size_of::<u16>())) {
    let value = value.cast::<u16>();
    unsafe { value.as_ptr().write_unaligned(0xABCD) };
    println!("{:?}: {:X}", value, unsafe { value.as_ptr().read_unaligned() });
    heap.free(value.as_ptr().cast());
  }

  println!("\n{:?}", heap.stats());
  println!("End of demo. The OS reclaims the region when the process exits.");
}
