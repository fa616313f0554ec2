use std::collections::BTreeMap;

use rallocvec::{AllocMap, AllocVec, MallocAllocator, Result};

fn factorial(n: u64) -> u64 {
  (1..=n).product()
}

fn main() -> Result<()> {
  // RUST_LOG=trace shows every acquire/release the allocators make.
  env_logger::init();

  // --------------------------------------------------------------------
  // 1) The standard library's dictionary, factorials of 0..10.
  // --------------------------------------------------------------------
  let standard_map: BTreeMap<u64, u64> = (0..10).map(|i| (i, factorial(i))).collect();

  println!("Standard map values:");
  for (key, value) in &standard_map {
    println!("{key} {value}");
  }

  // --------------------------------------------------------------------
  // 2) The same sequence in two containers: one on the default
  //    allocator, one on the C heap. Contents must not differ.
  // --------------------------------------------------------------------
  let mut container = AllocVec::new();
  for i in 0..10 {
    container.push(i)?;
  }

  let mut custom_container = AllocVec::new_in(MallocAllocator::new());
  for i in 0..10 {
    custom_container.push(i)?;
  }

  println!("My container values:");
  println!("{container}");

  println!("My custom container with {} elements:", custom_container.len());
  println!("{custom_container}");

  assert_eq!(container, custom_container);

  // --------------------------------------------------------------------
  // 3) A dictionary on the custom allocator, factorials of 0..14.
  //    The allocator is given for (key, value) pairs and rebound to the
  //    map's entry storage.
  // --------------------------------------------------------------------
  let mut custom_dictionary = AllocMap::new_in(MallocAllocator::<(u64, u64)>::new());
  for i in 0..14 {
    custom_dictionary.insert(i, factorial(i))?;
  }

  println!(
    "My custom dictionary with {} elements (factorials):",
    custom_dictionary.len()
  );
  print!("{custom_dictionary}");

  Ok(())
}
