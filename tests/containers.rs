use rallocvec::{
  AllocError, AllocEvent, AllocMap, AllocVec, Allocator, MallocAllocator, StdAllocator,
  TrackingAllocator,
};

#[test]
fn copy_then_append_leaves_original() {
  let mut a = AllocVec::new_in(MallocAllocator::new());
  for value in [1, 2, 3] {
    a.push(value).unwrap();
  }

  let mut b = a.clone();
  b.push(4).unwrap();

  assert_eq!(a.as_slice(), &[1, 2, 3]);
  assert_eq!(b.as_slice(), &[1, 2, 3, 4]);
}

#[test]
fn lifecycle_traffic_is_balanced() {
  let alloc = TrackingAllocator::new(MallocAllocator::<String>::new());
  let ledger = alloc.ledger();

  {
    let mut names = AllocVec::new_in(alloc.clone());
    for name in ["ada", "grace", "barbara"] {
      names.push(name.to_string()).unwrap();
    }

    let mut other = AllocVec::new_in(alloc);
    other.push("edsger".to_string()).unwrap();
    other.assign_from(&names).unwrap();

    assert_eq!(other, names);
  }

  let events = ledger.events();
  let acquired = events
    .iter()
    .filter(|event| matches!(event, AllocEvent::Acquire { .. }))
    .count();
  let released = events
    .iter()
    .filter(|event| matches!(event, AllocEvent::Release { .. }))
    .count();

  // Every acquire is released once, plus one empty release for the first
  // push into each container.
  assert_eq!(acquired, 5);
  assert_eq!(released, acquired + 2);
  assert_eq!(ledger.live_elements(), 0);
  assert_eq!(ledger.live_bytes(), 0);
}

#[test]
fn exhausted_budget_surfaces_error() {
  let alloc = TrackingAllocator::with_budget(StdAllocator::<[u8; 64]>::new(), 100);
  let mut blocks = AllocVec::new_in(alloc);

  blocks.push([0; 64]).unwrap();
  let err = blocks.push([1; 64]).unwrap_err();

  assert_eq!(
    err,
    AllocError::LimitExceeded {
      requested: 128,
      remaining: 36,
    }
  );
  assert_eq!(blocks.len(), 1);
  assert_eq!(blocks[0], [0; 64]);
}

#[test]
fn dictionary_of_factorials() {
  let mut factorials = AllocMap::new_in(MallocAllocator::<(u64, u64)>::new());

  let mut acc = 1u64;
  for i in 0..14u64 {
    if i > 0 {
      acc *= i;
    }
    factorials.insert(i, acc).unwrap();
  }

  assert_eq!(factorials.len(), 14);
  assert_eq!(factorials.get(&13), Some(&6_227_020_800));
  assert_eq!(factorials.iter().next(), Some((&0, &1)));
}

#[test]
fn custom_allocator_rebinds() {
  let ints = MallocAllocator::<i32>::new();
  let pairs = ints.rebind::<(i32, i32)>();

  let mut v = AllocVec::new_in(pairs);
  v.push((1, 2)).unwrap();

  assert_eq!(v.get(0), Some(&(1, 2)));
  assert_eq!(v.get(1), None);
}
