//! An allocator that records what containers ask of it.

use std::{
  any,
  cell::{Cell, RefCell},
  fmt, mem,
  ptr::NonNull,
  rc::Rc,
};

use log::warn;

use crate::{
  allocator::Allocator,
  buffer::RawBuf,
  error::{AllocError, Result},
};

/// One call made on a [`TrackingAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocEvent {
  Acquire { elem: &'static str, count: usize },
  Release { elem: &'static str, count: usize },
  /// An acquire the budget refused.
  Rejected { elem: &'static str, count: usize },
  Construct { elem: &'static str },
  Destroy { elem: &'static str },
}

/// Event record shared by every clone and rebind of a tracking allocator.
#[derive(Debug, Default)]
pub struct Ledger {
  events: RefCell<Vec<AllocEvent>>,
  live_bytes: Cell<usize>,
  live_elements: Cell<usize>,
  limit: Option<usize>,
}

impl Ledger {
  pub fn events(&self) -> Vec<AllocEvent> {
    self.events.borrow().clone()
  }

  /// Forgets the recorded events. Live byte and element counts are kept.
  pub fn clear(&self) {
    self.events.borrow_mut().clear();
  }

  /// Element counts of every successful acquire, in call order.
  pub fn acquires(&self) -> Vec<usize> {
    self
      .events
      .borrow()
      .iter()
      .filter_map(|event| match event {
        AllocEvent::Acquire { count, .. } => Some(*count),
        _ => None,
      })
      .collect()
  }

  /// Element counts of every release, in call order.
  pub fn releases(&self) -> Vec<usize> {
    self
      .events
      .borrow()
      .iter()
      .filter_map(|event| match event {
        AllocEvent::Release { count, .. } => Some(*count),
        _ => None,
      })
      .collect()
  }

  pub fn constructs(&self) -> usize {
    self.count(|event| matches!(event, AllocEvent::Construct { .. }))
  }

  pub fn destroys(&self) -> usize {
    self.count(|event| matches!(event, AllocEvent::Destroy { .. }))
  }

  /// Elements constructed and not yet destroyed.
  pub fn live_elements(&self) -> usize {
    self.live_elements.get()
  }

  /// Bytes acquired and not yet released.
  pub fn live_bytes(&self) -> usize {
    self.live_bytes.get()
  }

  pub fn limit(&self) -> Option<usize> {
    self.limit
  }

  fn count(
    &self,
    pred: impl Fn(&AllocEvent) -> bool,
  ) -> usize {
    self.events.borrow().iter().filter(|event| pred(event)).count()
  }

  fn record(
    &self,
    event: AllocEvent,
  ) {
    self.events.borrow_mut().push(event);
  }
}

/// Wraps another allocator and writes every acquire, release, construct and
/// destroy into a shared [`Ledger`].
///
/// With a byte budget ([`TrackingAllocator::with_budget`]) an acquire that
/// would push the live byte count over the budget fails with
/// [`AllocError::LimitExceeded`] before reaching the inner allocator.
pub struct TrackingAllocator<A> {
  inner: A,
  ledger: Rc<Ledger>,
}

impl<A: Allocator> TrackingAllocator<A> {
  pub fn new(inner: A) -> Self {
    Self {
      inner,
      ledger: Rc::new(Ledger::default()),
    }
  }

  pub fn with_budget(
    inner: A,
    bytes: usize,
  ) -> Self {
    Self {
      inner,
      ledger: Rc::new(Ledger {
        limit: Some(bytes),
        ..Ledger::default()
      }),
    }
  }

  pub fn ledger(&self) -> Rc<Ledger> {
    Rc::clone(&self.ledger)
  }

  pub fn inner(&self) -> &A {
    &self.inner
  }

  fn elem() -> &'static str {
    any::type_name::<A::Value>()
  }

  fn bytes(count: usize) -> usize {
    count.saturating_mul(mem::size_of::<A::Value>())
  }
}

impl<A: Allocator> Allocator for TrackingAllocator<A> {
  type Value = A::Value;
  type Rebind<U> = TrackingAllocator<A::Rebind<U>>;

  fn rebind<U>(&self) -> Self::Rebind<U> {
    TrackingAllocator {
      inner: self.inner.rebind(),
      ledger: Rc::clone(&self.ledger),
    }
  }

  fn acquire(
    &self,
    count: usize,
  ) -> Result<RawBuf<Self::Value>> {
    let requested = Self::bytes(count);
    let live = self.ledger.live_bytes.get();

    if let Some(limit) = self.ledger.limit {
      let remaining = limit.saturating_sub(live);

      if requested > remaining {
        warn!("tracking: refused {requested} bytes, {remaining} of {limit} remaining");

        self.ledger.record(AllocEvent::Rejected {
          elem: Self::elem(),
          count,
        });

        return Err(AllocError::LimitExceeded {
          requested,
          remaining,
        });
      }
    }

    let buf = self.inner.acquire(count)?;

    self.ledger.live_bytes.set(live + requested);
    self.ledger.record(AllocEvent::Acquire {
      elem: Self::elem(),
      count,
    });

    Ok(buf)
  }

  unsafe fn release(
    &self,
    buf: RawBuf<Self::Value>,
  ) {
    let count = buf.capacity();
    let live = self.ledger.live_bytes.get();

    self.ledger.live_bytes.set(live.saturating_sub(Self::bytes(count)));
    self.ledger.record(AllocEvent::Release {
      elem: Self::elem(),
      count,
    });

    unsafe { self.inner.release(buf) }
  }

  unsafe fn construct(
    &self,
    slot: NonNull<Self::Value>,
    value: Self::Value,
  ) {
    let live = self.ledger.live_elements.get();
    self.ledger.live_elements.set(live + 1);
    self.ledger.record(AllocEvent::Construct { elem: Self::elem() });

    unsafe { self.inner.construct(slot, value) }
  }

  unsafe fn destroy(
    &self,
    slot: NonNull<Self::Value>,
  ) {
    let live = self.ledger.live_elements.get();
    self.ledger.live_elements.set(live.saturating_sub(1));
    self.ledger.record(AllocEvent::Destroy { elem: Self::elem() });

    unsafe { self.inner.destroy(slot) }
  }
}

impl<A: Clone> Clone for TrackingAllocator<A> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
      ledger: Rc::clone(&self.ledger),
    }
  }
}

/// Two tracking allocators are interchangeable when they write to the same
/// ledger.
impl<A: PartialEq> PartialEq for TrackingAllocator<A> {
  fn eq(
    &self,
    other: &Self,
  ) -> bool {
    Rc::ptr_eq(&self.ledger, &other.ledger) && self.inner == other.inner
  }
}

impl<A: fmt::Debug> fmt::Debug for TrackingAllocator<A> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("TrackingAllocator")
      .field("inner", &self.inner)
      .field("live_bytes", &self.ledger.live_bytes.get())
      .field("limit", &self.ledger.limit)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{AllocVec, MallocAllocator, StdAllocator};

  #[test]
  fn test_records_in_order() {
    let alloc = TrackingAllocator::new(StdAllocator::<u32>::new());
    let ledger = alloc.ledger();

    unsafe {
      let buf = alloc.acquire(2).unwrap();
      alloc.construct(buf.slot(0), 7);
      alloc.destroy(buf.slot(0));
      alloc.release(buf);
    }

    let elem = any::type_name::<u32>();
    assert_eq!(
      ledger.events(),
      vec![
        AllocEvent::Acquire { elem, count: 2 },
        AllocEvent::Construct { elem },
        AllocEvent::Destroy { elem },
        AllocEvent::Release { elem, count: 2 },
      ]
    );
    assert_eq!(ledger.live_bytes(), 0);
  }

  #[test]
  fn test_budget_refuses() {
    let alloc = TrackingAllocator::with_budget(MallocAllocator::<u64>::new(), 32);
    let ledger = alloc.ledger();

    let first = alloc.acquire(3).unwrap();
    assert_eq!(ledger.live_bytes(), 24);

    let err = alloc.acquire(2).unwrap_err();
    assert_eq!(
      err,
      AllocError::LimitExceeded {
        requested: 16,
        remaining: 8,
      }
    );

    unsafe { alloc.release(first) };

    let second = alloc.acquire(4).unwrap();
    assert_eq!(ledger.live_bytes(), 32);
    unsafe { alloc.release(second) };

    assert_eq!(ledger.acquires(), vec![3, 4]);
    assert_eq!(ledger.releases(), vec![3, 4]);
    assert_eq!(ledger.limit(), Some(32));
  }

  #[test]
  fn test_rebind_shares_ledger() {
    let alloc = TrackingAllocator::new(StdAllocator::<u8>::new());
    let wide = alloc.rebind::<u64>();

    let buf = wide.acquire(1).unwrap();
    unsafe { wide.release(buf) };

    assert_eq!(
      alloc.ledger().events()[0],
      AllocEvent::Acquire {
        elem: any::type_name::<u64>(),
        count: 1,
      }
    );
    assert_eq!(alloc, alloc.clone());
    assert_eq!(wide.inner(), &StdAllocator::<u64>::new());
    assert!(alloc != TrackingAllocator::new(StdAllocator::new()));
  }

  #[test]
  fn test_clear_keeps_live_counts() {
    let alloc = TrackingAllocator::new(StdAllocator::<String>::new());
    let ledger = alloc.ledger();

    let mut v = AllocVec::new_in(alloc);
    for word in ["x", "y", "z"] {
      v.push(word.to_string()).unwrap();
    }
    assert_eq!(ledger.live_elements(), 3);

    ledger.clear();
    drop(v);

    assert_eq!(ledger.destroys(), 3);
    assert_eq!(ledger.constructs(), 0);
    assert_eq!(ledger.live_elements(), 0);
    assert_eq!(ledger.live_bytes(), 0);
  }
}
