use std::{alloc::Layout, fmt, mem, ptr::NonNull};

use crate::{
  allocator::Allocator,
  error::{AllocError, Result},
};

/// Layout of `count` contiguous `T`s.
pub fn array_layout<T>(count: usize) -> Result<Layout> {
  Layout::array::<T>(count).map_err(|_| AllocError::CapacityOverflow {
    count,
    elem_size: mem::size_of::<T>(),
  })
}

/// Descriptor of storage acquired from an allocator: where it starts and
/// how many `T` slots it holds.
///
/// A descriptor does not own anything by itself. Whoever holds it is
/// responsible for handing it back to the allocator it came from.
pub struct RawBuf<T> {
  ptr: NonNull<T>,
  cap: usize,
}

impl<T> RawBuf<T> {
  /// The null descriptor: no storage, capacity 0.
  pub const fn empty() -> Self {
    Self {
      ptr: NonNull::dangling(),
      cap: 0,
    }
  }

  /// Storage that never touched the memory system (zero-sized `T`).
  pub(crate) const fn dangling(cap: usize) -> Self {
    Self {
      ptr: NonNull::dangling(),
      cap,
    }
  }

  /// # Safety
  ///
  /// `ptr` must be valid for reads and writes of `cap` elements of `T`
  /// and must have been acquired from the allocator this descriptor will
  /// be released to.
  pub unsafe fn from_raw_parts(
    ptr: NonNull<T>,
    cap: usize,
  ) -> Self {
    Self { ptr, cap }
  }

  pub fn as_ptr(&self) -> NonNull<T> {
    self.ptr
  }

  pub fn capacity(&self) -> usize {
    self.cap
  }

  pub fn is_empty(&self) -> bool {
    self.cap == 0
  }

  /// Layout this storage was acquired with.
  pub fn layout(&self) -> Result<Layout> {
    array_layout::<T>(self.cap)
  }

  /// Pointer to slot `index`.
  ///
  /// # Safety
  ///
  /// `index` must be less than the capacity.
  pub unsafe fn slot(
    &self,
    index: usize,
  ) -> NonNull<T> {
    debug_assert!(index < self.cap);
    unsafe { self.ptr.add(index) }
  }
}

impl<T> Clone for RawBuf<T> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<T> Copy for RawBuf<T> {}

impl<T> fmt::Debug for RawBuf<T> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("RawBuf")
      .field("ptr", &self.ptr)
      .field("cap", &self.cap)
      .finish()
  }
}

/// A buffer under construction.
///
/// Slots are filled front to back. Until [`BufGuard::finish`] is called the
/// guard owns both the storage and the elements built so far: dropping it
/// (on an early return or while unwinding out of a panicking `clone`)
/// destroys exactly the constructed slots and releases the storage.
pub(crate) struct BufGuard<'a, A: Allocator> {
  alloc: &'a A,
  buf: RawBuf<A::Value>,
  len: usize,
}

impl<'a, A: Allocator> BufGuard<'a, A> {
  pub(crate) fn acquire(
    alloc: &'a A,
    cap: usize,
  ) -> Result<Self> {
    let buf = alloc.acquire(cap)?;

    Ok(Self { alloc, buf, len: 0 })
  }

  /// Constructs `value` in the next unconstructed slot.
  pub(crate) fn push(
    &mut self,
    value: A::Value,
  ) {
    assert!(self.len < self.buf.capacity(), "buffer guard overfilled");

    unsafe { self.alloc.construct(self.buf.slot(self.len), value) };
    self.len += 1;
  }

  /// Hands the filled storage over to the caller.
  pub(crate) fn finish(self) -> RawBuf<A::Value> {
    debug_assert_eq!(self.len, self.buf.capacity());

    let buf = self.buf;
    mem::forget(self);
    buf
  }
}

impl<A: Allocator> Drop for BufGuard<'_, A> {
  fn drop(&mut self) {
    unsafe {
      for i in 0..self.len {
        self.alloc.destroy(self.buf.slot(i));
      }
      self.alloc.release(self.buf);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{StdAllocator, TrackingAllocator};

  #[test]
  fn test_empty_descriptor() {
    let buf = RawBuf::<u64>::empty();

    assert!(buf.is_empty());
    assert_eq!(buf.capacity(), 0);
    assert_eq!(buf.layout().unwrap().size(), 0);
  }

  #[test]
  fn test_layout_overflow() {
    let err = array_layout::<u64>(usize::MAX).unwrap_err();

    assert_eq!(
      err,
      AllocError::CapacityOverflow {
        count: usize::MAX,
        elem_size: 8,
      }
    );
  }

  #[test]
  fn test_guard_finish_keeps_elements() {
    let alloc = StdAllocator::<String>::new();
    let mut guard = BufGuard::acquire(&alloc, 2).unwrap();

    guard.push("a".to_string());
    guard.push("b".to_string());

    let buf = guard.finish();

    unsafe {
      assert_eq!(buf.slot(0).as_ref(), "a");
      assert_eq!(buf.slot(1).as_ref(), "b");

      alloc.destroy(buf.slot(0));
      alloc.destroy(buf.slot(1));
      alloc.release(buf);
    }
  }

  #[test]
  fn test_guard_drop_rolls_back() {
    let alloc = TrackingAllocator::new(StdAllocator::<u32>::new());
    let ledger = alloc.ledger();

    {
      let mut guard = BufGuard::acquire(&alloc, 3).unwrap();
      guard.push(1);
      guard.push(2);
    }

    assert_eq!(ledger.acquires(), vec![3]);
    assert_eq!(ledger.constructs(), 2);
    assert_eq!(ledger.destroys(), 2);
    assert_eq!(ledger.releases(), vec![3]);
    assert_eq!(ledger.live_bytes(), 0);
  }
}
