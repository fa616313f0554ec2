use std::{alloc, fmt, marker::PhantomData, ptr, ptr::NonNull};

use log::trace;

use crate::{
  buffer::{RawBuf, array_layout},
  error::{AllocError, Result},
};

/// Where the storage of a container comes from, and how single elements
/// are built and torn down inside it.
///
/// Storage lifecycle (`acquire`/`release`) and element lifecycle
/// (`construct`/`destroy`) are separate: releasing never destroys, and
/// acquiring never constructs.
///
/// Implementations own no memory. Clones of an allocator are
/// interchangeable: storage acquired through one may be released through
/// any other.
pub trait Allocator: Clone {
  /// Element type this allocator hands out storage for.
  type Value;

  /// The same strategy, for elements of type `U`.
  type Rebind<U>: Allocator<Value = U>;

  fn rebind<U>(&self) -> Self::Rebind<U>;

  /// Acquires storage for exactly `count` elements, none constructed.
  ///
  /// `count == 0` yields [`RawBuf::empty`] without asking the memory
  /// system for anything.
  fn acquire(
    &self,
    count: usize,
  ) -> Result<RawBuf<Self::Value>>;

  /// Returns storage to the memory system. An empty descriptor is a no-op.
  ///
  /// # Safety
  ///
  /// `buf` must come from `acquire` on this allocator (or a clone of it),
  /// must not have been released already, and every element in it must
  /// have been destroyed.
  unsafe fn release(
    &self,
    buf: RawBuf<Self::Value>,
  );

  /// Builds one element in unconstructed storage.
  ///
  /// # Safety
  ///
  /// `slot` must point into acquired storage and must not hold a live
  /// element.
  unsafe fn construct(
    &self,
    slot: NonNull<Self::Value>,
    value: Self::Value,
  ) {
    unsafe { slot.as_ptr().write(value) }
  }

  /// Tears down one element in place, leaving the slot unconstructed.
  ///
  /// # Safety
  ///
  /// `slot` must hold a live element. Destroying the same slot twice
  /// without constructing in between is undefined behavior.
  unsafe fn destroy(
    &self,
    slot: NonNull<Self::Value>,
  ) {
    unsafe { ptr::drop_in_place(slot.as_ptr()) }
  }
}

/// The default strategy: Rust's global allocator.
pub struct StdAllocator<T> {
  _marker: PhantomData<fn() -> T>,
}

impl<T> StdAllocator<T> {
  pub const fn new() -> Self {
    Self {
      _marker: PhantomData,
    }
  }
}

impl<T> Allocator for StdAllocator<T> {
  type Value = T;
  type Rebind<U> = StdAllocator<U>;

  fn rebind<U>(&self) -> StdAllocator<U> {
    StdAllocator::new()
  }

  fn acquire(
    &self,
    count: usize,
  ) -> Result<RawBuf<T>> {
    if count == 0 {
      return Ok(RawBuf::empty());
    }

    let layout = array_layout::<T>(count)?;

    if layout.size() == 0 {
      return Ok(RawBuf::dangling(count));
    }

    let addr = unsafe { alloc::alloc(layout) };

    let ptr = NonNull::new(addr.cast::<T>()).ok_or(AllocError::OutOfMemory {
      bytes: layout.size(),
      align: layout.align(),
    })?;

    trace!(
      "std: acquired {} bytes for {} elements at {:?}",
      layout.size(),
      count,
      ptr
    );

    Ok(unsafe { RawBuf::from_raw_parts(ptr, count) })
  }

  unsafe fn release(
    &self,
    buf: RawBuf<T>,
  ) {
    let Ok(layout) = buf.layout() else {
      return;
    };

    if layout.size() == 0 {
      return;
    }

    trace!(
      "std: released {} bytes for {} elements at {:?}",
      layout.size(),
      buf.capacity(),
      buf.as_ptr()
    );

    unsafe { alloc::dealloc(buf.as_ptr().as_ptr().cast(), layout) }
  }
}

impl<T> Clone for StdAllocator<T> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<T> Copy for StdAllocator<T> {}

impl<T> Default for StdAllocator<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> PartialEq for StdAllocator<T> {
  fn eq(
    &self,
    _other: &Self,
  ) -> bool {
    true
  }
}

impl<T> Eq for StdAllocator<T> {}

impl<T> fmt::Debug for StdAllocator<T> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.write_str("StdAllocator")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_acquire_zero_is_empty() {
    let alloc = StdAllocator::<u64>::new();

    let buf = alloc.acquire(0).unwrap();

    assert!(buf.is_empty());
    unsafe { alloc.release(buf) };
  }

  #[test]
  fn test_construct_destroy() {
    let alloc = StdAllocator::<String>::new();

    let buf = alloc.acquire(3).unwrap();
    assert_eq!(buf.capacity(), 3);

    unsafe {
      for i in 0..3 {
        alloc.construct(buf.slot(i), format!("slot {i}"));
      }

      assert_eq!(buf.slot(2).as_ref(), "slot 2");

      for i in 0..3 {
        alloc.destroy(buf.slot(i));
      }
      alloc.release(buf);
    }
  }

  #[test]
  fn test_overflow_is_reported() {
    let alloc = StdAllocator::<u64>::new();

    let err = alloc.acquire(usize::MAX / 4).unwrap_err();

    assert!(matches!(err, AllocError::CapacityOverflow { .. }));
  }

  #[test]
  fn test_zero_sized_elements() {
    let alloc = StdAllocator::<()>::new();

    let buf = alloc.acquire(1000).unwrap();

    assert_eq!(buf.capacity(), 1000);
    unsafe { alloc.release(buf) };
  }

  #[test]
  fn test_rebind_is_interchangeable() {
    let alloc = StdAllocator::<u8>::new();
    let rebound: StdAllocator<(u32, u64)> = alloc.rebind();

    assert_eq!(rebound, StdAllocator::default());
    assert_eq!(alloc, alloc.clone());
  }
}
