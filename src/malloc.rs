use std::{alloc::Layout, fmt, marker::PhantomData, mem, ptr, ptr::NonNull};

use libc::{c_void, free, malloc, posix_memalign};
use log::trace;

use crate::{
  align_up,
  allocator::Allocator,
  buffer::{RawBuf, array_layout},
  error::{AllocError, Result},
};

/// Alignment every `malloc` result is guaranteed to have.
pub const MALLOC_ALIGN: usize = 2 * mem::size_of::<usize>();

/// The custom strategy: storage comes straight from the C heap.
///
/// Plain `malloc` serves every type whose alignment it already satisfies;
/// over-aligned types go through `posix_memalign`. Both are returned with
/// `free`.
pub struct MallocAllocator<T> {
  _marker: PhantomData<fn() -> T>,
}

impl<T> MallocAllocator<T> {
  pub const fn new() -> Self {
    Self {
      _marker: PhantomData,
    }
  }

  unsafe fn raw_alloc(layout: Layout) -> *mut c_void {
    if layout.align() <= MALLOC_ALIGN {
      return unsafe { malloc(layout.size()) };
    }

    // posix_memalign wants at least pointer alignment.
    let align = align_up!(layout.align(), mem::size_of::<usize>());
    let size = align_up!(layout.size(), align);

    let mut out: *mut c_void = ptr::null_mut();
    match unsafe { posix_memalign(&mut out, align, size) } {
      0 => out,
      _ => ptr::null_mut(),
    }
  }
}

impl<T> Allocator for MallocAllocator<T> {
  type Value = T;
  type Rebind<U> = MallocAllocator<U>;

  fn rebind<U>(&self) -> MallocAllocator<U> {
    MallocAllocator::new()
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

    let addr = unsafe { Self::raw_alloc(layout) };

    let ptr = NonNull::new(addr.cast::<T>()).ok_or(AllocError::OutOfMemory {
      bytes: layout.size(),
      align: layout.align(),
    })?;

    trace!(
      "malloc: acquired {} bytes for {} elements, address = {:?}",
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
    if buf.is_empty() || mem::size_of::<T>() == 0 {
      return;
    }

    trace!(
      "malloc: released {} elements, address = {:?}",
      buf.capacity(),
      buf.as_ptr()
    );

    unsafe { free(buf.as_ptr().as_ptr().cast()) }
  }
}

impl<T> Clone for MallocAllocator<T> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<T> Copy for MallocAllocator<T> {}

impl<T> Default for MallocAllocator<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> PartialEq for MallocAllocator<T> {
  fn eq(
    &self,
    _other: &Self,
  ) -> bool {
    true
  }
}

impl<T> Eq for MallocAllocator<T> {}

impl<T> fmt::Debug for MallocAllocator<T> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.write_str("MallocAllocator")
  }
}
