use std::{
  alloc::{Layout, handle_alloc_error},
  fmt,
  marker::PhantomData,
  mem,
  ops::{Index, IndexMut},
  slice,
};

use log::debug;

use crate::{
  allocator::{Allocator, StdAllocator},
  buffer::{BufGuard, RawBuf},
  error::{AllocError, Result},
};

/// A growable sequence whose every memory decision goes through `A`.
///
/// The buffer always holds exactly `len()` constructed elements. Growth
/// reallocates on every append: a push onto `n` elements acquires a buffer
/// of `n + 1`, copies the `n` elements into it, then destroys the old
/// elements and releases the old buffer. That makes `push` O(n), and keeps
/// the allocator traffic per push at one acquire and one release.
///
/// Operations that build a new buffer roll back on failure: if an acquire
/// fails or an element's `clone` panics, the slots built so far are
/// destroyed and the new buffer is released before the error surfaces.
///
/// Teardown gives no such guarantee: if an element's `Drop` panics while
/// the container is dropped or its old buffer is discarded, the elements
/// after it and the buffer itself are leaked, never released.
pub struct AllocVec<T, A: Allocator<Value = T> = StdAllocator<T>> {
  buf: RawBuf<T>,
  len: usize,
  alloc: A,
  _owns: PhantomData<T>,
}

unsafe impl<T: Send, A: Allocator<Value = T> + Send> Send for AllocVec<T, A> {}
unsafe impl<T: Sync, A: Allocator<Value = T> + Sync> Sync for AllocVec<T, A> {}

impl<T> AllocVec<T> {
  pub const fn new() -> Self {
    Self::new_in(StdAllocator::new())
  }
}

impl<T, A: Allocator<Value = T>> AllocVec<T, A> {
  /// An empty container. Nothing is acquired until the first insertion.
  pub const fn new_in(alloc: A) -> Self {
    Self {
      buf: RawBuf::empty(),
      len: 0,
      alloc,
      _owns: PhantomData,
    }
  }

  pub fn allocator(&self) -> &A {
    &self.alloc
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn as_slice(&self) -> &[T] {
    unsafe { slice::from_raw_parts(self.buf.as_ptr().as_ptr(), self.len) }
  }

  pub fn as_mut_slice(&mut self) -> &mut [T] {
    unsafe { slice::from_raw_parts_mut(self.buf.as_ptr().as_ptr(), self.len) }
  }

  pub fn iter(&self) -> slice::Iter<'_, T> {
    self.as_slice().iter()
  }

  pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
    self.as_mut_slice().iter_mut()
  }

  pub fn get(
    &self,
    index: usize,
  ) -> Option<&T> {
    self.as_slice().get(index)
  }

  pub fn get_mut(
    &mut self,
    index: usize,
  ) -> Option<&mut T> {
    self.as_mut_slice().get_mut(index)
  }

  /// # Safety
  ///
  /// `index` must be less than `len()`.
  pub unsafe fn get_unchecked(
    &self,
    index: usize,
  ) -> &T {
    unsafe { self.buf.slot(index).as_ref() }
  }

  /// # Safety
  ///
  /// `index` must be less than `len()`.
  pub unsafe fn get_unchecked_mut(
    &mut self,
    index: usize,
  ) -> &mut T {
    unsafe { self.buf.slot(index).as_mut() }
  }

  /// Destroys every element in ascending order, then releases the buffer
  /// sized at the element count. Leaves the container empty.
  fn teardown(&mut self) {
    let buf = mem::replace(&mut self.buf, RawBuf::empty());
    let len = mem::replace(&mut self.len, 0);

    unsafe {
      for i in 0..len {
        self.alloc.destroy(buf.slot(i));
      }
      self.alloc.release(buf);
    }
  }
}

impl<T: Clone, A: Allocator<Value = T>> AllocVec<T, A> {
  /// Copies `items` into a fresh buffer acquired from `alloc`.
  pub fn try_from_slice_in(
    items: &[T],
    alloc: A,
  ) -> Result<Self> {
    let buf = copy_into(&alloc, items)?.finish();

    Ok(Self {
      buf,
      len: items.len(),
      alloc,
      _owns: PhantomData,
    })
  }

  /// Copy construction: an independent container with the same contents,
  /// in a buffer of exactly `len()` elements.
  pub fn try_clone(&self) -> Result<Self> {
    Self::try_from_slice_in(self.as_slice(), self.alloc.clone())
  }

  /// Copy assignment.
  ///
  /// The current elements are destroyed and the current buffer released
  /// before the source is copied, so a failure leaves this container empty
  /// rather than with its previous contents.
  pub fn assign_from(
    &mut self,
    source: &Self,
  ) -> Result<()> {
    debug!("assigning {} elements over {}", source.len, self.len);

    self.teardown();
    self.alloc = source.alloc.clone();

    self.buf = copy_into(&self.alloc, source.as_slice())?.finish();
    self.len = source.len;

    Ok(())
  }

  /// Appends `value`, reallocating to exactly `len() + 1` elements.
  pub fn push(
    &mut self,
    value: T,
  ) -> Result<()> {
    self.insert(self.len, value)
  }

  /// Inserts `value` at `index`, shifting later elements right. Reallocates
  /// the same way [`AllocVec::push`] does.
  ///
  /// # Panics
  ///
  /// Panics if `index > len()`.
  pub fn insert(
    &mut self,
    index: usize,
    value: T,
  ) -> Result<()> {
    assert!(
      index <= self.len,
      "insertion index (is {index}) should be <= len (is {})",
      self.len
    );

    let old_len = self.len;
    let new_len = old_len.checked_add(1).ok_or(AllocError::CapacityOverflow {
      count: old_len,
      elem_size: mem::size_of::<T>(),
    })?;

    let mut grown = BufGuard::acquire(&self.alloc, new_len)?;
    let (head, tail) = self.as_slice().split_at(index);

    for item in head {
      grown.push(item.clone());
    }
    grown.push(value);
    for item in tail {
      grown.push(item.clone());
    }

    let grown = grown.finish();

    debug!("grew from {old_len} to {new_len} elements");

    self.teardown();
    self.buf = grown;
    self.len = new_len;

    Ok(())
  }
}

fn copy_into<'a, A: Allocator>(
  alloc: &'a A,
  items: &[A::Value],
) -> Result<BufGuard<'a, A>>
where
  A::Value: Clone,
{
  let mut guard = BufGuard::acquire(alloc, items.len())?;

  for item in items {
    guard.push(item.clone());
  }

  Ok(guard)
}

/// Reports a failed copy the way the standard collections do.
fn alloc_failure(err: AllocError) -> ! {
  if let AllocError::OutOfMemory { bytes, align } = err {
    if let Ok(layout) = Layout::from_size_align(bytes, align) {
      handle_alloc_error(layout);
    }
  }

  panic!("{err}");
}

impl<T, A: Allocator<Value = T>> Drop for AllocVec<T, A> {
  fn drop(&mut self) {
    self.teardown();
  }
}

impl<T: Clone, A: Allocator<Value = T>> Clone for AllocVec<T, A> {
  fn clone(&self) -> Self {
    match self.try_clone() {
      Ok(copy) => copy,
      Err(err) => alloc_failure(err),
    }
  }

  fn clone_from(
    &mut self,
    source: &Self,
  ) {
    if let Err(err) = self.assign_from(source) {
      alloc_failure(err);
    }
  }
}

impl<T, A: Allocator<Value = T> + Default> Default for AllocVec<T, A> {
  fn default() -> Self {
    Self::new_in(A::default())
  }
}

impl<T, A: Allocator<Value = T>> Index<usize> for AllocVec<T, A> {
  type Output = T;

  fn index(
    &self,
    index: usize,
  ) -> &T {
    &self.as_slice()[index]
  }
}

impl<T, A: Allocator<Value = T>> IndexMut<usize> for AllocVec<T, A> {
  fn index_mut(
    &mut self,
    index: usize,
  ) -> &mut T {
    &mut self.as_mut_slice()[index]
  }
}

impl<'a, T, A: Allocator<Value = T>> IntoIterator for &'a AllocVec<T, A> {
  type Item = &'a T;
  type IntoIter = slice::Iter<'a, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl<'a, T, A: Allocator<Value = T>> IntoIterator for &'a mut AllocVec<T, A> {
  type Item = &'a mut T;
  type IntoIter = slice::IterMut<'a, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter_mut()
  }
}

impl<T, A, B> PartialEq<AllocVec<T, B>> for AllocVec<T, A>
where
  T: PartialEq,
  A: Allocator<Value = T>,
  B: Allocator<Value = T>,
{
  fn eq(
    &self,
    other: &AllocVec<T, B>,
  ) -> bool {
    self.as_slice() == other.as_slice()
  }
}

impl<T: Eq, A: Allocator<Value = T>> Eq for AllocVec<T, A> {}

impl<T: fmt::Debug, A: Allocator<Value = T>> fmt::Debug for AllocVec<T, A> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_list().entries(self.iter()).finish()
  }
}

/// Elements left to right, separated by single spaces.
impl<T: fmt::Display, A: Allocator<Value = T>> fmt::Display for AllocVec<T, A> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    for (i, item) in self.iter().enumerate() {
      if i > 0 {
        f.write_str(" ")?;
      }
      write!(f, "{item}")?;
    }

    Ok(())
  }
}
