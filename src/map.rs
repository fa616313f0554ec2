use std::{borrow::Borrow, fmt, mem};

use crate::{
  allocator::{Allocator, StdAllocator},
  error::Result,
  vec::AllocVec,
};

/// Storage type of an [`AllocMap`]. The map's allocator is rebound to it.
#[derive(Clone, Debug)]
struct Entry<K, V> {
  key: K,
  value: V,
}

/// Ordered dictionary that takes its memory from the same kind of allocator
/// an [`AllocVec`] does.
///
/// The allocator is given for key/value pairs, `(K, V)`, and rebound
/// internally to the map's own entry type. Entries live in a sorted
/// [`AllocVec`], so lookups are binary searches and every insertion of a new
/// key reallocates like a push.
pub struct AllocMap<K, V, A = StdAllocator<(K, V)>>
where
  A: Allocator<Value = (K, V)>,
{
  entries: AllocVec<Entry<K, V>, A::Rebind<Entry<K, V>>>,
}

impl<K: Ord, V> AllocMap<K, V> {
  pub fn new() -> Self {
    Self::new_in(StdAllocator::new())
  }
}

impl<K: Ord, V, A: Allocator<Value = (K, V)>> AllocMap<K, V, A> {
  pub fn new_in(alloc: A) -> Self {
    Self {
      entries: AllocVec::new_in(alloc.rebind()),
    }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn get<Q>(
    &self,
    key: &Q,
  ) -> Option<&V>
  where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
  {
    let index = self.search(key).ok()?;

    Some(&self.entries[index].value)
  }

  pub fn get_mut<Q>(
    &mut self,
    key: &Q,
  ) -> Option<&mut V>
  where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
  {
    let index = self.search(key).ok()?;

    Some(&mut self.entries[index].value)
  }

  pub fn contains_key<Q>(
    &self,
    key: &Q,
  ) -> bool
  where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
  {
    self.search(key).is_ok()
  }

  /// Entries in ascending key order.
  pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
    self.entries.iter().map(|entry| (&entry.key, &entry.value))
  }

  fn search<Q>(
    &self,
    key: &Q,
  ) -> std::result::Result<usize, usize>
  where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
  {
    self
      .entries
      .as_slice()
      .binary_search_by(|entry| entry.key.borrow().cmp(key))
  }
}

impl<K: Ord + Clone, V: Clone, A: Allocator<Value = (K, V)>> AllocMap<K, V, A> {
  /// Inserts or replaces the value for `key`.
  ///
  /// Replacing returns the old value and touches no storage. A new key is
  /// placed at its sorted position, reallocating the entry buffer.
  pub fn insert(
    &mut self,
    key: K,
    value: V,
  ) -> Result<Option<V>> {
    match self.search(&key) {
      Ok(index) => Ok(Some(mem::replace(&mut self.entries[index].value, value))),
      Err(index) => {
        self.entries.insert(index, Entry { key, value })?;
        Ok(None)
      }
    }
  }
}

impl<K: Ord, V, A: Allocator<Value = (K, V)> + Default> Default for AllocMap<K, V, A> {
  fn default() -> Self {
    Self::new_in(A::default())
  }
}

impl<K: Ord, V: PartialEq, A: Allocator<Value = (K, V)>> PartialEq for AllocMap<K, V, A> {
  fn eq(
    &self,
    other: &Self,
  ) -> bool {
    self.iter().eq(other.iter())
  }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug, A: Allocator<Value = (K, V)>> fmt::Debug
  for AllocMap<K, V, A>
{
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_map().entries(self.iter()).finish()
  }
}

/// One `key value` line per entry, in key order.
impl<K: Ord + fmt::Display, V: fmt::Display, A: Allocator<Value = (K, V)>> fmt::Display
  for AllocMap<K, V, A>
{
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    for (key, value) in self.iter() {
      writeln!(f, "{key} {value}")?;
    }

    Ok(())
  }
}
