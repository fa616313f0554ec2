/// Result alias for every operation that may ask an allocator for memory.
pub type Result<T, E = AllocError> = std::result::Result<T, E>;

/// Failures reported by an allocator's `acquire`.
///
/// Element copy failures are not represented here: `Clone::clone` can only
/// fail by panicking, and that panic unwinds through the operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
  /// `count` elements of `elem_size` bytes do not fit in a valid layout.
  #[error("capacity overflow: {count} elements of {elem_size} bytes")]
  CapacityOverflow { count: usize, elem_size: usize },

  /// The memory system could not satisfy the request.
  #[error("out of memory: failed to acquire {bytes} bytes aligned to {align}")]
  OutOfMemory { bytes: usize, align: usize },

  /// A tracking budget rejected the request.
  #[error("allocation limit exceeded: requested {requested} bytes, {remaining} remaining")]
  LimitExceeded { requested: usize, remaining: usize },
}

impl AllocError {
  /// Byte count of the request that failed, when it is known.
  pub fn requested_bytes(&self) -> Option<usize> {
    match self {
      Self::CapacityOverflow { .. } => None,
      Self::OutOfMemory { bytes, .. } => Some(*bytes),
      Self::LimitExceeded { requested, .. } => Some(*requested),
    }
  }
}
