//! # rallocvec - Containers on Pluggable Allocators
//!
//! This crate separates **where memory comes from** from **what lives in
//! it**. Containers never call the memory system directly; every request
//! goes through an [`Allocator`] value the container was built with.
//!
//! ## Overview
//!
//! ```text
//!   Allocator contract:
//!
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │  storage lifecycle            element lifecycle                  │
//!   │                                                                  │
//!   │  acquire(n) ──► RawBuf ──► construct(slot, value)  × n           │
//!   │                   │                                              │
//!   │                   │        destroy(slot)           × n           │
//!   │  release(buf) ◄───┘                                              │
//!   │                                                                  │
//!   │  rebind::<U>() ──► same strategy, element type U                 │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rallocvec
//!   ├── align      - align_up! macro
//!   ├── allocator  - Allocator trait, StdAllocator (global allocator)
//!   ├── buffer     - RawBuf descriptor and the rollback guard (internal)
//!   ├── error      - AllocError
//!   ├── malloc     - MallocAllocator (C heap through libc)
//!   ├── map        - AllocMap, a sorted dictionary on an allocator
//!   ├── tracking   - TrackingAllocator and its Ledger
//!   └── vec        - AllocVec, the growable sequence
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rallocvec::{AllocVec, MallocAllocator};
//!
//! let mut values = AllocVec::new_in(MallocAllocator::new());
//!
//! for i in 0..10 {
//!     values.push(i)?;
//! }
//!
//! assert_eq!(values.len(), 10);
//! assert_eq!(values.to_string(), "0 1 2 3 4 5 6 7 8 9");
//! # Ok::<(), rallocvec::AllocError>(())
//! ```
//!
//! ## How Growth Works
//!
//! [`AllocVec`] keeps exactly as many slots as it has elements. Every push
//! builds a new buffer one slot larger:
//!
//! ```text
//!   push(x) on [a b c]:
//!
//!   old  ┌───┬───┬───┐
//!        │ a │ b │ c │ ──── clone ────┐
//!        └───┴───┴───┘                ▼
//!   new  ┌───┬───┬───┬───┐      acquire(4)
//!        │ a'│ b'│ c'│ x │      construct × 4
//!        └───┴───┴───┴───┘
//!
//!   then: destroy a, b, c; release(old, 3)
//! ```
//!
//! Each push is O(n) and costs exactly one `acquire(n + 1)` and one
//! `release(n)`. If an acquire fails or a `clone` panics midway, the
//! partially built buffer is torn down and the container keeps its
//! previous contents.
//!
//! ## Limitations
//!
//! - **Single-threaded allocators**: [`TrackingAllocator`] shares its ledger
//!   through `Rc`
//! - **Unix-only**: [`MallocAllocator`] needs `posix_memalign` from `libc`
//!   for over-aligned types
//!
//! ## Safety
//!
//! Implementing [`Allocator`] is safe, but `release`, `construct` and
//! `destroy` are `unsafe` to call: the caller vouches for the state of the
//! storage it passes in. The containers in this crate uphold those contracts
//! and expose a safe API.

pub mod align;
mod allocator;
mod buffer;
mod error;
mod malloc;
mod map;
mod tracking;
mod vec;

pub use allocator::{Allocator, StdAllocator};
pub use buffer::{RawBuf, array_layout};
pub use error::{AllocError, Result};
pub use malloc::{MALLOC_ALIGN, MallocAllocator};
pub use map::AllocMap;
pub use tracking::{AllocEvent, Ledger, TrackingAllocator};
pub use vec::AllocVec;
