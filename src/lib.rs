//! # rfreelist - A First-Fit Free-List Allocator
//!
//! This crate provides a `malloc`/`free` style allocator over a single,
//! fixed-size memory region mapped directly from the OS with `mmap(2)`.
//!
//! ## Overview
//!
//! Free memory is tracked by a singly-linked list whose nodes live inside the
//! free memory itself:
//!
//! ```text
//!   Region (one anonymous mapping, never resized):
//!
//!   ┌────────┬──────────┬────────┬──────────┬────────┬──────────────────────┐
//!   │ Header │  A1 data │ Node   │  free    │ Header │ A2 data │ Node │ free │
//!   └────────┴──────────┴────────┴──────────┴────────┴──────────────────────┘
//!                         ▲   │                                 ▲
//!            head ────────┘   └──────────── next ───────────────┘
//!
//!   Allocation: first node (in list order) that fits, front is carved off.
//!   Release:    block is pushed on the list head, then merged forward.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rfreelist
//!   ├── align      - Rounding macro (align_to!)
//!   ├── error      - HeapError
//!   ├── heap       - Heap: allocate, release, reset, diagnostics
//!   ├── node       - FreeNode / AllocHeader layouts (internal)
//!   └── region     - mmap-backed region ownership (internal)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rfreelist::Heap;
//!
//! let mut heap = Heap::new();
//!
//! let ptr = heap.allocate(8) as *mut u64;
//! assert!(!ptr.is_null());
//!
//! unsafe {
//!     ptr.write_unaligned(42);
//!     assert_eq!(ptr.read_unaligned(), 42);
//!
//!     heap.release(ptr as *mut u8);
//! }
//!
//! assert_eq!(heap.number_of_free_nodes(), 1);
//! ```
//!
//! ## How It Works
//!
//! Every span of the region starts with one of two records occupying the
//! same bytes at different times:
//!
//! ```text
//!   Free span:                        Allocated span:
//!   ┌─────────────────┬──────────┐    ┌─────────────────┬──────────────┐
//!   │ FreeNode        │          │    │ AllocHeader     │              │
//!   │  size: N        │ N bytes  │    │  size: N        │ N bytes      │
//!   │  next: ptr/null │          │    │  magic: MAGIC   │ user data    │
//!   └─────────────────┴──────────┘    └─────────────────┴──────────────┘
//!                                                       ▲
//!                                                       └── returned pointer
//! ```
//!
//! Releasing a block turns its header back into a node, pushes it on the
//! head of the list, and merges it with each following node that starts
//! exactly where it ends. Blocks that are neighbours in memory but not in the
//! list stay separate.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: `Heap` is neither `Send` nor `Sync`
//! - **Fixed size**: the region never grows; a miss returns null
//! - **No alignment**: payloads start right after their header
//! - **Unix-only**: requires `libc` and `mmap`
//!
//! ## Safety
//!
//! Allocation is safe. Releasing takes a raw pointer and is `unsafe`: the
//! magic sentinel catches some bad pointers, not all of them.

pub mod align;
mod error;
mod heap;
mod node;
mod region;

pub use error::HeapError;
pub use heap::{FreeList, FreeSpan, HEAP_SIZE, Heap};
pub use node::{HEADER_SIZE, MAGIC, NODE_SIZE};
pub use region::page_size;
