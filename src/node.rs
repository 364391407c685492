//! The two record shapes that share the heap's bytes.
//!
//! A span of the region is either free, and starts with a [`FreeNode`], or
//! allocated, and starts with an [`AllocHeader`]. Requested sizes are never
//! rounded, so both records can sit at any byte offset: every access goes
//! through `read_unaligned`/`write_unaligned`.

use std::{mem, ptr};

/// Sentinel stamped into every allocation header and checked on release.
pub const MAGIC: u32 = 1234567;

/// Bytes taken by the header at the start of every free span.
pub const NODE_SIZE: usize = mem::size_of::<FreeNode>();

/// Bytes taken by the header in front of every payload pointer.
pub const HEADER_SIZE: usize = mem::size_of::<AllocHeader>();

// Release turns a header into a node in place and keeps its size field.
const _: () = assert!(NODE_SIZE == HEADER_SIZE);

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub(crate) struct FreeNode {
  /// Free payload bytes following this node, excluding the node itself.
  pub size: usize,
  pub next: *mut FreeNode,
}

impl FreeNode {
  pub fn new(
    size: usize,
    next: *mut FreeNode,
  ) -> Self {
    Self { size, next }
  }

  /// # Safety
  ///
  /// `at` must point to `NODE_SIZE` readable bytes inside the region.
  pub unsafe fn load(at: *const FreeNode) -> Self {
    unsafe { ptr::read_unaligned(at) }
  }

  /// # Safety
  ///
  /// `at` must point to `NODE_SIZE` writable bytes inside the region.
  pub unsafe fn store(
    at: *mut FreeNode,
    node: FreeNode,
  ) {
    unsafe { ptr::write_unaligned(at, node) }
  }

  /// Rewrites only the `next` link of the node at `at`.
  ///
  /// # Safety
  ///
  /// Same as [`FreeNode::store`].
  pub unsafe fn link(
    at: *mut FreeNode,
    next: *mut FreeNode,
  ) {
    unsafe {
      let node = Self::load(at);
      Self::store(at, Self { next, ..node });
    }
  }
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub(crate) struct AllocHeader {
  /// Payload bytes owned by the allocation, excluding the header.
  pub size: usize,
  pub magic: u32,
}

impl AllocHeader {
  pub fn new(size: usize) -> Self {
    Self { size, magic: MAGIC }
  }

  /// # Safety
  ///
  /// `at` must point to `HEADER_SIZE` readable bytes inside the region.
  pub unsafe fn load(at: *const AllocHeader) -> Self {
    unsafe { ptr::read_unaligned(at) }
  }

  /// # Safety
  ///
  /// `at` must point to `HEADER_SIZE` writable bytes inside the region.
  pub unsafe fn store(
    at: *mut AllocHeader,
    header: AllocHeader,
  ) {
    unsafe { ptr::write_unaligned(at, header) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_unaligned_round_trip() {
    let mut bytes = [0u8; 3 * NODE_SIZE];

    unsafe {
      let at = bytes.as_mut_ptr().add(3).cast::<FreeNode>();
      let next = bytes.as_mut_ptr().add(NODE_SIZE + 5).cast::<FreeNode>();

      FreeNode::store(at, FreeNode::new(77, next));
      let node = FreeNode::load(at);
      assert_eq!(node.size, 77);
      assert_eq!(node.next, next);

      FreeNode::link(at, ptr::null_mut());
      let node = FreeNode::load(at);
      assert_eq!(node.size, 77);
      assert!(node.next.is_null());
    }
  }

  #[test]
  fn test_header_overlays_node() {
    let mut bytes = [0u8; 2 * HEADER_SIZE];

    unsafe {
      let at = bytes.as_mut_ptr().add(1);

      AllocHeader::store(at.cast(), AllocHeader::new(42));
      let header = AllocHeader::load(at.cast());
      assert_eq!(header.size, 42);
      assert_eq!(header.magic, MAGIC);

      // The size field sits at the same offset in both shapes.
      assert_eq!(FreeNode::load(at.cast()).size, 42);
    }
  }
}
