use std::{
  fmt,
  marker::PhantomData,
  ptr::{self, NonNull},
};

use log::{debug, error, trace};

use crate::{
  align_to,
  error::HeapError,
  node::{AllocHeader, FreeNode, HEADER_SIZE, MAGIC, NODE_SIZE},
  region::{self, Region},
};

/// Region size used by [`Heap::new`].
pub const HEAP_SIZE: usize = 4096;

/// A first-fit allocator over one fixed-size anonymous mapping.
///
/// The free list is threaded through the unused bytes of the region and is
/// kept in release order, not address order. The region is mapped on first
/// use and only replaced by [`Heap::reset`].
pub struct Heap {
  capacity: usize,
  region: Option<Region>,
  head: *mut FreeNode,
}

impl Heap {
  /// Creates an unmapped heap of [`HEAP_SIZE`] bytes.
  pub fn new() -> Self {
    Self {
      capacity: HEAP_SIZE,
      region: None,
      head: ptr::null_mut(),
    }
  }

  /// Creates an unmapped heap of at least `bytes` bytes, rounded up to whole
  /// OS pages.
  pub fn with_capacity(bytes: usize) -> Result<Self, HeapError> {
    if bytes == 0 {
      return Err(HeapError::ZeroCapacity);
    }

    let page = region::page_size();
    if bytes > usize::MAX - page {
      return Err(HeapError::CapacityOverflow { requested: bytes });
    }

    Ok(Self {
      capacity: align_to!(bytes, page),
      ..Self::new()
    })
  }

  /// Total size of the backing region in bytes.
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Maps the region if it is not mapped yet. The whole mapping becomes a
  /// single free node.
  pub fn heap(&mut self) -> Result<(), HeapError> {
    if self.region.is_some() {
      return Ok(());
    }

    let region = Region::map(self.capacity)?;
    let head = region.base().cast::<FreeNode>();

    unsafe { FreeNode::store(head, FreeNode::new(region.size() - NODE_SIZE, ptr::null_mut())) };

    self.head = head;
    self.region = Some(region);

    Ok(())
  }

  /// Unmaps the current region, if any, and maps a fresh one.
  ///
  /// Every pointer handed out before the reset dangles afterwards.
  pub fn reset(&mut self) -> Result<(), HeapError> {
    self.head = ptr::null_mut();

    if let Some(region) = self.region.take() {
      debug!("resetting heap at {:?}", region.base());
    }

    self.heap()
  }

  /// Read-only view of the free list, in list order.
  pub fn free_list(&mut self) -> FreeList<'_> {
    if let Err(err) = self.heap() {
      error!("free list unavailable: {err}");
    }

    FreeList {
      current: self.head,
      _heap: PhantomData,
    }
  }

  /// Free payload bytes, not counting node headers.
  pub fn available_memory(&mut self) -> usize {
    self.free_list().map(|span| span.size).sum()
  }

  pub fn number_of_free_nodes(&mut self) -> usize {
    self.free_list().count()
  }

  pub fn print_free_list(&mut self) {
    println!("{}", self.free_list());
  }

  /// First node able to hold `size` payload bytes plus a header, along with
  /// its predecessor (null when the node is the head).
  unsafe fn find_free(
    &self,
    size: usize,
  ) -> Option<(*mut FreeNode, *mut FreeNode)> {
    unsafe {
      let wanted = size.saturating_add(HEADER_SIZE);
      let mut previous: *mut FreeNode = ptr::null_mut();
      let mut current: *mut FreeNode = self.head;

      while !current.is_null() {
        let node = FreeNode::load(current);

        if node.size + NODE_SIZE >= wanted {
          trace!("find_free({size}): node {:?} of {} bytes", current, node.size);
          return Some((previous, current));
        }

        previous = current;
        current = node.next;
      }

      trace!("find_free({size}): no fit");
      None
    }
  }

  /// Carves `size` payload bytes plus a header off the front of
  /// `free_block` and relinks the list around what is left.
  unsafe fn split(
    &mut self,
    size: usize,
    previous: *mut FreeNode,
    free_block: *mut FreeNode,
  ) -> *mut AllocHeader {
    debug_assert!(!free_block.is_null(), "split needs a free node");

    unsafe {
      let original = FreeNode::load(free_block);
      let actual = size + HEADER_SIZE;
      let spare = original.size + NODE_SIZE - actual;

      let (successor, reserved) = if spare >= NODE_SIZE {
        let remainder = free_block.cast::<u8>().add(actual).cast::<FreeNode>();
        FreeNode::store(remainder, FreeNode::new(original.size - actual, original.next));
        (remainder, size)
      } else {
        // Too small for a node: the allocation keeps the spare bytes.
        (original.next, size + spare)
      };

      trace!(
        "split {:?}: {} + {} bytes reserved, {} bytes spare",
        free_block, HEADER_SIZE, reserved, spare
      );

      if previous.is_null() {
        self.head = successor;
      } else {
        FreeNode::link(previous, successor);
      }

      let header = free_block.cast::<AllocHeader>();
      AllocHeader::store(header, AllocHeader::new(reserved));

      header
    }
  }

  /// Allocates `size` bytes, reporting why when it cannot.
  pub fn try_allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, HeapError> {
    self.heap()?;

    unsafe {
      let (previous, free_block) = self
        .find_free(size)
        .ok_or(HeapError::OutOfMemory { requested: size })?;

      let header = self.split(size, previous, free_block);

      Ok(NonNull::new_unchecked(header.cast::<u8>().add(HEADER_SIZE)))
    }
  }

  /// Allocates `size` bytes and returns a pointer to the payload, or null
  /// when no free node is large enough.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> *mut u8 {
    match self.try_allocate(size) {
      Ok(address) => address.as_ptr(),
      Err(err @ HeapError::OutOfMemory { .. }) => {
        debug!("{err}");
        ptr::null_mut()
      }
      Err(err) => {
        error!("allocate({size}) failed: {err}");
        ptr::null_mut()
      }
    }
  }

  /// Merges list-adjacent nodes that are also contiguous in memory, walking
  /// forward from `free_block`.
  unsafe fn coalesce(free_block: *mut FreeNode) {
    unsafe {
      let mut current = free_block;

      while !current.is_null() {
        let mut node = FreeNode::load(current);

        if node.next.is_null() {
          break;
        }

        let end = current.cast::<u8>().add(NODE_SIZE + node.size);

        if end == node.next.cast::<u8>() {
          let absorbed = FreeNode::load(node.next);

          trace!("coalesce {:?} with {:?}", current, node.next);

          node.size += absorbed.size + NODE_SIZE;
          node.next = absorbed.next;
          FreeNode::store(current, node);
        } else {
          current = node.next;
        }
      }
    }
  }

  /// Locates and validates the header in front of `address`.
  unsafe fn find_header(
    &self,
    address: *mut u8,
  ) -> Result<*mut AllocHeader, HeapError> {
    let addr = address as usize;
    let header_addr = addr.wrapping_sub(HEADER_SIZE);

    let inside = self
      .region
      .as_ref()
      .is_some_and(|region| addr >= HEADER_SIZE && region.contains(header_addr, HEADER_SIZE));

    if !inside {
      return Err(HeapError::ForeignPointer { addr });
    }

    unsafe {
      let header = address.sub(HEADER_SIZE).cast::<AllocHeader>();
      let found = AllocHeader::load(header).magic;

      if found != MAGIC {
        return Err(HeapError::CorruptHeader {
          addr: header_addr,
          found,
        });
      }

      Ok(header)
    }
  }

  /// Returns `address` to the free list, reporting a bad pointer instead of
  /// aborting. The list is left untouched on error. Null is ignored.
  ///
  /// # Safety
  ///
  /// `address` must be null or come from [`Heap::allocate`] on this heap,
  /// since the last reset, and not have been released already. The sentinel
  /// check catches some violations, not all of them.
  pub unsafe fn try_release(
    &mut self,
    address: *mut u8,
  ) -> Result<(), HeapError> {
    if address.is_null() {
      return Ok(());
    }

    unsafe {
      let header = self.find_header(address)?;
      let size = AllocHeader::load(header).size;

      let freed = header.cast::<FreeNode>();
      FreeNode::store(freed, FreeNode::new(size, self.head));

      trace!("release {:?}: {} bytes", freed, size);

      Self::coalesce(freed);
      self.head = freed;
    }

    Ok(())
  }

  /// Returns `address` to the free list.
  ///
  /// # Safety
  ///
  /// Same contract as [`Heap::try_release`].
  ///
  /// # Panics
  ///
  /// When `address` lies outside the region or its header sentinel does not
  /// match; the free list can no longer be trusted at that point.
  pub unsafe fn release(
    &mut self,
    address: *mut u8,
  ) {
    if let Err(err) = unsafe { self.try_release(address) } {
      panic!("invalid release: {err}");
    }
  }
}

impl Default for Heap {
  fn default() -> Self {
    Self::new()
  }
}

/// One free node: where it starts and how many payload bytes follow it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeSpan {
  pub addr: usize,
  pub size: usize,
}

/// Iterator over the free list of a [`Heap`].
///
/// Displays as `Free(4080)->Free(16)`.
#[derive(Clone, Copy)]
pub struct FreeList<'a> {
  current: *const FreeNode,
  _heap: PhantomData<&'a Heap>,
}

impl Iterator for FreeList<'_> {
  type Item = FreeSpan;

  fn next(&mut self) -> Option<FreeSpan> {
    if self.current.is_null() {
      return None;
    }

    let node = unsafe { FreeNode::load(self.current) };
    let span = FreeSpan {
      addr: self.current as usize,
      size: node.size,
    };
    self.current = node.next;

    Some(span)
  }
}

impl fmt::Display for FreeList<'_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    for (i, span) in (*self).enumerate() {
      if i > 0 {
        f.write_str("->")?;
      }
      write!(f, "Free({})", span.size)?;
    }

    Ok(())
  }
}
