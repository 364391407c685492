use std::io;

use thiserror::Error;

use crate::node::MAGIC;

#[derive(Debug, Error)]
pub enum HeapError {
  #[error("out of memory: no free node can hold {requested} bytes")]
  OutOfMemory { requested: usize },

  #[error("failed to map the heap region: {0}")]
  Map(#[from] io::Error),

  #[error("heap capacity must be non-zero")]
  ZeroCapacity,

  #[error("heap capacity of {requested} bytes cannot be rounded to whole pages")]
  CapacityOverflow { requested: usize },

  #[error("pointer {addr:#x} was not handed out by this heap")]
  ForeignPointer { addr: usize },

  #[error("allocation header at {addr:#x} is corrupt: magic {found} != {expected}", expected = MAGIC)]
  CorruptHeader { addr: usize, found: u32 },
}
