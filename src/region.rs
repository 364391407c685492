//! Ownership of the single anonymous mapping backing a heap.

use std::{
  io,
  ptr::{self, NonNull},
};

use libc::{_SC_PAGESIZE, MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, mmap, munmap, sysconf};
use log::{debug, error};

use crate::error::HeapError;

/// Size of an OS page, in bytes.
pub fn page_size() -> usize {
  match unsafe { sysconf(_SC_PAGESIZE) } {
    size if size > 0 => size as usize,
    _ => 4096,
  }
}

/// A private, read/write anonymous mapping. Unmapped on drop.
pub(crate) struct Region {
  base: NonNull<u8>,
  size: usize,
}

impl Region {
  pub fn map(size: usize) -> Result<Self, HeapError> {
    let address = unsafe {
      mmap(
        ptr::null_mut(),
        size,
        PROT_READ | PROT_WRITE,
        MAP_ANONYMOUS | MAP_PRIVATE,
        -1,
        0,
      )
    };

    if address == MAP_FAILED {
      let err = io::Error::last_os_error();
      error!("mmap of {size} bytes failed: {err}");
      return Err(err.into());
    }

    let base = NonNull::new(address.cast::<u8>()).ok_or_else(|| io::Error::other("mmap returned a null address"))?;

    debug!("mapped {size} bytes at {:?}", base);

    Ok(Self { base, size })
  }

  pub fn base(&self) -> *mut u8 {
    self.base.as_ptr()
  }

  pub fn size(&self) -> usize {
    self.size
  }

  /// Whether `[addr, addr + len)` lies entirely inside the mapping.
  pub fn contains(
    &self,
    addr: usize,
    len: usize,
  ) -> bool {
    let start = self.base.as_ptr() as usize;

    addr >= start && addr.checked_add(len).is_some_and(|end| end <= start + self.size)
  }
}

impl Drop for Region {
  fn drop(&mut self) {
    let status = unsafe { munmap(self.base.as_ptr().cast(), self.size) };

    if status == 0 {
      debug!("unmapped {} bytes at {:?}", self.size, self.base);
    } else {
      error!("munmap at {:?} failed: {}", self.base, io::Error::last_os_error());
    }
  }
}
