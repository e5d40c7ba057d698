//! Sources of raw heap memory.
//!
//! A provider owns one contiguous region that only ever grows at its top.
//! The heap addresses the region by byte offset from [`MemoryProvider::base`];
//! this module is the only place that turns those offsets into raw memory.

use std::ptr::{self, NonNull};

use libc::{c_void, intptr_t, sbrk};
use log::debug;

use crate::error::ProviderError;

/// A growable, contiguous memory region.
///
/// # Safety
///
/// Implementors must guarantee that once `base` returns a non-null pointer,
/// it never changes, and that `[base, base + top)` stays valid, writable
/// memory owned by the provider for as long as the provider lives. Pointers
/// handed out by the heap are derived from `base` and rely on this.
pub unsafe trait MemoryProvider {
  /// Start of the region, or null before the first extension.
  fn base(&self) -> *mut u8;

  /// Current length of the region in bytes.
  fn top(&self) -> usize;

  /// Extends the region by exactly `increment` bytes and returns the
  /// previous top. Either the whole extension happens or nothing does.
  fn extend(
    &mut self,
    increment: usize,
  ) -> Result<usize, ProviderError>;

  fn region(&self) -> &[u8] {
    let base = self.base();
    if base.is_null() {
      return &[];
    }
    unsafe { std::slice::from_raw_parts(base, self.top()) }
  }

  fn region_mut(&mut self) -> &mut [u8] {
    let base = self.base();
    if base.is_null() {
      return &mut [];
    }
    unsafe { std::slice::from_raw_parts_mut(base, self.top()) }
  }
}

/// Grows the region by moving the program break with `sbrk(2)`.
///
/// The region starts at whatever the break is on first extension. If
/// anything else in the process moves the break in between, the next
/// extension is undone and reported as [`ProviderError::Discontiguous`].
pub struct SbrkProvider {
  base: *mut u8,
  len: usize,
}

impl SbrkProvider {
  pub const fn new() -> Self {
    Self {
      base: ptr::null_mut(),
      len: 0,
    }
  }
}

impl Default for SbrkProvider {
  fn default() -> Self {
    Self::new()
  }
}

unsafe impl MemoryProvider for SbrkProvider {
  fn base(&self) -> *mut u8 {
    self.base
  }

  fn top(&self) -> usize {
    self.len
  }

  fn extend(
    &mut self,
    increment: usize,
  ) -> Result<usize, ProviderError> {
    let delta = intptr_t::try_from(increment)
      .map_err(|_| ProviderError::TooLarge { requested: increment })?;

    let previous = unsafe { sbrk(delta) };
    if previous == usize::MAX as *mut c_void {
      return Err(ProviderError::Exhausted { requested: increment });
    }

    let previous = previous as *mut u8;
    if self.base.is_null() {
      debug!("program break region starts at {:?}", previous);
      self.base = previous;
    } else if previous != self.base.wrapping_add(self.len) {
      unsafe { sbrk(-delta) };
      return Err(ProviderError::Discontiguous);
    }

    let old_top = self.len;
    self.len += increment;
    Ok(old_top)
  }
}

/// A fixed-capacity region carved out of an owned buffer.
///
/// Extensions succeed until `capacity` is used up, which makes
/// out-of-memory deterministic. Independent arenas back independent heaps.
pub struct ArenaProvider {
  buffer: NonNull<u8>,
  capacity: usize,
  top: usize,
}

impl ArenaProvider {
  pub fn with_capacity(capacity: usize) -> Self {
    let buffer = vec![0u8; capacity].into_boxed_slice();
    let raw = Box::into_raw(buffer) as *mut u8;

    Self {
      buffer: NonNull::new(raw).unwrap_or(NonNull::dangling()),
      capacity,
      top: 0,
    }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }
}

unsafe impl MemoryProvider for ArenaProvider {
  fn base(&self) -> *mut u8 {
    self.buffer.as_ptr()
  }

  fn top(&self) -> usize {
    self.top
  }

  fn extend(
    &mut self,
    increment: usize,
  ) -> Result<usize, ProviderError> {
    let new_top = self
      .top
      .checked_add(increment)
      .filter(|&top| top <= self.capacity)
      .ok_or(ProviderError::Exhausted { requested: increment })?;

    let old_top = self.top;
    self.top = new_top;
    Ok(old_top)
  }
}

impl Drop for ArenaProvider {
  fn drop(&mut self) {
    let slice = ptr::slice_from_raw_parts_mut(self.buffer.as_ptr(), self.capacity);
    drop(unsafe { Box::from_raw(slice) });
  }
}

/// Held by every test that moves the program break.
#[cfg(test)]
pub(crate) static SBRK_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_arena_extends_until_capacity() {
    let mut arena = ArenaProvider::with_capacity(64);

    assert_eq!(arena.capacity(), 64);
    assert!(arena.region().is_empty());
    assert_eq!(arena.extend(32), Ok(0));
    assert_eq!(arena.extend(32), Ok(32));
    assert_eq!(arena.region().len(), 64);
    assert_eq!(arena.extend(2), Err(ProviderError::Exhausted { requested: 2 }));
    assert_eq!(arena.top(), 64);
  }

  #[test]
  fn test_arena_base_is_stable() {
    let mut arena = ArenaProvider::with_capacity(16);
    let base = arena.base();

    arena.extend(8).unwrap();
    arena.region_mut()[7] = 0x42;
    arena.extend(8).unwrap();

    assert_eq!(arena.base(), base);
    assert_eq!(arena.region()[7], 0x42);
  }

  #[test]
  fn test_zero_capacity_arena() {
    let mut arena = ArenaProvider::with_capacity(0);
    assert!(arena.region().is_empty());
    assert!(arena.extend(2).is_err());
  }

  #[test]
  fn test_sbrk_extends_program_break() {
    let _guard = SBRK_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut provider = SbrkProvider::new();
    assert!(provider.base().is_null());
    assert!(provider.region().is_empty());

    match provider.extend(32) {
      Ok(old_top) => {
        assert_eq!(old_top, 0);
        assert!(!provider.base().is_null());
        provider.region_mut().fill(0x5A);
        assert!(provider.region().iter().all(|&b| b == 0x5A));
      }
      Err(err) => panic!("sbrk failed: {err}"),
    }
  }
}
