//! In-band chunk header ("preamble") codec.
//!
//! ```text
//!   15                                        1   0
//!  ┌───────────────────────────────────────────┬───┐
//!  │            chunk size (even)              │ A │
//!  └───────────────────────────────────────────┴───┘
//! ```
//!
//! The size covers the header itself plus the payload. Bit 0 is the
//! allocated flag. Headers are stored little-endian.

use std::mem;

pub type Preamble = u16;

/// Width of a chunk header in bytes.
pub const HEADER_SIZE: usize = mem::size_of::<Preamble>();

/// Largest chunk size the size field can represent.
pub const MAX_ENCODABLE_SIZE: usize = (Preamble::MAX & !1) as usize;

const ALLOCATED_BIT: Preamble = 0x1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
  pub size: usize,
  pub allocated: bool,
}

impl Header {
  pub const fn new(
    size: usize,
    allocated: bool,
  ) -> Self {
    Self { size, allocated }
  }

  pub const fn free(size: usize) -> Self {
    Self::new(size, false)
  }

  pub const fn used(size: usize) -> Self {
    Self::new(size, true)
  }

  /// Packs the header. The caller guarantees `size` is even and at most
  /// [`MAX_ENCODABLE_SIZE`].
  pub const fn encode(self) -> Preamble {
    let size = (self.size as Preamble) & !ALLOCATED_BIT;
    if self.allocated { size | ALLOCATED_BIT } else { size }
  }

  pub const fn decode(raw: Preamble) -> Self {
    Self {
      size: (raw & !ALLOCATED_BIT) as usize,
      allocated: raw & ALLOCATED_BIT == ALLOCATED_BIT,
    }
  }

  /// Reads the header stored at `offset`.
  ///
  /// # Panics
  ///
  /// Panics if the header would extend past the end of `region`.
  pub fn read(
    region: &[u8],
    offset: usize,
  ) -> Self {
    let bytes = [region[offset], region[offset + 1]];
    Self::decode(Preamble::from_le_bytes(bytes))
  }

  /// Writes the header at `offset`.
  ///
  /// # Panics
  ///
  /// Panics if the header would extend past the end of `region`.
  pub fn write(
    self,
    region: &mut [u8],
    offset: usize,
  ) {
    debug_assert!(self.size % 2 == 0, "odd chunk size {}", self.size);
    debug_assert!(self.size <= MAX_ENCODABLE_SIZE, "chunk size {} overflows header", self.size);
    region[offset..offset + HEADER_SIZE].copy_from_slice(&self.encode().to_le_bytes());
  }
}
