//! Read-only heap dumps for debugging.
//!
//! ```text
//!     offset    _0  _1  _2  _3  _4  _5  _6  _7  _8  _9  _A  _B  _C  _D  _E  _F
//!   0x000000:   09  00  AA  AA  AA  AA  AA  AA  18  00  00  00  00  00  00  00
//!   0x000010:   00  00  00  00  00  00  00  00  00  00  00  00  00  00  00  00
//!
//!     offset   size(B)     hex  used
//!   0x000000       8  (   0x8)    X
//!   0x000008      24  (  0x18)
//! ```

use std::fmt;

use crate::{heap::ChunkHeap, provider::MemoryProvider};

const ROW_WIDTH: usize = 0x10;

/// Raw heap bytes, sixteen per row, labelled by offset.
pub struct HexDump<'a, P: MemoryProvider> {
  heap: &'a ChunkHeap<P>,
}

/// One line per chunk: offset, size and allocation flag.
pub struct ChunkTable<'a, P: MemoryProvider> {
  heap: &'a ChunkHeap<P>,
}

impl<P: MemoryProvider> ChunkHeap<P> {
  pub fn hex_dump(&self) -> HexDump<'_, P> {
    HexDump { heap: self }
  }

  pub fn chunk_table(&self) -> ChunkTable<'_, P> {
    ChunkTable { heap: self }
  }
}

impl<P: MemoryProvider> fmt::Display for HexDump<'_, P> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    let start = self.heap.state().start().unwrap_or(0);

    write!(f, "    offset  ")?;
    for column in 0..ROW_WIDTH {
      write!(f, "  _{column:X}")?;
    }
    writeln!(f)?;

    for (row, bytes) in self.heap.heap_bytes().chunks(ROW_WIDTH).enumerate() {
      write!(f, "  {:#08x}: ", start + row * ROW_WIDTH)?;
      for byte in bytes {
        write!(f, "  {byte:02X}")?;
      }
      writeln!(f)?;
    }

    Ok(())
  }
}

impl<P: MemoryProvider> fmt::Display for ChunkTable<'_, P> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "    offset   size(B)     hex  used")?;

    for chunk in self.heap.chunks() {
      writeln!(
        f,
        "  {:#08x}   {:5}  ({:#6x})    {}",
        chunk.offset,
        chunk.size,
        chunk.size,
        if chunk.allocated { 'X' } else { ' ' }
      )?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use crate::{ChunkHeap, HeapConfig, config::CLEAN_FILL};

  #[test]
  fn test_empty_heap_dumps_headers_only() {
    let heap = ChunkHeap::with_arena(HeapConfig::default(), 64);

    assert_eq!(heap.hex_dump().to_string().lines().count(), 1);
    assert_eq!(heap.chunk_table().to_string().lines().count(), 1);
  }

  #[test]
  fn test_dump_after_allocation() {
    let config = HeapConfig::default().with_fill(CLEAN_FILL);
    let mut heap = ChunkHeap::with_arena(config, 64);
    heap.allocate(6).unwrap();

    let dump = heap.hex_dump().to_string();
    let rows: Vec<_> = dump.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with("  0x000000:   09  00  AA  AA  AA  AA  AA  AA  18  00"));
    assert!(rows[2].starts_with("  0x000010:"));

    let table = heap.chunk_table().to_string();
    let rows: Vec<_> = table.lines().collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1], "  0x000000       8  (   0x8)    X");
    assert_eq!(rows[2], "  0x000008      24  (  0x18)     ");
  }
}
