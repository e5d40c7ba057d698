use std::ptr::NonNull;

use log::{debug, trace};

use crate::{
  align::checked_align_even,
  config::HeapConfig,
  error::{AllocError, LayoutError},
  header::{HEADER_SIZE, Header},
  provider::{ArenaProvider, MemoryProvider, SbrkProvider},
  state::{HeapBounds, HeapState},
};

/// One chunk of the chain, as seen from outside the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
  /// Offset of the chunk header from the provider base.
  pub offset: usize,
  /// Total size, header included.
  pub size: usize,
  pub allocated: bool,
}

impl Chunk {
  pub fn payload_offset(&self) -> usize {
    self.offset + HEADER_SIZE
  }

  pub fn payload_len(&self) -> usize {
    self.size - HEADER_SIZE
  }
}

/// What [`ChunkHeap::free`] did with a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeOutcome {
  /// The chunk was marked free and coalesced forward.
  Released,
  /// The chunk was already free; nothing changed.
  AlreadyFree,
  Null,
  /// The pointer does not lie inside the heap; nothing changed.
  Foreign,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
  pub allocations: u64,
  pub failed_allocations: u64,
  pub frees: u64,
  pub ignored_frees: u64,
  pub growths: u64,
  pub merges: u64,
}

/// First-fit heap of in-band headed chunks over a growable region.
///
/// Not thread safe: search, split and coalescing all read and rewrite
/// headers across chunk boundaries, so a shared heap needs one lock around
/// the whole chain.
pub struct ChunkHeap<P: MemoryProvider> {
  config: HeapConfig,
  provider: P,
  state: HeapState,
  stats: HeapStats,
}

impl ChunkHeap<ArenaProvider> {
  pub fn with_arena(
    config: HeapConfig,
    capacity: usize,
  ) -> Self {
    Self::new(config, ArenaProvider::with_capacity(capacity))
  }
}

impl ChunkHeap<SbrkProvider> {
  pub fn with_sbrk(config: HeapConfig) -> Self {
    Self::new(config, SbrkProvider::new())
  }
}

impl<P: MemoryProvider> ChunkHeap<P> {
  pub fn new(
    config: HeapConfig,
    provider: P,
  ) -> Self {
    Self {
      config,
      provider,
      state: HeapState::new(),
      stats: HeapStats::default(),
    }
  }

  pub fn config(&self) -> &HeapConfig {
    &self.config
  }

  pub fn state(&self) -> &HeapState {
    &self.state
  }

  pub fn stats(&self) -> &HeapStats {
    &self.stats
  }

  pub fn provider(&self) -> &P {
    &self.provider
  }

  /// Allocates a chunk with at least `size` usable bytes and returns a
  /// pointer to its payload.
  ///
  /// `size` is rounded up to even. A zero-sized request still gets its own
  /// header-only chunk and a distinct pointer.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let result = self.try_allocate(size);

    match result {
      Ok(_) => self.stats.allocations += 1,
      Err(_) => self.stats.failed_allocations += 1,
    }

    result
  }

  fn try_allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    trace!("allocate(size = {size})");

    let max = self.config.max_chunk_size();
    let Some(needed) = checked_align_even(size)
      .and_then(|s| s.checked_add(HEADER_SIZE))
      .filter(|&needed| needed <= max)
    else {
      debug!("size ({size}) too large (chunk ceiling is {max})");
      return Err(AllocError::OversizedRequest { requested: size, max });
    };

    let offset = self.find_chunk(needed)?;
    let region = self.provider.region_mut();
    let found = Header::read(region, offset);

    let remainder = found.size - needed;
    if remainder > 0 {
      trace!("splitting {offset:#x} ({}B) into {needed}B + {remainder}B", found.size);
      Header::free(remainder).write(region, offset + needed);
    }
    Header::used(needed).write(region, offset);

    let payload = offset + HEADER_SIZE;
    if let Some(byte) = self.config.fill() {
      region[payload..offset + needed].fill(byte);
    }

    // SAFETY: `payload` is at most the heap end, which never passes the
    // provider top, and the base is non-null once the region has grown.
    Ok(unsafe { NonNull::new_unchecked(self.provider.base().add(payload)) })
  }

  /// Releases a pointer returned by [`ChunkHeap::allocate`].
  ///
  /// Null pointers, pointers outside the heap and chunks that are already
  /// free are ignored.
  pub fn free(
    &mut self,
    ptr: *mut u8,
  ) -> FreeOutcome {
    if ptr.is_null() {
      trace!("free(null) ignored");
      self.stats.ignored_frees += 1;
      return FreeOutcome::Null;
    }

    let Some(offset) = self.header_offset(ptr) else {
      debug!("memory at {ptr:?} is not part of the heap");
      self.stats.ignored_frees += 1;
      return FreeOutcome::Foreign;
    };

    let region = self.provider.region_mut();
    let header = Header::read(region, offset);
    if !header.allocated {
      debug!("memory at {ptr:?} is unallocated (preamble: {:#06x})", header.encode());
      self.stats.ignored_frees += 1;
      return FreeOutcome::AlreadyFree;
    }

    Header::free(header.size).write(region, offset);
    self.stats.frees += 1;
    self.combine_chunks(offset);

    FreeOutcome::Released
  }

  /// Merges the free chunk at `offset` with the free chunks that follow it.
  ///
  /// Stops at the heap end, at an allocated chunk, or when absorbing the
  /// next chunk would push the size past the chunk ceiling. Allocated or
  /// out-of-heap offsets are left alone.
  pub fn combine_chunks(
    &mut self,
    offset: usize,
  ) {
    let Some(HeapBounds { end, .. }) = self.state.bounds() else {
      return;
    };
    if !self.state.contains(offset) {
      return;
    }

    let max = self.config.max_chunk_size();
    let region = self.provider.region_mut();
    let mut header = Header::read(region, offset);
    if header.allocated {
      trace!("{offset:#x} is allocated, nothing to combine");
      return;
    }

    let mut next = offset + header.size;
    while next < end {
      let neighbour = Header::read(region, next);
      if neighbour.allocated || header.size + neighbour.size > max {
        break;
      }

      trace!(
        "combining {offset:#x} ({}B) with {next:#x} ({}B)",
        header.size, neighbour.size
      );
      header.size += neighbour.size;
      header.write(region, offset);
      self.stats.merges += 1;
      next = offset + header.size;
    }
  }

  /// First-fit scan for a free chunk of at least `needed` bytes.
  ///
  /// Every free chunk passed on the way is coalesced, whether or not it
  /// ends up being chosen. When the chain is exhausted the heap grows and
  /// the scan carries on into the new region.
  fn find_chunk(
    &mut self,
    needed: usize,
  ) -> Result<usize, AllocError> {
    if !self.state.is_initialized() {
      debug!("initializing heap at offset {:#x}", self.provider.top());
    }
    let HeapBounds { start, mut end } = self.state.get_or_init(self.provider.top());

    // Headers enlarged by this scan, with their original sizes. Merging
    // only rewrites the root header, so restoring it undoes the merge.
    let mut merged: Vec<(usize, usize)> = Vec::new();
    let merges_before = self.stats.merges;

    let mut cursor = start;
    loop {
      while cursor < end {
        let header = Header::read(self.provider.region(), cursor);
        debug_assert!(header.size >= HEADER_SIZE, "corrupt chunk at {cursor:#x}");

        if !header.allocated {
          self.combine_chunks(cursor);
          let size = Header::read(self.provider.region(), cursor).size;
          if size >= needed {
            trace!("free chunk found: {cursor:#x} ({size}B)");
            return Ok(cursor);
          }
          if size != header.size {
            merged.push((cursor, header.size));
          }
          cursor += size;
        } else {
          cursor += header.size;
        }
      }

      debug!("no free chunk of {needed}B found, growing heap");
      cursor = match self.grow() {
        Ok(cursor) => cursor,
        Err(err) => {
          self.undo_merges(&merged, merges_before);
          return Err(err);
        }
      };
      end = cursor + self.config.growth_increment();
    }
  }

  /// Restores chunk sizes recorded by a failed search.
  fn undo_merges(
    &mut self,
    merged: &[(usize, usize)],
    merges_before: u64,
  ) {
    let region = self.provider.region_mut();
    for &(offset, size) in merged.iter().rev() {
      trace!("restoring {offset:#x} to {size}B");
      Header::free(size).write(region, offset);
    }
    self.stats.merges = merges_before;
  }

  /// Extends the heap by one growth increment, carving the new bytes into
  /// free chunks, and returns the offset of the first of them.
  fn grow(&mut self) -> Result<usize, AllocError> {
    let increment = self.config.growth_increment();
    let previous = self.provider.extend(increment).map_err(|err| {
      debug!("heap growth failed: {err}");
      AllocError::from(err)
    })?;
    debug_assert_eq!(Some(previous), self.state.end(), "provider region moved");

    carve_free_chunks(
      self.provider.region_mut(),
      previous,
      increment,
      self.config.max_chunk_size(),
    );
    self.state.advance_end(increment);
    self.stats.growths += 1;

    debug!(
      "heap grew by {increment}B to {}B total",
      self.state.total_size()
    );
    Ok(previous)
  }

  /// Offset of the header in front of payload pointer `ptr`, if that
  /// header lies inside the heap at an even distance from its start.
  fn header_offset(
    &self,
    ptr: *const u8,
  ) -> Option<usize> {
    let HeapBounds { start, end } = self.state.bounds()?;
    let base = self.provider.base();
    if base.is_null() {
      return None;
    }

    let offset = (ptr as usize)
      .checked_sub(base as usize)?
      .checked_sub(HEADER_SIZE)?;

    let in_bounds = offset >= start && offset + HEADER_SIZE <= end;
    (in_bounds && (offset - start) % 2 == 0).then_some(offset)
  }

  /// The chunk owning payload pointer `ptr`.
  pub fn chunk_of(
    &self,
    ptr: *const u8,
  ) -> Option<Chunk> {
    let offset = self.header_offset(ptr)?;
    let header = Header::read(self.provider.region(), offset);

    Some(Chunk {
      offset,
      size: header.size,
      allocated: header.allocated,
    })
  }

  /// Raw bytes of `[start, end)`.
  pub fn heap_bytes(&self) -> &[u8] {
    match self.state.bounds() {
      Some(HeapBounds { start, end }) => &self.provider.region()[start..end],
      None => &[],
    }
  }

  /// Walks the chunk chain from heap start.
  pub fn chunks(&self) -> Chunks<'_> {
    let (cursor, end) = self
      .state
      .bounds()
      .map_or((0, 0), |b| (b.start, b.end));

    Chunks {
      region: self.provider.region(),
      cursor,
      end,
    }
  }

  /// Checks that the chain tiles the heap exactly and that every chunk size
  /// lies between the header width and the chunk ceiling.
  pub fn validate(&self) -> Result<(), LayoutError> {
    let Some(HeapBounds { start, end }) = self.state.bounds() else {
      return Ok(());
    };

    let max = self.config.max_chunk_size();
    let region = self.provider.region();
    let mut offset = start;

    while offset < end {
      if offset + HEADER_SIZE > end {
        return Err(LayoutError::Overrun { offset, end });
      }

      let size = Header::read(region, offset).size;
      if size < HEADER_SIZE {
        return Err(LayoutError::UndersizedChunk { offset, size });
      }
      if size > max {
        return Err(LayoutError::OversizedChunk { offset, size, max });
      }
      if offset + size > end {
        return Err(LayoutError::Overrun { offset, end });
      }

      offset += size;
    }

    Ok(())
  }
}

/// Iterator over the chunk chain, see [`ChunkHeap::chunks`].
pub struct Chunks<'a> {
  region: &'a [u8],
  cursor: usize,
  end: usize,
}

impl Iterator for Chunks<'_> {
  type Item = Chunk;

  fn next(&mut self) -> Option<Chunk> {
    if self.cursor >= self.end || self.cursor + HEADER_SIZE > self.region.len() {
      return None;
    }

    let header = Header::read(self.region, self.cursor);
    let chunk = Chunk {
      offset: self.cursor,
      size: header.size,
      allocated: header.allocated,
    };

    // A zero size would never advance; stop rather than spin.
    self.cursor = if header.size == 0 {
      self.end
    } else {
      self.cursor + header.size
    };

    Some(chunk)
  }
}

/// Writes free headers over `[start, start + len)`: chunks of `max_chunk`
/// bytes, with a shorter final chunk taking any remainder.
pub(crate) fn carve_free_chunks(
  region: &mut [u8],
  start: usize,
  len: usize,
  max_chunk: usize,
) {
  let end = start + len;
  let mut offset = start;

  while offset < end {
    let size = max_chunk.min(end - offset);
    debug_assert!(size % 2 == 0 && size >= HEADER_SIZE, "cannot carve a {size}B chunk");
    Header::free(size).write(region, offset);
    offset += size;
  }
}
