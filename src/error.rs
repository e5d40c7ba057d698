use thiserror::Error;

/// Failure of an allocation request. The heap is left untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
  #[error("request of {requested} bytes exceeds the {max} byte chunk ceiling")]
  OversizedRequest { requested: usize, max: usize },
  #[error("out of memory")]
  OutOfMemory {
    #[from]
    source: ProviderError,
  },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProviderError {
  #[error("memory provider cannot extend the region by {requested} bytes")]
  Exhausted { requested: usize },
  #[error("region was moved by another party; extension is not contiguous")]
  Discontiguous,
  #[error("extension of {requested} bytes does not fit the platform's increment type")]
  TooLarge { requested: usize },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
  #[error("maximum chunk size {0} is odd")]
  OddChunkSize(usize),
  #[error("maximum chunk size {0} cannot hold a chunk header")]
  ChunkTooSmall(usize),
  #[error("maximum chunk size {0} does not fit the header size field")]
  ChunkTooLarge(usize),
  #[error("growth increment must be non-zero")]
  ZeroGrowth,
  #[error("growth increment {growth} is not a multiple of the maximum chunk size {max_chunk}")]
  GrowthNotMultiple { growth: usize, max_chunk: usize },
}

/// A broken chunk chain, as reported by [`crate::ChunkHeap::validate`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
  #[error("chunk at {offset:#x} runs past the heap end {end:#x}")]
  Overrun { offset: usize, end: usize },
  #[error("chunk at {offset:#x} is smaller than its header ({size} bytes)")]
  UndersizedChunk { offset: usize, size: usize },
  #[error("chunk at {offset:#x} exceeds the chunk ceiling ({size} > {max})")]
  OversizedChunk { offset: usize, size: usize, max: usize },
}
