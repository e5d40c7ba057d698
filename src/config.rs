use crate::{
  error::ConfigError,
  header::{HEADER_SIZE, MAX_ENCODABLE_SIZE},
};

/// Default heap extension granularity.
pub const DEFAULT_GROWTH_INCREMENT: usize = 0x20;
/// Default per-chunk ceiling.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 0x20;
/// Byte pattern written over fresh payloads when filling is enabled.
pub const CLEAN_FILL: u8 = 0xAA;

/// Fixed heap parameters, chosen once before the heap is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
  growth_increment: usize,
  max_chunk_size: usize,
  fill: Option<u8>,
}

impl HeapConfig {
  pub fn new(
    growth_increment: usize,
    max_chunk_size: usize,
  ) -> Result<Self, ConfigError> {
    if max_chunk_size % 2 != 0 {
      return Err(ConfigError::OddChunkSize(max_chunk_size));
    }
    if max_chunk_size < HEADER_SIZE {
      return Err(ConfigError::ChunkTooSmall(max_chunk_size));
    }
    if max_chunk_size > MAX_ENCODABLE_SIZE {
      return Err(ConfigError::ChunkTooLarge(max_chunk_size));
    }
    if growth_increment == 0 {
      return Err(ConfigError::ZeroGrowth);
    }
    if growth_increment % max_chunk_size != 0 {
      return Err(ConfigError::GrowthNotMultiple {
        growth: growth_increment,
        max_chunk: max_chunk_size,
      });
    }

    Ok(Self {
      growth_increment,
      max_chunk_size,
      fill: None,
    })
  }

  /// Fills every freshly allocated payload with `byte`.
  pub fn with_fill(
    mut self,
    byte: u8,
  ) -> Self {
    self.fill = Some(byte);
    self
  }

  pub fn growth_increment(&self) -> usize {
    self.growth_increment
  }

  pub fn max_chunk_size(&self) -> usize {
    self.max_chunk_size
  }

  pub fn fill(&self) -> Option<u8> {
    self.fill
  }

  /// Largest payload a single allocation can request.
  pub fn max_payload(&self) -> usize {
    self.max_chunk_size - HEADER_SIZE
  }
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self {
      growth_increment: DEFAULT_GROWTH_INCREMENT,
      max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
      fill: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_matches_constants() {
    let config = HeapConfig::default();
    assert_eq!(config, HeapConfig::new(0x20, 0x20).unwrap());
    assert_eq!(config.max_payload(), 0x1E);
    assert_eq!(config.fill(), None);
  }

  #[test]
  fn test_rejects_bad_parameters() {
    assert_eq!(HeapConfig::new(32, 7), Err(ConfigError::OddChunkSize(7)));
    assert_eq!(HeapConfig::new(32, 0), Err(ConfigError::ChunkTooSmall(0)));
    assert_eq!(
      HeapConfig::new(0x2_0000, 0x1_0000),
      Err(ConfigError::ChunkTooLarge(0x1_0000))
    );
    assert_eq!(HeapConfig::new(0, 8), Err(ConfigError::ZeroGrowth));
    assert_eq!(
      HeapConfig::new(36, 8),
      Err(ConfigError::GrowthNotMultiple { growth: 36, max_chunk: 8 })
    );
  }

  #[test]
  fn test_with_fill() {
    let config = HeapConfig::new(64, 16).unwrap().with_fill(CLEAN_FILL);
    assert_eq!(config.fill(), Some(0xAA));
    assert_eq!(config.growth_increment(), 64);
    assert_eq!(config.max_chunk_size(), 16);
  }
}
