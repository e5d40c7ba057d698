/// Bounds of the managed heap, as offsets into the provider region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapBounds {
  pub start: usize,
  pub end: usize,
}

/// Where the heap lives. Unset until the first allocation request, after
/// which `start` is fixed and `end` only moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapState {
  bounds: Option<HeapBounds>,
}

impl HeapState {
  pub const fn new() -> Self {
    Self { bounds: None }
  }

  pub fn is_initialized(&self) -> bool {
    self.bounds.is_some()
  }

  pub fn bounds(&self) -> Option<HeapBounds> {
    self.bounds
  }

  /// Pins the heap to `top` if it is not yet initialized and returns the
  /// bounds either way.
  pub fn get_or_init(
    &mut self,
    top: usize,
  ) -> HeapBounds {
    *self.bounds.get_or_insert(HeapBounds { start: top, end: top })
  }

  pub fn start(&self) -> Option<usize> {
    self.bounds.map(|b| b.start)
  }

  pub fn end(&self) -> Option<usize> {
    self.bounds.map(|b| b.end)
  }

  pub fn total_size(&self) -> usize {
    self.bounds.map_or(0, |b| b.end - b.start)
  }

  /// Moves the end forward by `increment` bytes.
  pub(crate) fn advance_end(
    &mut self,
    increment: usize,
  ) {
    if let Some(bounds) = self.bounds.as_mut() {
      bounds.end += increment;
    }
  }

  /// Whether `offset` names a byte inside `[start, end)`.
  pub fn contains(
    &self,
    offset: usize,
  ) -> bool {
    self.bounds.is_some_and(|b| (b.start..b.end).contains(&offset))
  }
}
