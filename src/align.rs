/// Rounds a byte count up to the chunk header alignment (2 bytes).
///
/// Every chunk size written into a header goes through this macro, which
/// keeps the low bit of the size field free for the allocated flag.
///
/// # Examples
///
/// ```rust
/// use rchunk::align_even;
///
/// assert_eq!(align_even!(0usize), 0);
/// assert_eq!(align_even!(7usize), 8);
/// assert_eq!(align_even!(8usize), 8);
/// ```
#[macro_export]
macro_rules! align_even {
  ($value:expr) => {
    ($value + 1) & !1
  };
}

/// Checked variant of [`align_even!`], returning `None` on overflow.
pub const fn checked_align_even(value: usize) -> Option<usize> {
  match value.checked_add(1) {
    Some(bumped) => Some(bumped & !1),
    None => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_align_even() {
    for i in 0..64usize {
      let expected = if i % 2 == 0 { i } else { i + 1 };
      assert_eq!(expected, align_even!(i));
    }
  }

  #[test]
  fn test_checked_align_even() {
    assert_eq!(checked_align_even(5), Some(6));
    assert_eq!(checked_align_even(usize::MAX - 1), Some(usize::MAX - 1));
    assert_eq!(checked_align_even(usize::MAX), None);
  }
}
