/// Rounds `value` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two. The heap uses this to turn a requested
/// capacity into a whole number of OS pages before mapping it.
///
/// # Examples
///
/// ```rust
/// use rfreelist::align_to;
///
/// assert_eq!(align_to!(1, 4096), 4096);
/// assert_eq!(align_to!(4096, 4096), 4096);
/// assert_eq!(align_to!(4097, 4096), 8192);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $alignment:expr) => {
    ($value + $alignment - 1) & !($alignment - 1)
  };
}

#[cfg(test)]
mod tests {
  #[test]
  fn test_align_to() {
    for alignment in [8usize, 16, 4096, 16384] {
      let mut expectations = Vec::new();

      for i in 0..10 {
        let sizes = (alignment * i + 1)..=(alignment * (i + 1));

        expectations.push((sizes, alignment * (i + 1)));
      }

      for (sizes, expected) in expectations {
        for size in sizes.step_by(7) {
          assert_eq!(expected, align_to!(size, alignment));
        }
        assert_eq!(expected, align_to!(expected, alignment));
      }
    }
  }

  #[test]
  fn test_align_to_zero() {
    assert_eq!(0, align_to!(0usize, 4096usize));
  }
}
