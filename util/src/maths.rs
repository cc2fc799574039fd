//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp `value` into the range `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Wrap a signed index into the range `[0, len)`.
///
/// `len` must be non-zero.
pub fn wrap_index(index: i64, len: usize) -> usize {
    index.rem_euclid(len as i64) as usize
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&2.0f64, &-1.0, &1.0), 1.0);
        assert_eq!(clamp(&-2.0f64, &-1.0, &1.0), -1.0);
        assert_eq!(clamp(&0.25f64, &-1.0, &1.0), 0.25);
    }

    #[test]
    fn test_wrap_index() {
        assert_eq!(wrap_index(-1, 100), 99);
        assert_eq!(wrap_index(100, 100), 0);
        assert_eq!(wrap_index(137, 100), 37);
        assert_eq!(wrap_index(5, 100), 5);
    }
}
