//! Reductions over sample values returned by the metrics service

use std::ops::Add;

/// Primitive integer or floating point type that can be summed and averaged.
pub trait Numeric: Copy + Default + Add<Output = Self> {
    fn to_f64(self) -> f64;
}

macro_rules! impl_numeric {
    ($($t:ty),* $(,)?) => {
        $(
            impl Numeric for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_numeric!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// Total of all values, zero for an empty slice.
///
/// Integer overflow follows the usual arithmetic rules of the build profile.
pub fn sum<T: Numeric>(values: &[T]) -> T {
    values.iter().fold(T::default(), |acc, v| acc + *v)
}

/// Arithmetic mean as `f64`, `None` when there are no values.
pub fn average<T: Numeric>(values: &[T]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(sum(values).to_f64() / values.len() as f64)
}

/// `true` when every value is `true`; stops at the first `false`.
pub fn all_true(values: &[bool]) -> bool {
    values.iter().all(|b| *b)
}
