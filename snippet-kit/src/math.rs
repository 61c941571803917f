// Arithmetic helpers.

use std::ops::Add;

/// Add two values of the same numeric type.
///
/// Floats follow IEEE semantics (no rounding, `NaN` propagates). For integer
/// inputs that may overflow, use [`checked_sum`].
pub fn calculate_sum<T: Add<Output = T>>(a: T, b: T) -> T {
    a + b
}

/// Integer addition that returns `None` on overflow.
pub fn checked_sum(a: i64, b: i64) -> Option<i64> {
    a.checked_add(b)
}
