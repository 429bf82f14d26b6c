//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 to `places` decimal places, returning 0.0 for non-finite values.
#[must_use]
pub fn round_to_places(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let exponent = i32::try_from(places).unwrap_or(i32::MAX);
    let factor = 10_f64.powi(exponent);
    if !factor.is_finite() {
        return value;
    }
    (value * factor).round() / factor
}

/// Convert usize to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Saturating u64 to i64 conversion used for duration construction.
#[must_use]
pub fn u64_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_handles_places_and_nan() {
        assert!((round_to_places(1.23456, 2) - 1.23).abs() < f64::EPSILON);
        assert!((round_to_places(152.4, 0) - 152.0).abs() < f64::EPSILON);
        assert!(round_to_places(f64::NAN, 2).abs() < f64::EPSILON);
    }

    #[test]
    fn integer_conversions_saturate() {
        assert_eq!(u64_to_i64(u64::MAX), i64::MAX);
        assert!((usize_to_f64(3) - 3.0).abs() < f64::EPSILON);
    }
}
