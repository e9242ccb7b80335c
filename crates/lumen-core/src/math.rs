//! Range-mapping helpers used by the rendering core.
//!
//! All coordinate and color conversions in the engine go through
//! [`map_value`], so NDC generation and channel normalization share one
//! exact formula.

/// Maps `value` from the range `from_start..from_stop` into the range
/// `to_start..to_stop`.
///
/// The mapping is linear and unclamped:
///
/// ```
/// use lumen_core::math::map_value;
///
/// assert_eq!(map_value(5.0, 0.0, 10.0, 0.0, 1.0), 0.5);
/// assert_eq!(map_value(0.0, 0.0, 100.0, -1.0, 1.0), -1.0);
/// // values outside the source range extrapolate
/// assert_eq!(map_value(20.0, 0.0, 10.0, 0.0, 1.0), 2.0);
/// ```
pub fn map_value(value: f32, from_start: f32, from_stop: f32, to_start: f32, to_stop: f32) -> f32 {
    to_start + (to_stop - to_start) * ((value - from_start) / (from_stop - from_start))
}

/// Maps an 8-bit channel value from `0..=255` into `to_start..to_stop`.
pub fn map_byte(value: u8, to_start: f32, to_stop: f32) -> f32 {
    map_value(value as f32, 0.0, 255.0, to_start, to_stop)
}

/// Maps `value` from `from_start..from_stop` into `0..=255`.
///
/// The result is truncated toward zero when narrowing to a byte.
pub fn map_to_byte(value: f32, from_start: f32, from_stop: f32) -> u8 {
    map_value(value, from_start, from_stop, 0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_midpoint() {
        assert_eq!(map_value(127.5, 0.0, 255.0, 0.0, 1.0), 0.5);
    }

    #[test]
    fn maps_inverted_target_range() {
        // screen-space y grows downward, NDC y grows upward
        assert_eq!(map_value(0.0, 0.0, 100.0, 1.0, -1.0), 1.0);
        assert_eq!(map_value(100.0, 0.0, 100.0, 1.0, -1.0), -1.0);
        assert_eq!(map_value(50.0, 0.0, 100.0, 1.0, -1.0), 0.0);
    }

    #[test]
    fn byte_round_trip_is_exact_within_tolerance() {
        for v in 0..=255u8 {
            let unit = map_byte(v, 0.0, 1.0);
            let back = map_value(unit, 0.0, 1.0, 0.0, 255.0);
            assert!(
                (back - v as f32).abs() < 1e-3,
                "byte {v} round-tripped to {back}"
            );
        }
    }

    #[test]
    fn map_to_byte_truncates() {
        // 0.9999 of the way maps to 254.97..., which truncates to 254
        assert_eq!(map_to_byte(0.9999, 0.0, 1.0), 254);
        assert_eq!(map_to_byte(1.0, 0.0, 1.0), 255);
        assert_eq!(map_to_byte(0.0, 0.0, 1.0), 0);
    }
}
