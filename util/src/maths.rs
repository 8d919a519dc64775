//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a speed in meters/second into kilometers/hour.
pub fn mps_to_kph<T>(value: T) -> T
where
    T: Float,
{
    value * T::from(3.6).unwrap()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_speed_conversion() {
        assert_eq!(mps_to_kph(5f64), 18f64);
        assert_eq!(mps_to_kph(0f64), 0f64);

        // 13.89 m/s is the nominal 50 km/h drive test target speed
        assert!((mps_to_kph(13.89f64) - 50.004f64).abs() < 1e-9);
    }
}
