//! Fixed-point quantization of `f64` results.
//!
//! Rounding is decided on the *exact* binary value of the input, not on its
//! shortest decimal rendering. `0.3_f64` is really `0.29999999999999998889…`,
//! so truncating it to one decimal gives `0.2`, and `-3.2_f64` is really
//! `-3.20000000000000017763…`, so rounding it away from zero gives `-3.3`.
//! The residual of `value * 10^places` is recovered exactly with a fused
//! multiply-add, which is enough to place the value relative to every
//! rounding boundary without arbitrary precision.

use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Toward zero.
    Down,
    /// Away from zero.
    Up,
    /// To nearest, ties to even.
    HalfEven,
}

/// A decimal value stored as `units * 10^-places`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quantized {
    units: i64,
    places: u32,
}

impl Quantized {
    pub fn new(units: i64, places: u32) -> Self {
        Self { units, places }
    }

    pub fn units(self) -> i64 {
        self.units
    }

    pub fn to_f64(self) -> f64 {
        self.units as f64 / 10u64.pow(self.places) as f64
    }
}

impl fmt::Display for Quantized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.places == 0 {
            return write!(f, "{}", self.units);
        }
        let scale = 10u64.pow(self.places);
        let magnitude = self.units.unsigned_abs();
        let sign = if self.units < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:0width$}",
            sign,
            magnitude / scale,
            magnitude % scale,
            width = self.places as usize
        )
    }
}

impl Serialize for Quantized {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

/// Largest magnitude of `value * 10^places` that still fits the `i64` units.
const UNITS_LIMIT: f64 = 9_223_372_036_854_774_784.0;

/// Quantize `value` to `places` decimals.
///
/// `None` when `value` is not finite or its scaled units overflow `i64`.
pub fn quantize(value: f64, places: u32, rounding: Rounding) -> Option<Quantized> {
    debug_assert!(places <= 15);

    let scale = 10u64.pow(places) as f64;
    let product = value * scale;
    if !product.is_finite() || product.abs() > UNITS_LIMIT {
        return None;
    }
    // value * scale == product + residual, exactly.
    let residual = value.mul_add(scale, -product);

    let mut floor = product.floor();
    if product == floor && residual < 0.0 {
        floor -= 1.0;
    }
    // Fractional part of the exact product is (product - floor) + residual, in [0, 1).
    let head = product - floor;
    let exact_integer = head == 0.0 && residual == 0.0;
    let ceil = if exact_integer { floor } else { floor + 1.0 };

    let rounded = match rounding {
        Rounding::Down => {
            if value >= 0.0 {
                floor
            } else {
                ceil
            }
        }
        Rounding::Up => {
            if value >= 0.0 {
                ceil
            } else {
                floor
            }
        }
        Rounding::HalfEven => {
            let above_half = head - 0.5;
            if above_half > -residual {
                ceil
            } else if above_half < -residual {
                floor
            } else if floor % 2.0 == 0.0 {
                floor
            } else {
                ceil
            }
        }
    };

    if rounded.abs() > UNITS_LIMIT {
        return None;
    }
    Some(Quantized::new(rounded as i64, places))
}

/// Asymmetric rounding used for limiter thresholds: positive values are
/// truncated toward zero, zero and negative values are pushed away from zero.
/// Either way the reported threshold never exceeds the computed one.
pub fn quantize_threshold(value: f64, places: u32) -> Option<Quantized> {
    let rounding = if value > 0.0 {
        Rounding::Down
    } else {
        Rounding::Up
    };
    quantize(value, places, rounding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threshold(value: f64) -> String {
        quantize_threshold(value, 1).unwrap().to_string()
    }

    fn half_even(value: f64, places: u32) -> String {
        quantize(value, places, Rounding::HalfEven).unwrap().to_string()
    }

    #[test]
    fn positive_thresholds_truncate() {
        assert_eq!(threshold(3.27), "3.2");
        assert_eq!(threshold(3.29999), "3.2");
        assert_eq!(threshold(2.286065646352476), "2.2");
        assert_eq!(threshold(2.2), "2.2");
    }

    #[test]
    fn negative_thresholds_round_away_from_zero() {
        assert_eq!(threshold(-3.27), "-3.3");
        assert_eq!(threshold(-3.21), "-3.3");
        assert_eq!(threshold(-3.25), "-3.3");
        assert_eq!(threshold(-1.413047204365462), "-1.5");
        assert_eq!(threshold(-0.04), "-0.1");
    }

    #[test]
    fn binary_representation_decides_the_boundary() {
        // 0.3 is stored just below 0.3, -3.2 just below -3.2, 0.5 exactly.
        assert_eq!(threshold(0.3), "0.2");
        assert_eq!(threshold(-3.2), "-3.3");
        assert_eq!(threshold(-0.5), "-0.5");
        assert_eq!(threshold(0.5), "0.5");
    }

    #[test]
    fn zero_stays_zero() {
        assert_eq!(threshold(0.0), "0.0");
        assert_eq!(quantize_threshold(0.0, 1).unwrap().units(), 0);
    }

    #[test]
    fn half_even_uses_exact_value() {
        assert_eq!(half_even(113.13708498984761, 2), "113.14");
        assert_eq!(half_even(73.9008, 2), "73.90");
        // 2.675 is stored as 2.67499999…
        assert_eq!(half_even(2.675, 2), "2.67");
        // Exact ties go to the even neighbour.
        assert_eq!(half_even(0.125, 2), "0.12");
        assert_eq!(half_even(0.375, 2), "0.38");
        assert_eq!(half_even(-0.125, 2), "-0.12");
    }

    #[test]
    fn zero_places() {
        assert_eq!(quantize_threshold(-4.1, 0).unwrap().to_string(), "-5");
        assert_eq!(quantize_threshold(4.9, 0).unwrap().to_string(), "4");
    }

    #[test]
    fn out_of_range_values_are_refused() {
        assert!(quantize(f64::INFINITY, 2, Rounding::HalfEven).is_none());
        assert!(quantize(f64::NAN, 1, Rounding::Down).is_none());
        assert!(quantize(f64::MAX, 0, Rounding::Up).is_none());
        // 1e17 volts fits an i64 but not once scaled to hundredths.
        assert!(quantize(1e17, 2, Rounding::HalfEven).is_none());
        assert!(quantize_threshold(-1e18, 1).is_none());
        assert_eq!(half_even(1e15, 2), "1000000000000000.00");
    }

    #[test]
    fn display_pads_fraction() {
        assert_eq!(Quantized::new(-5, 1).to_string(), "-0.5");
        assert_eq!(Quantized::new(18306, 2).to_string(), "183.06");
        assert_eq!(Quantized::new(18300, 2).to_string(), "183.00");
        assert_eq!(Quantized::new(7, 3).to_string(), "0.007");
    }

    #[test]
    fn to_f64_is_nearest_double() {
        assert_eq!(Quantized::new(22, 1).to_f64(), 2.2);
        assert_eq!(Quantized::new(-15, 1).to_f64(), -1.5);
    }
}
