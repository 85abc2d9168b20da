use crate::core::quantize::{quantize, Quantized, Rounding};
use crate::utils::error::{LimiterError, Result};
use crate::utils::validation::is_strictly_positive;

/// Amplifier voltage gain measured from a test tone.
///
/// `voltage_in` is read across pins 2 and 3 of the input XLR, `voltage_out`
/// across the speaker terminals. `gain = 20 * log10(U_out / U_in)`, to two
/// decimals.
pub fn measure_gain(voltage_in: f64, voltage_out: f64) -> Result<Quantized> {
    if !is_strictly_positive(voltage_in) {
        return Err(LimiterError::InvalidCalculatorInput {
            field: "voltage_in",
            value: voltage_in,
        });
    }
    if !is_strictly_positive(voltage_out) {
        return Err(LimiterError::InvalidCalculatorInput {
            field: "voltage_out",
            value: voltage_out,
        });
    }

    let gain = 20.0 * (voltage_out / voltage_in).log10();
    quantize(gain, 2, Rounding::HalfEven).ok_or(LimiterError::InvalidCalculatorInput {
        field: "gain",
        value: gain,
    })
}
