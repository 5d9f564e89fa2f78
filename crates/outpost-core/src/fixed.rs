use fixed::types::{I32F32, I64F64};

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Turns are the atomic unit of colony time.
pub type Turns = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in the turn loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display, never in the turn loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Divide an integer quantity by a fixed-point divisor, truncating toward zero.
///
/// Divisors at or below zero are treated as one. The division runs in
/// Q64.64 so every `u32` quantity fits.
pub fn div_quantity(quantity: u32, divisor: Fixed64) -> u32 {
    let divisor = if divisor <= Fixed64::ZERO {
        I64F64::ONE
    } else {
        I64F64::from_num(divisor)
    };
    I64F64::from_num(quantity)
        .checked_div(divisor)
        .map(|v| v.saturating_to_num::<u32>())
        .unwrap_or(u32::MAX)
}
