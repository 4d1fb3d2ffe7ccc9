/// Round to `decimals` decimal places (half away from zero).
///
/// Values too large to scale are returned unchanged; they have no fractional part anyway.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Round a price to cents.
pub fn round_price(value: f64) -> f64 {
    round_to(value, 2)
}
