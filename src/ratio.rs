// Percentages shown in the product are whole numbers rounded half-up
// (2.5 -> 3, -2.5 -> -2), the same way the dashboard has always displayed them.

/// Round half-up to the nearest integer
pub fn round_half_up(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    (value + 0.5).floor() as i64
}

/// `part / whole * 100`, rounded half-up. Returns 0 when `whole` is zero.
pub fn percent_of(part: f64, whole: f64) -> i64 {
    if whole == 0.0 {
        return 0;
    }
    round_half_up(part / whole * 100.0)
}
