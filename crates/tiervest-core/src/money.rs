//! Fixed-point money and percentage arithmetic.
//!
//! Amounts are `i64` cents. Percentages are `i64` milli-percent: `1% == 1000`,
//! `0.050% == 50`. Applying a percentage to an amount therefore divides by
//! `100 * 1000`.

/// Denominator for applying a milli-percent value to a cent amount.
///
/// `amount * pct_milli / PCT_DENOMINATOR == amount * (pct / 100)`.
pub const PCT_DENOMINATOR: i64 = 100_000;

/// Apply a milli-percent rate to a cent amount, rounding half away from zero.
///
/// Negative rates produce negative results; this is how loss days debit a
/// balance.
#[must_use]
pub fn apply_pct(amount_cents: i64, pct_milli: i64) -> i64 {
    let num = i128::from(amount_cents) * i128::from(pct_milli);
    div_round_i128(num, i128::from(PCT_DENOMINATOR))
}

/// Divide two integers, rounding half away from zero.
#[must_use]
pub fn div_round(numerator: i64, denominator: i64) -> i64 {
    div_round_i128(i128::from(numerator), i128::from(denominator))
}

fn div_round_i128(num: i128, den: i128) -> i64 {
    debug_assert!(den > 0);
    let q = if num >= 0 {
        (num + den / 2) / den
    } else {
        (num - den / 2) / den
    };
    i64::try_from(q).unwrap_or(if q > 0 { i64::MAX } else { i64::MIN })
}
