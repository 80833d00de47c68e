//! Log-space accumulation helpers.
//!
//! Forward/backward recursions multiply many small probabilities; everything is
//! kept as log-probabilities and combined with `log_sum_exp`.

/// Numerically stable `ln(Σ exp(x_i))`. Empty input is `-inf`.
pub fn log_sum_exp(xs: &[f64]) -> f64 {
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY || !max.is_finite() {
        return max;
    }
    let sum: f64 = xs.iter().map(|&x| (x - max).exp()).sum();
    max + sum.ln()
}

/// Natural log that maps zero to `-inf` instead of NaN-prone tiny values.
pub fn ln_or_neg_inf(p: f64) -> f64 {
    if p > 0.0 { p.ln() } else { f64::NEG_INFINITY }
}
