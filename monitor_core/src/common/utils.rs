/// Round to `digits` decimal places, half away from zero
pub fn round_to(v: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (v * factor).round() / factor
}

/// Normalize a ticker symbol for joins and requests
pub fn normalize_symbol(s: &str) -> String {
    s.trim().to_uppercase()
}

/// Split a comma-separated ticker list, dropping blanks
pub fn parse_tickers(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(normalize_symbol)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Treat null, zero and non-finite values alike as "no usable number"
pub fn nonzero(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && *x != 0.0)
}
