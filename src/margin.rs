pub const MARGIN_DIGITS: usize = 2;

pub fn parse_odd(raw: &str) -> Option<f64> {
    let value = raw.trim().parse::<f64>().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

pub fn three_way_margin(a: &str, b: &str, c: &str) -> String {
    let (Some(a), Some(b), Some(c)) = (parse_odd(a), parse_odd(b), parse_odd(c)) else {
        return String::new();
    };
    truncate_f64((1.0 / a + 1.0 / b + 1.0 / c - 1.0) * 100.0, MARGIN_DIGITS)
}

pub fn two_way_margin(a: &str, b: &str) -> String {
    let (Some(a), Some(b)) = (parse_odd(a), parse_odd(b)) else {
        return String::new();
    };
    truncate_f64((1.0 / a + 1.0 / b - 1.0) * 100.0, MARGIN_DIGITS)
}

/// Cut a decimal string to `digits` fractional characters, padding with `0`.
///
/// `digits == 0` keeps the trailing dot (`"12.3" -> "12."`). Never rounds.
pub fn truncate(value: &str, digits: usize) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    let (int_part, frac_part) = value.split_once('.').unwrap_or((value, ""));
    if digits == 0 {
        return format!("{int_part}.");
    }
    let mut frac: String = frac_part.chars().take(digits).collect();
    while frac.len() < digits {
        frac.push('0');
    }
    format!("{int_part}.{frac}")
}

pub fn truncate_f64(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return String::new();
    }
    truncate(&value.to_string(), digits)
}
