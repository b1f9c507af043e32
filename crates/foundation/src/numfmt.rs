/// Formats `value` with en-US digit grouping and between zero and `max_fraction_digits`
/// fraction digits, e.g. `1234567.891` -> `"1,234,567.89"`, `12.0` -> `"12"`.
pub fn grouped(value: f64, max_fraction_digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", max_fraction_digits, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    // Rounding can produce "-0"; drop the sign when nothing non-zero remains.
    let is_zero = int_part.bytes().all(|b| b == b'0') && frac_part.is_empty();
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }

    let digits = int_part.as_bytes();
    for (i, d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*d as char);
    }

    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Fixed-point formatting with exactly `digits` fraction digits and no grouping.
pub fn fixed(value: f64, digits: usize) -> String {
    format!("{:.*}", digits, value)
}
