//! Display helpers shared by the dashboard and the report renderers.

use num_format::{Locale, ToFormattedString};

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format as dollars with thousands separators, e.g. `$1,234.56`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return format!("${}", value);
    }
    // Beyond this the cents no longer fit in a u64.
    if value.abs() >= u64::MAX as f64 / 100.0 {
        let sign = if value < 0.0 { "-" } else { "" };
        return format!("{}${:.2}", sign, value.abs());
    }
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{}${}.{:02}",
        sign,
        (cents / 100).to_formatted_string(&Locale::en),
        cents % 100
    )
}

/// Format a count or quantity with thousands separators, keeping up to two
/// decimals for fractional values.
pub fn format_quantity(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_formatted_string(&Locale::en)
    } else {
        format!("{:.2}", value)
    }
}
