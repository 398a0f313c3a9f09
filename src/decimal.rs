// Locale-safe decimal handling for collector values

use serde_json::Value;

/// Parse a decimal that may use `,` or `.` as the separator (`"12,34"`, `"12.34"`).
///
/// Returns `None` for anything that is not a finite number after normalization,
/// including strings with both separators present (thousands grouping is not accepted).
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.contains(',') && trimmed.contains('.') {
        return None;
    }
    let normalized = trimmed.replacen(',', ".", 1);
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric value of a JSON field: numbers as-is, strings through [`parse_decimal`].
pub fn decimal_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// Fixed two-decimal rendering with a `.` separator.
pub fn format_decimal(value: f64) -> String {
    format!("{:.2}", value)
}
