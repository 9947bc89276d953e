//! Cell rendering.
//!
//! Answers are opaque values: they are rendered to text, never coerced to a
//! column type. Absent values render as the empty string so every row keeps
//! the header's width.

use serde_json::Value;

/// Renders an answer value as cell text.
///
/// - strings verbatim
/// - integers in decimal, floats in their shortest natural form (`10.0` → `10`)
/// - booleans as `true` / `false`
/// - `null` as empty
/// - arrays (multiple-choice answers) as rendered items joined with `,`
/// - objects as compact JSON
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(render_number).unwrap_or_default()
            }
        },
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Renders an optional answer, empty when absent.
#[must_use]
pub fn render_optional(value: Option<&Value>) -> String {
    value.map(render_value).unwrap_or_default()
}

/// Renders a floating point number in its natural decimal form.
///
/// Non-finite values render as empty.
#[must_use]
pub fn render_number(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if value == 0.0 {
        // Normalizes -0.0.
        return "0".to_string();
    }
    value.to_string()
}
