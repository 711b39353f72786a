//! Encoding inference: picks the label column and the numeric series columns
//! of an arbitrary tabular result.
//!
//! Classification looks at the first row only; rows are assumed to share a
//! schema. Numeric strings are classified with the same rules as the
//! JavaScript `Number()` conversion used by the browser front-end, so an empty
//! or whitespace-only string counts as numeric (it converts to `0`).

use serde::Serialize;
use serde_json::Value;

use super::types::Row;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Encoding {
    pub label_column: String,
    pub numeric_columns: Vec<String>,
}

impl Encoding {
    pub fn primary_numeric(&self) -> Option<&str> {
        self.numeric_columns.first().map(String::as_str)
    }

    pub fn secondary_numeric(&self) -> Option<&str> {
        self.numeric_columns.get(1).map(String::as_str)
    }
}

/// Returns `None` when there is no first row or it has no columns.
pub fn infer(rows: &[Row]) -> Option<Encoding> {
    let first = rows.first()?;
    let first_key = first.keys().next()?;

    let label_column = first
        .iter()
        .find(|(_, v)| v.is_string())
        .map(|(k, _)| k)
        .unwrap_or(first_key)
        .clone();

    let numeric_columns = first
        .iter()
        .filter(|(_, v)| is_numeric_cell(v))
        .map(|(k, _)| k.clone())
        .collect();

    Some(Encoding {
        label_column,
        numeric_columns,
    })
}

/// Column classification: a JSON number, or a string `Number()` accepts.
pub fn is_numeric_cell(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => js_number(s).is_some(),
        _ => false,
    }
}

/// Numeric reading of a cell. `null` reads as 0 and booleans as 1/0; arrays,
/// objects and unparseable strings have no numeric value.
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => js_number(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

pub fn cell_number(row: &Row, column: &str) -> Option<f64> {
    row.get(column).and_then(numeric_value)
}

/// String conversion of a string per JavaScript `Number()`. `None` stands for `NaN`.
pub fn js_number(input: &str) -> Option<f64> {
    let s = input.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if s.is_empty() {
        return Some(0.0);
    }

    match s {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    if s.len() > 2 && s.starts_with('0') {
        let radix = match s.as_bytes()[1] {
            b'x' | b'X' => Some(16),
            b'o' | b'O' => Some(8),
            b'b' | b'B' => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            return parse_radix(&s[2..], radix);
        }
    }

    if is_decimal_literal(s) {
        s.parse::<f64>().ok()
    } else {
        None
    }
}

fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    })
}

fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return false;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}

/// Text shown for a cell: strings verbatim, numbers the way JavaScript prints
/// them, `null`/missing as empty.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i.to_string(),
            (_, Some(u)) => u.to_string(),
            _ => format_number(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn cell_text(row: &Row, column: &str) -> String {
    row.get(column).map(display_value).unwrap_or_default()
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

/// `total_revenue` -> `total revenue`
pub fn humanize(column: &str) -> String {
    column.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_label_is_first_string_column() {
        let r = rows(json!([{"id": 1, "region": "West", "sales": 120}]));
        let enc = infer(&r).unwrap();
        assert_eq!(enc.label_column, "region");
        assert_eq!(enc.numeric_columns, vec!["id", "sales"]);
    }

    #[test]
    fn test_label_falls_back_to_first_column() {
        let r = rows(json!([{"year": 2020, "total": 5}]));
        let enc = infer(&r).unwrap();
        assert_eq!(enc.label_column, "year");
        assert_eq!(enc.numeric_columns, vec!["year", "total"]);
    }

    #[test]
    fn test_numeric_string_is_both_label_and_series() {
        let r = rows(json!([{"amount": "42.5", "flag": true}]));
        let enc = infer(&r).unwrap();
        assert_eq!(enc.label_column, "amount");
        assert_eq!(enc.numeric_columns, vec!["amount"]);
    }

    #[test]
    fn test_single_column_row() {
        let r = rows(json!([{"count": 7}]));
        let enc = infer(&r).unwrap();
        assert_eq!(enc.label_column, "count");
        assert_eq!(enc.primary_numeric(), Some("count"));
    }

    #[test]
    fn test_empty_string_is_numeric_quirk() {
        // Number("") is 0 in the browser, so an empty cell classifies as numeric.
        let r = rows(json!([{"name": "", "note": "n/a"}]));
        let enc = infer(&r).unwrap();
        assert_eq!(enc.label_column, "name");
        assert_eq!(enc.numeric_columns, vec!["name"]);
        assert_eq!(js_number("   "), Some(0.0));
    }

    #[test]
    fn test_only_first_row_is_inspected() {
        let r = rows(json!([{"a": "x", "b": "nope"}, {"a": "y", "b": 3}]));
        let enc = infer(&r).unwrap();
        assert!(enc.numeric_columns.is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(infer(&[]).is_none());
        assert!(infer(&[Row::new()]).is_none());
    }

    #[test]
    fn test_js_number_forms() {
        assert_eq!(js_number("12"), Some(12.0));
        assert_eq!(js_number(" -3.5 "), Some(-3.5));
        assert_eq!(js_number(".5"), Some(0.5));
        assert_eq!(js_number("5."), Some(5.0));
        assert_eq!(js_number("1e3"), Some(1000.0));
        assert_eq!(js_number("0x1A"), Some(26.0));
        assert_eq!(js_number("0b101"), Some(5.0));
        assert_eq!(js_number("Infinity"), Some(f64::INFINITY));
        assert_eq!(js_number("."), None);
        assert_eq!(js_number("12abc"), None);
        assert_eq!(js_number("NaN"), None);
        assert_eq!(js_number("inf"), None);
        assert_eq!(js_number("-0x10"), None);
        assert_eq!(js_number("1e"), None);
    }

    #[test]
    fn test_numeric_value_coercions() {
        assert_eq!(numeric_value(&json!(null)), Some(0.0));
        assert_eq!(numeric_value(&json!(true)), Some(1.0));
        assert_eq!(numeric_value(&json!("7")), Some(7.0));
        assert_eq!(numeric_value(&json!([1])), None);
    }

    #[test]
    fn test_display_and_format() {
        assert_eq!(display_value(&json!(120)), "120");
        assert_eq!(display_value(&json!(1.5)), "1.5");
        assert_eq!(display_value(&json!(null)), "");
        assert_eq!(format_number(100.0), "100");
        assert_eq!(format_number(-8.3), "-8.3");
        assert_eq!(humanize("completion_rate"), "completion rate");
    }
}
