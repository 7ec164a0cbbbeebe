use regex::Regex;
use serde_json::Value;

/// Coerces a loosely-formatted scan value to a number. Scans come from scraped
/// game pages, so fields arrive as `1.234.567`, `12,5`, `"-"`, `"nan"`, plain
/// numbers, or garbage. Unparseable input maps to 0, never an error.
pub fn coerce_number(raw: &Value) -> f64 {
	match raw {
		Value::Number(number) => number.as_f64().filter(|value| value.is_finite()).unwrap_or(0.0),
		Value::String(text) => coerce_text(text),
		Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => 0.0,
	}
}

fn coerce_text(text: &str) -> f64 {
	let stripped: String = text.chars().filter(|ch| !ch.is_whitespace()).collect();

	if stripped.is_empty() || stripped == "-" || stripped.eq_ignore_ascii_case("nan") {
		return 0.0;
	}

	// Dots followed by a 3-digit run are thousands separators, not decimals.
	let ungrouped = match Regex::new(r"\.(\d{3})") {
		Ok(re) => re.replace_all(&stripped, "$1").into_owned(),
		Err(_) => stripped,
	};
	let decimal = ungrouped.replace(',', ".");

	match decimal.parse::<f64>() {
		Ok(value) if value.is_finite() => value,
		_ => 0.0,
	}
}
