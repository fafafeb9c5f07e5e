//! JSON location helpers for model responses
//!
//! Model responses often wrap the JSON payload in extra prose before
//! and after. These helpers find the first complete JSON object or
//! array by matching delimiters, then parse it.

use serde_json::Value;

use crate::error::{Error, Result};

/// Truncate long raw responses for error messages. Cuts on a char
/// boundary so multibyte text never panics the error path.
fn truncate(raw: &str) -> String {
    match raw.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &raw[..idx]),
        None => raw.to_string(),
    }
}

/// Find the first balanced region starting at `open` and ending at the
/// matching `close`, ignoring delimiters inside string literals.
fn balanced_region(response: &str, open: char, close: char) -> Option<&str> {
    let start = response.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in response[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&response[start..=start + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract and parse the first JSON object from a model response
pub fn extract_json_object(response: &str) -> Result<Value> {
    let response = response.trim();
    let json_str = balanced_region(response, '{', '}').ok_or_else(|| {
        Error::ModelOutputInvalid(format!(
            "No JSON object found in model response | Raw: {}",
            truncate(response)
        ))
    })?;

    serde_json::from_str(json_str).map_err(|e| {
        Error::ModelOutputInvalid(format!(
            "Invalid JSON from model: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })
}

/// Extract and parse the first JSON array from a model response
///
/// Falls back to a single object (wrapped into a one-element array)
/// when the model returned an object where a list was asked for.
pub fn extract_json_array(response: &str) -> Result<Vec<Value>> {
    let response = response.trim();

    let array_start = response.find('[');
    let object_start = response.find('{');

    // Prefer the array unless an object opens first (the model may have
    // returned `{"transactions": [...]}`-style wrapping) or no array is
    // present at all.
    let object_wins = match (array_start, object_start) {
        (Some(a), Some(o)) => o < a,
        (None, Some(_)) => true,
        _ => false,
    };
    if object_wins {
        let value = extract_json_object(response)?;
        if let Some(object) = value.as_object() {
            // Unwrap a single array-valued key.
            let mut arrays = object.values().filter_map(|v| v.as_array());
            if let Some(items) = arrays.next() {
                return Ok(items.clone());
            }
        }
        return Ok(vec![value]);
    }

    let json_str = balanced_region(response, '[', ']').ok_or_else(|| {
        Error::ModelOutputInvalid(format!(
            "No JSON array found in model response | Raw: {}",
            truncate(response)
        ))
    })?;

    let value: Value = serde_json::from_str(json_str).map_err(|e| {
        Error::ModelOutputInvalid(format!(
            "Invalid JSON from model: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })?;

    match value {
        Value::Array(items) => Ok(items),
        other => Ok(vec![other]),
    }
}
