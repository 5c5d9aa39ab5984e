//! Body normalization.
//!
//! Upstream documents embed HTML-escaped text inside JSON string values
//! (`"name": "Shadow &amp; Flame"`). Bodies are stored and parsed with the
//! entities resolved.

use regex::{Captures, Regex};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,6});").expect("entity pattern")
});

/// Resolve named and numeric character references. Unknown references are
/// left as written.
pub fn unescape_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    ENTITY.replace_all(text, |caps: &Captures<'_>| {
        let reference = &caps[1];
        decode_reference(reference).map_or_else(|| caps[0].to_string(), String::from)
    })
}

fn decode_reference(reference: &str) -> Option<char> {
    if let Some(numeric) = reference.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse().ok()?,
        };
        return char::from_u32(code);
    }
    match reference {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "ndash" => Some('\u{2013}'),
        "mdash" => Some('\u{2014}'),
        _ => None,
    }
}

/// Unescape entities inside every JSON string value (keys included). A body
/// that is not JSON is unescaped as plain text.
pub fn normalize_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(mut value) => {
            unescape_value(&mut value);
            value.to_string()
        }
        Err(_) => unescape_entities(body).into_owned(),
    }
}

fn unescape_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            if let Cow::Owned(unescaped) = unescape_entities(s) {
                *s = unescaped;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(unescape_value),
        Value::Object(map) => {
            let escaped_keys: Vec<String> = map
                .keys()
                .filter(|k| matches!(unescape_entities(k), Cow::Owned(_)))
                .cloned()
                .collect();
            for key in escaped_keys {
                if let Some(v) = map.remove(&key) {
                    map.insert(unescape_entities(&key).into_owned(), v);
                }
            }
            map.values_mut().for_each(unescape_value);
        }
        _ => {}
    }
}
