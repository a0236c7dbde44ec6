//! Input sanitization applied to every string before submission.

use serde_json::{Map, Value};

/// Entities produced by [`sanitize_str`]. An `&` that already opens one of
/// these is kept as-is so sanitizing twice changes nothing.
const ENTITIES: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&#x27;"];

/// Trim surrounding whitespace and HTML-escape `& < > " '`.
pub fn sanitize_str(input: &str) -> String {
    let trimmed = input.trim();
    let mut out = String::with_capacity(trimmed.len());

    for (i, c) in trimmed.char_indices() {
        match c {
            '&' if ENTITIES.iter().any(|e| trimmed[i..].starts_with(e)) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }

    out
}

/// Sanitize every string inside a JSON value, recursing into arrays and objects.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_str(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(sanitize_payload(map)),
        other => other,
    }
}

/// Sanitize every string field of a form payload.
pub fn sanitize_payload(payload: Map<String, Value>) -> Map<String, Value> {
    payload
        .into_iter()
        .map(|(key, value)| (key, sanitize_value(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trims_and_escapes() {
        assert_eq!(sanitize_str("  hello  "), "hello");
        assert_eq!(
            sanitize_str(r#"<script>alert("x")</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"
        );
        assert_eq!(sanitize_str("Tom & Jerry's"), "Tom &amp; Jerry&#x27;s");
        assert_eq!(sanitize_str(""), "");
        assert_eq!(sanitize_str(" \t\n"), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "plain",
            "  padded  ",
            "a & b",
            "&amp; already",
            "&am",
            "x&lt;y",
            r#"<a href="x">'q'</a>"#,
            "&&&;",
            "émoji 🎵 & <b>",
            " & ",
        ];
        for sample in samples {
            let once = sanitize_str(sample);
            assert_eq!(sanitize_str(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_payload_only_touches_strings() {
        let payload = json!({
            "name": "  <Nova>  ",
            "budget": 1200,
            "active": true,
            "tags": [" rock ", "r&b"],
            "contact": {"email": " a@b.co "},
            "notes": null
        });
        let Value::Object(map) = payload else { unreachable!() };

        let sanitized = Value::Object(sanitize_payload(map));
        assert_eq!(
            sanitized,
            json!({
                "name": "&lt;Nova&gt;",
                "budget": 1200,
                "active": true,
                "tags": ["rock", "r&amp;b"],
                "contact": {"email": "a@b.co"},
                "notes": null
            })
        );
    }
}
