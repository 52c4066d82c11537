//! Field diffs for audit details
//!
//! Compares two serialized records and lists the fields that changed, with
//! nested objects flattened to dotted paths.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One changed field, values already formatted for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub before: String,
    pub after: String,
}

impl std::fmt::Display for FieldChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.before, self.after)
    }
}

/// List every changed field between `before` and `after`
///
/// Objects recurse; arrays of different length are reported as one change.
pub fn diff_fields(before: &Value, after: &Value) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    collect(before, after, "", &mut changes);
    changes
}

/// Join field changes into a single line, `None` when nothing changed
pub fn summarize(changes: &[FieldChange]) -> Option<String> {
    if changes.is_empty() {
        return None;
    }
    Some(
        changes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    )
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn collect(before: &Value, after: &Value, prefix: &str, out: &mut Vec<FieldChange>) {
    match (before, after) {
        (Value::Object(b), Value::Object(a)) => {
            for (key, before_val) in b {
                let path = join_path(prefix, key);
                match a.get(key) {
                    Some(after_val) => collect(before_val, after_val, &path, out),
                    None => out.push(FieldChange {
                        field: path,
                        before: format_value(before_val),
                        after: "(removed)".into(),
                    }),
                }
            }
            for (key, after_val) in a {
                if !b.contains_key(key) {
                    out.push(FieldChange {
                        field: join_path(prefix, key),
                        before: "(added)".into(),
                        after: format_value(after_val),
                    });
                }
            }
        }
        (Value::Array(b), Value::Array(a)) if b.len() == a.len() => {
            for (i, (bv, av)) in b.iter().zip(a).enumerate() {
                collect(bv, av, &format!("{}[{}]", prefix, i), out);
            }
        }
        _ if before != after => out.push(FieldChange {
            field: prefix.to_string(),
            before: format_value(before),
            after: format_value(after),
        }),
        _ => {}
    }
}

/// Format a JSON value for human-readable display
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.chars().count() > 50 => {
            format!("\"{}...\"", s.chars().take(47).collect::<String>())
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
