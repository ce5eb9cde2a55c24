//! Result normalization
//!
//! Converts an operation's [`Returned`] tree into a JSON-safe value: a
//! primitive, an ordered sequence, or a string-keyed mapping. The conversion is
//! total; shapes without a JSON counterpart degrade to their string form.

use serde_json::{Map, Number, Value};

use crate::models::{Attribute, Returned};

/// Nesting depth beyond which subtrees are replaced by a placeholder string.
///
/// Results are wrapped in the envelope object, and serde_json decoders stop at
/// 128 nested levels, so normalized data never nests deeper than this.
pub const MAX_DEPTH: usize = 100;

const TOO_DEEP: &str = "<nested too deep>";

/// Normalize a returned value into JSON.
///
/// - primitives pass through (non-finite floats become `null`)
/// - mappings keep their keys, stringified when not already strings
/// - sequences keep their order
/// - tables become a list of `{column: cell}` rows
/// - series become a plain list of their values
/// - objects become a mapping of public, non-callable attributes
/// - opaque values become their `Display` text
pub fn normalize(value: Returned) -> Value {
    normalize_at(value, 0)
}

fn normalize_at(value: Returned, depth: usize) -> Value {
    if depth > MAX_DEPTH {
        return Value::String(TOO_DEEP.to_string());
    }
    let next = depth + 1;

    match value {
        Returned::Null => Value::Null,
        Returned::Bool(b) => Value::Bool(b),
        Returned::Int(i) => Value::Number(i.into()),
        Returned::Float(x) => float(x),
        Returned::Str(s) => Value::String(s),
        Returned::Json(v) => clip(v, depth),
        Returned::Seq(items) => Value::Array(
            items
                .into_iter()
                .map(|item| normalize_at(item, next))
                .collect(),
        ),
        Returned::Map(entries) => {
            let mut map = Map::new();
            for (key, val) in entries {
                map.insert(key_string(key, next), normalize_at(val, next));
            }
            Value::Object(map)
        }
        Returned::Table(table) => {
            let (columns, rows) = table.into_parts();
            Value::Array(
                rows.into_iter()
                    .map(|row| {
                        let record: Map<String, Value> = columns
                            .iter()
                            .cloned()
                            .zip(row.into_iter().map(|cell| normalize_at(cell, next + 1)))
                            .collect();
                        Value::Object(record)
                    })
                    .collect(),
            )
        }
        Returned::Series(series) => Value::Array(
            series
                .values
                .into_iter()
                .map(|v| normalize_at(v, next))
                .collect(),
        ),
        Returned::Object(object) => {
            let mut map = Map::new();
            for (name, attr) in object.into_attributes() {
                if name.starts_with('_') {
                    continue;
                }
                if let Attribute::Value(v) = attr {
                    map.insert(name, normalize_at(v, next));
                }
            }
            Value::Object(map)
        }
        Returned::Opaque(display) => Value::String(display.to_string()),
    }
}

/// Apply the depth guard to data that is already JSON
fn clip(value: Value, depth: usize) -> Value {
    if depth > MAX_DEPTH {
        return Value::String(TOO_DEEP.to_string());
    }
    match value {
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|v| clip(v, depth + 1)).collect())
        }
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, clip(v, depth + 1)))
                .collect(),
        ),
        other => other,
    }
}

fn float(x: f64) -> Value {
    Number::from_f64(x).map(Value::Number).unwrap_or(Value::Null)
}

fn key_string(key: Returned, depth: usize) -> String {
    match normalize_at(key, depth) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
