//! Operation descriptor models

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type category of an operation parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Float,
    Boolean,
    /// Ordered list of values
    Sequence,
    /// Object of string keys
    Mapping,
    /// Unconstrained (no declared type)
    Any,
}

impl ParamType {
    /// Whether this is one of the scalar categories
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ParamType::String | ParamType::Integer | ParamType::Float | ParamType::Boolean
        )
    }

    /// Check a supplied JSON value against this category.
    ///
    /// `null` is only accepted by [`ParamType::Any`]; the binder separately
    /// allows a value equal to the declared default.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::Any => true,
            ParamType::String => value.is_string(),
            ParamType::Integer => {
                value.is_i64() || value.is_u64() || integral_float(value).is_some()
            }
            ParamType::Float => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Sequence => value.is_array(),
            ParamType::Mapping => value.is_object(),
        }
    }

    /// Bring an accepted value into its canonical form.
    ///
    /// Integral floats such as `3.0` bound to an integer become `3`.
    pub fn coerce(&self, value: Value) -> Value {
        match (self, integral_float(&value)) {
            (ParamType::Integer, Some(i)) => Value::from(i),
            _ => value,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Float => "float",
            ParamType::Boolean => "boolean",
            ParamType::Sequence => "sequence",
            ParamType::Mapping => "mapping",
            ParamType::Any => "any",
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A float without a fractional part that fits in an `i64`
fn integral_float(value: &Value) -> Option<i64> {
    if !value.is_f64() {
        return None;
    }
    let f = value.as_f64()?;
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

/// One declared parameter of an operation.
///
/// A parameter is required exactly when it has no default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    name: String,
    #[serde(rename = "type")]
    param_type: ParamType,
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
}

impl ParamSpec {
    /// A parameter the caller must supply
    pub fn required(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            default: None,
        }
    }

    /// A parameter that falls back to `default` when not supplied
    pub fn optional(name: impl Into<String>, param_type: ParamType, default: Value) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            default: Some(default),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_type(&self) -> ParamType {
        self.param_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether `value` may be bound to this parameter
    pub fn accepts(&self, value: &Value) -> bool {
        self.param_type.accepts(value) || self.default.as_ref() == Some(value)
    }
}

/// Synthesized schema of one operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Operation name, unique within a routing table
    pub name: String,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameters in declaration order
    pub parameters: Vec<ParamSpec>,
    /// Whether calls to this operation are serialized (collaborator not reentrant)
    #[serde(default)]
    pub serialized: bool,
    /// Path to invoke this operation
    pub href: String,
}

impl OperationDescriptor {
    /// Look up a declared parameter by name
    pub fn parameter(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    /// Parameter names in declaration order
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name()).collect()
    }
}

/// Listing returned by `GET /api`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationList {
    pub items: Vec<OperationDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_rejects_fractional_numbers() {
        assert!(ParamType::Integer.accepts(&json!(3)));
        assert!(!ParamType::Integer.accepts(&json!(3.5)));
        assert!(ParamType::Integer.accepts(&json!(3.0)));
        assert!(!ParamType::Integer.accepts(&json!(1e300)));
        assert_eq!(ParamType::Integer.coerce(json!(3.0)), json!(3));
        assert_eq!(ParamType::Integer.coerce(json!(-1)), json!(-1));
        assert_eq!(ParamType::Float.coerce(json!(3.0)), json!(3.0));
        assert!(ParamType::Float.accepts(&json!(3)));
    }

    #[test]
    fn null_only_for_any_or_default() {
        assert!(ParamType::Any.accepts(&Value::Null));
        assert!(!ParamType::String.accepts(&Value::Null));

        let spec = ParamSpec::optional("token", ParamType::String, Value::Null);
        assert!(spec.accepts(&Value::Null));
    }

    #[test]
    fn required_iff_no_default() {
        assert!(ParamSpec::required("a", ParamType::Any).is_required());
        let opt = ParamSpec::optional("b", ParamType::String, json!("1d"));
        assert!(!opt.is_required());
        assert_eq!(opt.default(), Some(&json!("1d")));
    }

    #[test]
    fn spec_serializes_type_tag() {
        let spec = ParamSpec::optional("count", ParamType::Integer, json!(-1));
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            value,
            json!({"name": "count", "type": "integer", "required": false, "default": -1})
        );
    }
}
