//! Typed state values stored on devices.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The full state of a device, keyed by attribute name.
pub type DeviceState = BTreeMap<String, StateValue>;

/// A partial state sent by a caller; merged key by key into [`DeviceState`].
pub type StatePatch = BTreeMap<String, StateValue>;

/// A single state value.
///
/// Booleans, integers, floats and strings are the normal vocabulary.
/// Anything else (objects, arrays, `null`) is kept verbatim as JSON so
/// unknown attributes pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Json(serde_json::Value),
}

impl StateValue {
    /// Interpret the value as a number.
    ///
    /// Integers, floats and numeric strings are accepted alike. Returns
    /// `None` for anything else, including NaN.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        let number = match self {
            Self::Int(value) => *value as f64,
            Self::Float(value) => *value,
            Self::String(text) => text.trim().parse().ok()?,
            Self::Json(serde_json::Value::Number(number)) => number.as_f64()?,
            Self::Bool(_) | Self::Json(_) => return None,
        };
        (!number.is_nan()).then_some(number)
    }

    /// Interpret the value as a flag.
    ///
    /// `true`, any nonzero number, and the strings `"true"`, `"1"` and `"on"`
    /// (case-insensitive) are truthy. Everything else is `false`.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::String(text) => {
                text.eq_ignore_ascii_case("true") || text == "1" || text.eq_ignore_ascii_case("on")
            }
            Self::Int(_) | Self::Float(_) | Self::Json(serde_json::Value::Number(_)) => {
                self.as_number().is_some_and(|number| number != 0.0)
            }
            Self::Json(_) => false,
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_deserialize_integer_as_int_variant() {
        let val: StateValue = serde_json::from_str("42").unwrap();
        assert_eq!(val, StateValue::Int(42));
    }

    #[test]
    fn should_deserialize_fraction_as_float_variant() {
        let val: StateValue = serde_json::from_str("21.5").unwrap();
        assert_eq!(val, StateValue::Float(21.5));
    }

    #[test]
    fn should_deserialize_object_as_json_variant() {
        let val: StateValue = serde_json::from_str(r#"{"nested": "value"}"#).unwrap();
        assert!(matches!(val, StateValue::Json(_)));
    }

    #[test]
    fn should_serialize_scalars_without_wrapping() {
        assert_eq!(serde_json::to_string(&StateValue::Bool(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&StateValue::from("eco")).unwrap(), "\"eco\"");
    }

    #[test]
    fn should_read_numbers_from_every_numeric_representation() {
        assert_eq!(StateValue::Int(7).as_number(), Some(7.0));
        assert_eq!(StateValue::Float(7.5).as_number(), Some(7.5));
        assert_eq!(StateValue::from(" 7.5 ").as_number(), Some(7.5));
        assert_eq!(StateValue::Json(serde_json::json!(7)).as_number(), Some(7.0));
    }

    #[test]
    fn should_not_read_numbers_from_booleans_objects_or_nan() {
        assert_eq!(StateValue::Bool(true).as_number(), None);
        assert_eq!(StateValue::Json(serde_json::json!({})).as_number(), None);
        assert_eq!(StateValue::from("NaN").as_number(), None);
        assert_eq!(StateValue::from("warm").as_number(), None);
    }

    #[test]
    fn should_treat_on_one_and_true_as_truthy() {
        assert!(StateValue::from("On").is_truthy());
        assert!(StateValue::from("1").is_truthy());
        assert!(StateValue::from("TRUE").is_truthy());
        assert!(StateValue::Int(1).is_truthy());
        assert!(StateValue::Float(-0.5).is_truthy());
        assert!(StateValue::Bool(true).is_truthy());
    }

    #[test]
    fn should_treat_off_zero_and_other_types_as_falsy() {
        assert!(!StateValue::Int(0).is_truthy());
        assert!(!StateValue::from("off").is_truthy());
        assert!(!StateValue::from("yes").is_truthy());
        assert!(!StateValue::Bool(false).is_truthy());
        assert!(!StateValue::Json(serde_json::json!({"on": true})).is_truthy());
        assert!(!StateValue::Json(serde_json::Value::Null).is_truthy());
    }
}
