//! Per-kind normalization of incoming state values.
//!
//! The policy is a lookup keyed by `(kind, attribute)`. Keys without a rule
//! pass through unchanged. Normalization never fails: values that cannot be
//! interpreted collapse to the rule's in-domain default.

use super::kind::DeviceKind;
use super::value::StateValue;

/// Inclusive integer range for `position` / `level`.
pub const PERCENT_RANGE: (i64, i64) = (0, 100);

/// Inclusive range for thermostat `temperature`.
pub const TEMPERATURE_RANGE: (f64, f64) = (10.0, 30.0);

/// A normalization rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Round to the nearest integer, clamp to [`PERCENT_RANGE`].
    Percent,
    /// Clamp to [`TEMPERATURE_RANGE`] as a float.
    Temperature,
    /// Coerce to a boolean.
    Flag,
    /// Trim surrounding whitespace when textual.
    Mode,
}

/// Look up the rule for an attribute of a given kind.
#[must_use]
pub fn rule_for(kind: DeviceKind, key: &str) -> Option<Rule> {
    use DeviceKind::{
        Blind, Doors, Humidifier, Lock, Sensor, Thermostat, Toaster, Toggle, Vacuum,
    };

    match (kind, key) {
        (Blind | Humidifier, "position" | "level") => Some(Rule::Percent),
        (Thermostat, "temperature") => Some(Rule::Temperature),
        (Toggle | Lock | Sensor | Toaster | Doors | Vacuum, "on" | "open" | "locked") => {
            Some(Rule::Flag)
        }
        (Toggle | Lock | Sensor | Toaster | Doors | Vacuum, "mode") => Some(Rule::Mode),
        _ => None,
    }
}

/// Normalize one incoming value for `key` on a device of `kind`.
#[must_use]
pub fn normalize(kind: DeviceKind, key: &str, value: StateValue) -> StateValue {
    match rule_for(kind, key) {
        Some(rule) => rule.apply(value),
        None => value,
    }
}

impl Rule {
    /// Apply the rule to a value.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn apply(self, value: StateValue) -> StateValue {
        match self {
            Self::Percent => {
                let (min, max) = PERCENT_RANGE;
                let number = value.as_number().map_or(min, |number| {
                    number.round().clamp(min as f64, max as f64) as i64
                });
                StateValue::Int(number)
            }
            Self::Temperature => {
                let (min, max) = TEMPERATURE_RANGE;
                let number = value
                    .as_number()
                    .map_or(min, |number| number.clamp(min, max));
                StateValue::Float(number)
            }
            Self::Flag => StateValue::Bool(value.is_truthy()),
            Self::Mode => match value {
                StateValue::String(text) => StateValue::String(text.trim().to_string()),
                other => other,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_round_and_clamp_blind_position() {
        let cases = [
            (StateValue::Int(150), 100),
            (StateValue::Int(-5), 0),
            (StateValue::Float(42.6), 43),
            (StateValue::Float(42.4), 42),
            (StateValue::from("55"), 55),
            (StateValue::from("99.7"), 100),
        ];
        for (input, expected) in cases {
            assert_eq!(
                normalize(DeviceKind::Blind, "position", input),
                StateValue::Int(expected)
            );
        }
    }

    #[test]
    fn should_clamp_humidifier_level() {
        assert_eq!(
            normalize(DeviceKind::Humidifier, "level", StateValue::Int(250)),
            StateValue::Int(100)
        );
    }

    #[test]
    fn should_default_percent_to_zero_when_uninterpretable() {
        let value = StateValue::Json(serde_json::json!({"bad": true}));
        assert_eq!(
            normalize(DeviceKind::Blind, "position", value),
            StateValue::Int(0)
        );
        assert_eq!(
            normalize(DeviceKind::Blind, "position", StateValue::Bool(true)),
            StateValue::Int(0)
        );
    }

    #[test]
    fn should_clamp_thermostat_temperature_as_float() {
        assert_eq!(
            normalize(DeviceKind::Thermostat, "temperature", StateValue::Int(35)),
            StateValue::Float(30.0)
        );
        assert_eq!(
            normalize(DeviceKind::Thermostat, "temperature", StateValue::Float(4.5)),
            StateValue::Float(10.0)
        );
        assert_eq!(
            normalize(DeviceKind::Thermostat, "temperature", StateValue::Float(21.5)),
            StateValue::Float(21.5)
        );
    }

    #[test]
    fn should_default_temperature_to_lower_bound_when_uninterpretable() {
        assert_eq!(
            normalize(DeviceKind::Thermostat, "temperature", StateValue::from("hot")),
            StateValue::Float(10.0)
        );
    }

    #[test]
    fn should_coerce_flags_to_booleans() {
        let truthy = [
            StateValue::from("On"),
            StateValue::from("1"),
            StateValue::Int(1),
            StateValue::Bool(true),
        ];
        for value in truthy {
            assert_eq!(
                normalize(DeviceKind::Toggle, "on", value),
                StateValue::Bool(true)
            );
        }

        let falsy = [
            StateValue::Int(0),
            StateValue::from("off"),
            StateValue::Bool(false),
            StateValue::Json(serde_json::json!([])),
        ];
        for value in falsy {
            assert_eq!(
                normalize(DeviceKind::Lock, "locked", value),
                StateValue::Bool(false)
            );
        }
    }

    #[test]
    fn should_trim_textual_mode() {
        assert_eq!(
            normalize(DeviceKind::Vacuum, "mode", StateValue::from("  turbo ")),
            StateValue::from("turbo")
        );
    }

    #[test]
    fn should_pass_non_textual_mode_through() {
        assert_eq!(
            normalize(DeviceKind::Toaster, "mode", StateValue::Int(3)),
            StateValue::Int(3)
        );
    }

    #[test]
    fn should_pass_unknown_keys_through() {
        let value = StateValue::Json(serde_json::json!({"r": 255}));
        assert_eq!(
            normalize(DeviceKind::Toggle, "color", value.clone()),
            value
        );
    }

    #[test]
    fn should_not_apply_rules_outside_their_kind() {
        assert_eq!(rule_for(DeviceKind::Thermostat, "on"), None);
        assert_eq!(rule_for(DeviceKind::Blind, "temperature"), None);
        assert_eq!(rule_for(DeviceKind::Toggle, "position"), None);
    }

    #[test]
    fn should_cover_every_kind_with_at_least_one_rule() {
        let keys = ["on", "position", "temperature"];
        for kind in DeviceKind::ALL {
            assert!(
                keys.iter().any(|key| rule_for(kind, key).is_some()),
                "{kind} has no rule"
            );
        }
    }
}
