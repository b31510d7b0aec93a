//! Device kind — the closed set of simulated appliance types.

use serde::{Deserialize, Serialize};

/// The appliance type of a device. Fixed at creation; decides which state
/// keys are normalized and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Toggle,
    Sensor,
    Lock,
    Blind,
    Vacuum,
    Thermostat,
    Humidifier,
    Toaster,
    Doors,
}

impl DeviceKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Toggle,
        Self::Sensor,
        Self::Lock,
        Self::Blind,
        Self::Vacuum,
        Self::Thermostat,
        Self::Humidifier,
        Self::Toaster,
        Self::Doors,
    ];

    /// Lowercase name as used on the wire and in the catalog.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::Sensor => "sensor",
            Self::Lock => "lock",
            Self::Blind => "blind",
            Self::Vacuum => "vacuum",
            Self::Thermostat => "thermostat",
            Self::Humidifier => "humidifier",
            Self::Toaster => "toaster",
            Self::Doors => "doors",
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
