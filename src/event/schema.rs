//! Schema definitions for event data: enumerations with their string and
//! underlying-integer encodings, and formatters for optional builder fields.
//!
//! Records carry every value as a string. Enumerations are encoded as their
//! underlying integer on the way into storage and rewritten to their name by
//! [`crate::event::Entry::to_named_representation`] on the JSON path. An
//! omitted optional always encodes as the empty string.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

/// Timestamp of an event, captured when the raw event is received.
pub type Timestamp = DateTime<Utc>;

/// Valid schema data types for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    String,
    Integer,
    Timestamp,
    Interval,
    Double,
}

/// The type of device that generated an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Mouse,
    Keyboard,
    Touchpad,
    Touchscreen,
    Unknown,
}

impl DeviceType {
    pub fn name(self) -> &'static str {
        match self {
            DeviceType::Mouse => "Mouse",
            DeviceType::Keyboard => "Keyboard",
            DeviceType::Touchpad => "Touchpad",
            DeviceType::Touchscreen => "Touchscreen",
            DeviceType::Unknown => "Unknown",
        }
    }

    pub fn underlying(self) -> u8 {
        match self {
            DeviceType::Mouse => 0,
            DeviceType::Keyboard => 1,
            DeviceType::Touchpad => 2,
            DeviceType::Touchscreen => 3,
            DeviceType::Unknown => 4,
        }
    }

    /// Parse the string encoding of the underlying value. Empty or invalid
    /// input yields `None`.
    pub fn from_underlying(value: &str) -> Option<Self> {
        match value.parse::<u8>().ok()? {
            0 => Some(DeviceType::Mouse),
            1 => Some(DeviceType::Keyboard),
            2 => Some(DeviceType::Touchpad),
            3 => Some(DeviceType::Touchscreen),
            4 => Some(DeviceType::Unknown),
            _ => None,
        }
    }
}

/// The action performed by a button or key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Press,
    Release,
    Repeat,
}

impl ButtonAction {
    pub fn name(self) -> &'static str {
        match self {
            ButtonAction::Press => "Press",
            ButtonAction::Release => "Release",
            ButtonAction::Repeat => "Repeat",
        }
    }

    pub fn underlying(self) -> u8 {
        match self {
            ButtonAction::Press => 0,
            ButtonAction::Release => 1,
            ButtonAction::Repeat => 2,
        }
    }

    pub fn from_underlying(value: &str) -> Option<Self> {
        match value.parse::<u8>().ok()? {
            0 => Some(ButtonAction::Press),
            1 => Some(ButtonAction::Release),
            2 => Some(ButtonAction::Repeat),
            _ => None,
        }
    }
}

/// A modifier key active at event time. The discriminants match the bit
/// positions of the backend's effective modifier mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierValue {
    Shift,
    CapsLock,
    Control,
    Alt,
    NumLock,
    Mod3,
    Super,
    Mod5,
}

impl ModifierValue {
    pub fn name(self) -> &'static str {
        match self {
            ModifierValue::Shift => "Shift",
            ModifierValue::CapsLock => "CapsLock",
            ModifierValue::Control => "Control",
            ModifierValue::Alt => "Alt",
            ModifierValue::NumLock => "NumLock",
            ModifierValue::Mod3 => "Mod3",
            ModifierValue::Super => "Super",
            ModifierValue::Mod5 => "Mod5",
        }
    }

    pub fn underlying(self) -> u8 {
        match self {
            ModifierValue::Shift => 0,
            ModifierValue::CapsLock => 1,
            ModifierValue::Control => 2,
            ModifierValue::Alt => 3,
            ModifierValue::NumLock => 4,
            ModifierValue::Mod3 => 5,
            ModifierValue::Super => 6,
            ModifierValue::Mod5 => 7,
        }
    }

    pub fn from_underlying(value: &str) -> Option<Self> {
        match value.parse::<u8>().ok()? {
            0 => Some(ModifierValue::Shift),
            1 => Some(ModifierValue::CapsLock),
            2 => Some(ModifierValue::Control),
            3 => Some(ModifierValue::Alt),
            4 => Some(ModifierValue::NumLock),
            5 => Some(ModifierValue::Mod3),
            6 => Some(ModifierValue::Super),
            7 => Some(ModifierValue::Mod5),
            _ => None,
        }
    }
}

/// Format an optional interval as its microsecond count.
pub fn from_interval(value: Option<Duration>) -> String {
    value.map(|v| v.as_micros().to_string()).unwrap_or_default()
}

/// Format an optional timestamp as RFC 3339.
pub fn from_timestamp(value: Option<Timestamp>) -> String {
    value
        .map(|v| v.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_default()
}

/// Format an optional double.
pub fn from_double(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Format an optional integer.
pub fn from_int(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Unwrap an optional string, defaulting to empty.
pub fn from_string(value: Option<String>) -> String {
    value.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_underlying_round_trips() {
        for device in [
            DeviceType::Mouse,
            DeviceType::Keyboard,
            DeviceType::Touchpad,
            DeviceType::Touchscreen,
            DeviceType::Unknown,
        ] {
            let encoded = device.underlying().to_string();
            assert_eq!(DeviceType::from_underlying(&encoded), Some(device));
        }
    }

    #[test]
    fn button_action_underlying_round_trips() {
        for action in [
            ButtonAction::Press,
            ButtonAction::Release,
            ButtonAction::Repeat,
        ] {
            let encoded = action.underlying().to_string();
            assert_eq!(ButtonAction::from_underlying(&encoded), Some(action));
        }
    }

    #[test]
    fn modifier_value_underlying_round_trips() {
        for modifier in [
            ModifierValue::Shift,
            ModifierValue::CapsLock,
            ModifierValue::Control,
            ModifierValue::Alt,
            ModifierValue::NumLock,
            ModifierValue::Mod3,
            ModifierValue::Super,
            ModifierValue::Mod5,
        ] {
            let encoded = modifier.underlying().to_string();
            assert_eq!(ModifierValue::from_underlying(&encoded), Some(modifier));
        }
    }

    #[test]
    fn from_underlying_rejects_empty_and_garbage() {
        assert_eq!(DeviceType::from_underlying(""), None);
        assert_eq!(ButtonAction::from_underlying("Press"), None);
        assert_eq!(ModifierValue::from_underlying("42"), None);
    }

    #[test]
    fn optional_formatters_encode_missing_values_as_empty() {
        assert_eq!(from_interval(None), "");
        assert_eq!(from_timestamp(None), "");
        assert_eq!(from_double(None), "");
        assert_eq!(from_int(None), "");
        assert_eq!(from_string(None), "");
    }

    #[test]
    fn interval_formats_as_microseconds() {
        assert_eq!(from_interval(Some(Duration::from_micros(125))), "125");
        assert_eq!(from_interval(Some(Duration::from_millis(3))), "3000");
    }
}
