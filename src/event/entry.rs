//! Event entries and the per-type field dictionaries.
//!
//! Each entry type has a fixed, ordered list of fields. The dictionaries
//! extend one another: scroll and click extend move, key extends click. The
//! positional `data` vector of an [`Entry`] lines up with its type's
//! dictionary; storage sinks rely on this to name columns and JSON fields.

use crate::event::schema::{ButtonAction, DataType, DeviceType, ModifierValue};

/// A field's name and data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: &'static str,
    pub data_type: DataType,
}

const fn field(name: &'static str, data_type: DataType) -> FieldDefinition {
    FieldDefinition { name, data_type }
}

/// Field names for mouse move events.
pub const MOUSE_MOVE_FIELDS: [FieldDefinition; 12] = [
    field("interval", DataType::Interval),
    field("timestamp", DataType::Timestamp),
    field("position_x", DataType::Double),
    field("position_y", DataType::Double),
    field("device_name", DataType::String),
    field("focus_window_name", DataType::String),
    field("focus_window_position_x", DataType::Double),
    field("focus_window_position_y", DataType::Double),
    field("focus_window_width", DataType::Double),
    field("focus_window_height", DataType::Double),
    field("screen", DataType::Integer),
    field("device_type", DataType::String),
];

/// Field names for mouse scroll events (extends mouse move fields).
pub const MOUSE_SCROLL_FIELDS: [FieldDefinition; 14] = [
    field("interval", DataType::Interval),
    field("timestamp", DataType::Timestamp),
    field("position_x", DataType::Double),
    field("position_y", DataType::Double),
    field("device_name", DataType::String),
    field("focus_window_name", DataType::String),
    field("focus_window_position_x", DataType::Double),
    field("focus_window_position_y", DataType::Double),
    field("focus_window_width", DataType::Double),
    field("focus_window_height", DataType::Double),
    field("screen", DataType::Integer),
    field("device_type", DataType::String),
    field("scroll_vertical", DataType::Double),
    field("scroll_horizontal", DataType::Double),
];

/// Field names for mouse click events (extends mouse move fields).
pub const MOUSE_CLICK_FIELDS: [FieldDefinition; 15] = [
    field("interval", DataType::Interval),
    field("timestamp", DataType::Timestamp),
    field("position_x", DataType::Double),
    field("position_y", DataType::Double),
    field("device_name", DataType::String),
    field("focus_window_name", DataType::String),
    field("focus_window_position_x", DataType::Double),
    field("focus_window_position_y", DataType::Double),
    field("focus_window_width", DataType::Double),
    field("focus_window_height", DataType::Double),
    field("screen", DataType::Integer),
    field("device_type", DataType::String),
    field("button_id", DataType::Integer),
    field("button_name", DataType::String),
    field("button_action", DataType::String),
];

/// Field names for key events (extends mouse click fields).
pub const KEY_FIELDS: [FieldDefinition; 16] = [
    field("interval", DataType::Interval),
    field("timestamp", DataType::Timestamp),
    field("position_x", DataType::Double),
    field("position_y", DataType::Double),
    field("device_name", DataType::String),
    field("focus_window_name", DataType::String),
    field("focus_window_position_x", DataType::Double),
    field("focus_window_position_y", DataType::Double),
    field("focus_window_width", DataType::Double),
    field("focus_window_height", DataType::Double),
    field("screen", DataType::Integer),
    field("device_type", DataType::String),
    field("button_id", DataType::Integer),
    field("button_name", DataType::String),
    field("button_action", DataType::String),
    field("character", DataType::String),
];

/// An entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    Key,
    MouseClick,
    MouseMove,
    MouseScroll,
}

impl EntryType {
    pub fn name(self) -> &'static str {
        match self {
            EntryType::Key => "Key",
            EntryType::MouseClick => "MouseClick",
            EntryType::MouseMove => "MouseMove",
            EntryType::MouseScroll => "MouseScroll",
        }
    }

    /// The field dictionary for this entry type.
    pub fn fields(self) -> &'static [FieldDefinition] {
        match self {
            EntryType::Key => &KEY_FIELDS,
            EntryType::MouseClick => &MOUSE_CLICK_FIELDS,
            EntryType::MouseMove => &MOUSE_MOVE_FIELDS,
            EntryType::MouseScroll => &MOUSE_SCROLL_FIELDS,
        }
    }
}

/// An entry with its associated field names for easier processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryWithFields<'a> {
    pub entry_type: EntryType,
    pub fields: &'static [FieldDefinition],
    pub data: &'a [String],
    pub modifiers: &'a [String],
}

/// An entry contains data, modifiers, and its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    entry_type: EntryType,
    data: Vec<String>,
    modifiers: Vec<String>,
}

impl Entry {
    pub fn new(entry_type: EntryType, data: Vec<String>, modifiers: Vec<String>) -> Self {
        Self {
            entry_type,
            data,
            modifiers,
        }
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn data(&self) -> &[String] {
        &self.data
    }

    pub fn modifiers(&self) -> &[String] {
        &self.modifiers
    }

    /// Rewrite the integer-encoded enum fields to their named representation:
    /// the device type of move-shaped records, the button action of
    /// click-shaped records, and every modifier code.
    pub fn to_named_representation(&mut self) {
        let device_type_position = MOUSE_MOVE_FIELDS.len() - 1;
        if let Some(value) = self.data.get_mut(device_type_position) {
            *value = DeviceType::from_underlying(value)
                .map(|device| device.name().to_owned())
                .unwrap_or_default();
        }

        let button_action_position = MOUSE_CLICK_FIELDS.len() - 1;
        if let Some(value) = self.data.get_mut(button_action_position) {
            *value = ButtonAction::from_underlying(value)
                .map(|action| action.name().to_owned())
                .unwrap_or_default();
        }

        for modifier in &mut self.modifiers {
            *modifier = ModifierValue::from_underlying(modifier)
                .map(|value| value.name().to_owned())
                .unwrap_or_default();
        }
    }

    /// View the entry together with its field dictionary.
    pub fn with_fields(&self) -> EntryWithFields<'_> {
        EntryWithFields {
            entry_type: self.entry_type,
            fields: self.entry_type.fields(),
            data: &self.data,
            modifiers: &self.modifiers,
        }
    }
}
