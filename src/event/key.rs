//! Builder for keyboard events.

use std::time::Duration;

use crate::event::data::Data;
use crate::event::entry::{Entry, EntryType};
use crate::event::schema::{
    from_double, from_int, from_interval, from_string, from_timestamp, ButtonAction, DeviceType,
    ModifierValue, Timestamp,
};

/// Builds a key event. Fields left unset encode as empty strings.
#[derive(Debug, Clone, Default)]
pub struct Key {
    interval: Option<Duration>,
    timestamp: Option<Timestamp>,
    device: Option<DeviceType>,
    position_x: Option<f64>,
    position_y: Option<f64>,
    action: Option<ButtonAction>,
    button: Option<i64>,
    name: Option<String>,
    character: Option<String>,
    device_name: Option<String>,
    focus_window_name: Option<String>,
    focus_window_position_x: Option<f64>,
    focus_window_position_y: Option<f64>,
    focus_window_width: Option<f64>,
    focus_window_height: Option<f64>,
    screen: Option<i64>,
    modifiers: Vec<String>,
}

impl Key {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interval(mut self, interval: impl Into<Option<Duration>>) -> Self {
        self.interval = interval.into();
        self
    }

    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn device(mut self, device: DeviceType) -> Self {
        self.device = Some(device);
        self
    }

    pub fn position_x(mut self, x_pos: f64) -> Self {
        self.position_x = Some(x_pos);
        self
    }

    pub fn position_y(mut self, y_pos: f64) -> Self {
        self.position_y = Some(y_pos);
        self
    }

    pub fn action(mut self, action: ButtonAction) -> Self {
        self.action = Some(action);
        self
    }

    /// The key's identifier (keycode).
    pub fn button(mut self, button: i64) -> Self {
        self.button = Some(button);
        self
    }

    /// The key's symbol name.
    pub fn name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// The printable character produced by the key, if any.
    pub fn character(mut self, character: String) -> Self {
        self.character = Some(character);
        self
    }

    pub fn device_name(mut self, device_name: String) -> Self {
        self.device_name = Some(device_name);
        self
    }

    pub fn focus_window_name(mut self, name: String) -> Self {
        self.focus_window_name = Some(name);
        self
    }

    pub fn focus_window_position_x(mut self, x_pos: f64) -> Self {
        self.focus_window_position_x = Some(x_pos);
        self
    }

    pub fn focus_window_position_y(mut self, y_pos: f64) -> Self {
        self.focus_window_position_y = Some(y_pos);
        self
    }

    pub fn focus_window_width(mut self, width: f64) -> Self {
        self.focus_window_width = Some(width);
        self
    }

    pub fn focus_window_height(mut self, height: f64) -> Self {
        self.focus_window_height = Some(height);
        self
    }

    pub fn screen(mut self, screen: i64) -> Self {
        self.screen = Some(screen);
        self
    }

    pub fn modifier(mut self, modifier: ModifierValue) -> Self {
        self.modifiers.push(modifier.underlying().to_string());
        self
    }

    /// Build the key event into the data batch.
    pub fn build(self, data: &mut Data) {
        let entry = Entry::new(
            EntryType::Key,
            vec![
                from_interval(self.interval),
                from_timestamp(self.timestamp),
                from_double(self.position_x),
                from_double(self.position_y),
                from_string(self.device_name),
                from_string(self.focus_window_name),
                from_double(self.focus_window_position_x),
                from_double(self.focus_window_position_y),
                from_double(self.focus_window_width),
                from_double(self.focus_window_height),
                from_int(self.screen),
                self.device
                    .map(|d| d.underlying().to_string())
                    .unwrap_or_default(),
                from_int(self.button),
                from_string(self.name),
                self.action
                    .map(|a| a.underlying().to_string())
                    .unwrap_or_default(),
                from_string(self.character),
            ],
            self.modifiers,
        );

        data.add_entry(entry);
    }
}
