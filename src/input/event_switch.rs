//! Main event switch: per-device bookkeeping shared by the sub-switches.
//!
//! Owns the device-type, device-name, and button-label maps, and assembles
//! move and click records with pointer, modifier, focus-window and
//! device-name context.

use std::collections::HashMap;
use std::time::Duration;

use crate::event::schema::{ButtonAction, DeviceType, ModifierValue, Timestamp};
use crate::event::{Data, Key, MouseClick, MouseMove, MouseScroll};
use crate::input::{Backend, DeviceInfo, RawEvent};

const SHIFT_MASK: u32 = 1 << 0;
const LOCK_MASK: u32 = 1 << 1;
const CONTROL_MASK: u32 = 1 << 2;
const MOD1_MASK: u32 = 1 << 3;
const MOD2_MASK: u32 = 1 << 4;
const MOD3_MASK: u32 = 1 << 5;
const MOD4_MASK: u32 = 1 << 6;
const MOD5_MASK: u32 = 1 << 7;

/// A builder that can record active modifiers.
pub trait ModifierBuilder {
    fn modifier(self, value: ModifierValue) -> Self;
}

/// A builder that can record focus-window geometry.
pub trait WindowBuilder {
    fn focus_window_name(self, name: String) -> Self;
    fn focus_window_position_x(self, x_pos: f64) -> Self;
    fn focus_window_position_y(self, y_pos: f64) -> Self;
    fn focus_window_width(self, width: f64) -> Self;
    fn focus_window_height(self, height: f64) -> Self;
}

/// A builder that can record the source device and screen.
pub trait DeviceBuilder {
    fn device_name(self, name: String) -> Self;
    fn screen(self, screen: i64) -> Self;
}

macro_rules! impl_builder_traits {
    ($($builder:ty),*) => {
        $(
            impl ModifierBuilder for $builder {
                fn modifier(self, value: ModifierValue) -> Self {
                    <$builder>::modifier(self, value)
                }
            }

            impl WindowBuilder for $builder {
                fn focus_window_name(self, name: String) -> Self {
                    <$builder>::focus_window_name(self, name)
                }

                fn focus_window_position_x(self, x_pos: f64) -> Self {
                    <$builder>::focus_window_position_x(self, x_pos)
                }

                fn focus_window_position_y(self, y_pos: f64) -> Self {
                    <$builder>::focus_window_position_y(self, y_pos)
                }

                fn focus_window_width(self, width: f64) -> Self {
                    <$builder>::focus_window_width(self, width)
                }

                fn focus_window_height(self, height: f64) -> Self {
                    <$builder>::focus_window_height(self, height)
                }
            }

            impl DeviceBuilder for $builder {
                fn device_name(self, name: String) -> Self {
                    <$builder>::device_name(self, name)
                }

                fn screen(self, screen: i64) -> Self {
                    <$builder>::screen(self, screen)
                }
            }
        )*
    };
}

impl_builder_traits!(Key, MouseClick, MouseMove, MouseScroll);

/// Device classification, button labels, and record assembly shared by
/// the pointer/key and touch switches.
#[derive(Debug, Default)]
pub struct EventSwitch {
    button_map: HashMap<i32, HashMap<i32, String>>,
    devices: HashMap<i32, DeviceType>,
    id_to_name: HashMap<i32, String>,
    pointer_id: i32,
}

impl EventSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all per-device state ahead of re-enumeration.
    pub fn clear(&mut self) {
        self.button_map.clear();
        self.devices.clear();
        self.id_to_name.clear();
    }

    /// Record one enumerated device.
    pub fn refresh_device<B: Backend>(
        &mut self,
        backend: &mut B,
        pointer_id: Option<i32>,
        device: DeviceType,
        info: &DeviceInfo,
    ) {
        if let Some(pointer_id) = pointer_id {
            self.pointer_id = pointer_id;
        }
        self.devices.insert(info.id, device);
        self.id_to_name.insert(info.id, info.name.clone());

        if !info.button_labels.is_empty() {
            self.set_button_map(backend, info);
        }
    }

    fn set_button_map<B: Backend>(&mut self, backend: &mut B, info: &DeviceInfo) {
        let Some(mapping) = backend.device_button_mapping(info.id, info.button_labels.len())
        else {
            return;
        };

        let buttons = self.button_map.entry(info.id).or_default();
        for (index, label) in info.button_labels.iter().enumerate() {
            if let (Some(label), Some(code)) = (label, mapping.get(index)) {
                buttons.insert(*code, label.clone());
            }
        }
    }

    pub fn pointer_id(&self) -> i32 {
        self.pointer_id
    }

    pub fn device(&self, device_id: i32) -> Option<DeviceType> {
        self.devices.get(&device_id).copied()
    }

    pub fn has_device(&self, device_id: i32) -> bool {
        self.devices.contains_key(&device_id)
    }

    pub fn button_name(&self, device_id: i32, button: i32) -> Option<&str> {
        self.button_map
            .get(&device_id)
            .and_then(|buttons| buttons.get(&button))
            .map(String::as_str)
    }

    /// Record every modifier set in the effective bitmask.
    pub fn set_modifier_state<T: ModifierBuilder>(modifier_state: u32, mut builder: T) -> T {
        if modifier_state & SHIFT_MASK != 0 {
            builder = builder.modifier(ModifierValue::Shift);
        }
        if modifier_state & LOCK_MASK != 0 {
            builder = builder.modifier(ModifierValue::CapsLock);
        }
        if modifier_state & CONTROL_MASK != 0 {
            builder = builder.modifier(ModifierValue::Control);
        }
        if modifier_state & MOD1_MASK != 0 {
            builder = builder.modifier(ModifierValue::Alt);
        }
        if modifier_state & MOD2_MASK != 0 {
            builder = builder.modifier(ModifierValue::NumLock);
        }
        if modifier_state & MOD3_MASK != 0 {
            builder = builder.modifier(ModifierValue::Mod3);
        }
        if modifier_state & MOD4_MASK != 0 {
            builder = builder.modifier(ModifierValue::Super);
        }
        if modifier_state & MOD5_MASK != 0 {
            builder = builder.modifier(ModifierValue::Mod5);
        }

        builder
    }

    /// Record the focused window's name and geometry.
    pub fn set_window_fields<B: Backend, T: WindowBuilder>(
        &self,
        backend: &mut B,
        mut builder: T,
    ) -> T {
        let mut window = backend.active_window();
        if window.is_none() {
            tracing::warn!("failed to get active window, falling back on focus window");
            window = backend.focus_window();
        }

        let Some(window) = window else {
            tracing::warn!("failed to get any focus window");
            return builder;
        };

        if let Some(name) = backend.window_name(window) {
            builder = builder.focus_window_name(name);
        }
        if let Some((x_pos, y_pos)) = backend.window_position(window) {
            builder = builder
                .focus_window_position_x(x_pos)
                .focus_window_position_y(y_pos);
        }
        if let Some((width, height)) = backend.window_size(window) {
            builder = builder.focus_window_width(width).focus_window_height(height);
        }

        builder
    }

    /// Record the source device's name and the screen.
    pub fn set_device_name_fields<T: DeviceBuilder>(
        &self,
        mut builder: T,
        event: &RawEvent,
        screen: i32,
    ) -> T {
        if let Some(name) = self.id_to_name.get(&event.source_id) {
            builder = builder.device_name(name.clone());
        }

        builder.screen(screen.into())
    }

    /// Assemble a mouse move record for the event.
    pub fn add_motion_event<B: Backend>(
        &self,
        backend: &mut B,
        event: &RawEvent,
        timestamp: Timestamp,
        interval: Option<Duration>,
        data: &mut Data,
    ) {
        let pointer = backend.query_pointer(self.pointer_id);

        let mut builder = MouseMove::new()
            .interval(interval)
            .timestamp(timestamp)
            .position_x(pointer.root_x)
            .position_y(pointer.root_y);
        if let Some(device) = self.device(event.source_id) {
            builder = builder.device(device);
        }

        let builder = Self::set_modifier_state(pointer.modifier_state, builder);
        let builder = self.set_window_fields(backend, builder);
        let builder = self.set_device_name_fields(builder, event, pointer.screen);

        builder.build(data);
    }

    /// Assemble a mouse click record for the event.
    pub fn add_button_event<B: Backend>(
        &self,
        backend: &mut B,
        event: &RawEvent,
        timestamp: Timestamp,
        interval: Option<Duration>,
        action: ButtonAction,
        button: i32,
        data: &mut Data,
    ) {
        let pointer = backend.query_pointer(self.pointer_id);

        let mut builder = MouseClick::new()
            .interval(interval)
            .timestamp(timestamp)
            .position_x(pointer.root_x)
            .position_y(pointer.root_y)
            .action(action)
            .button(button.into());
        if let Some(device) = self.device(event.source_id) {
            builder = builder.device(device);
        }
        if let Some(name) = self.button_name(event.source_id, button) {
            builder = builder.name(name.to_owned());
        }

        let builder = Self::set_modifier_state(pointer.modifier_state, builder);
        let builder = self.set_window_fields(backend, builder);
        let builder = self.set_device_name_fields(builder, event, pointer.screen);

        builder.build(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EntryType;
    use crate::input::mock::MockBackend;
    use crate::input::RawEventKind;
    use chrono::Utc;

    fn mouse_device() -> DeviceInfo {
        let mut info = DeviceInfo::new(8, "test mouse");
        info.button_labels = vec![
            Some("Button Left".to_owned()),
            None,
            Some("Button Right".to_owned()),
        ];
        info
    }

    fn switch_with_mouse(backend: &mut MockBackend) -> EventSwitch {
        let mut switch = EventSwitch::new();
        let info = mouse_device();
        switch.refresh_device(backend, Some(2), DeviceType::Mouse, &info);
        switch
    }

    #[test]
    fn refresh_records_device_type_and_button_labels() {
        let mut backend = MockBackend::new(vec![]);
        let switch = switch_with_mouse(&mut backend);

        assert!(switch.has_device(8));
        assert_eq!(switch.device(8), Some(DeviceType::Mouse));
        assert_eq!(switch.pointer_id(), 2);
        assert_eq!(switch.button_name(8, 1), Some("Button Left"));
        // Unlabelled buttons are not mapped.
        assert_eq!(switch.button_name(8, 2), None);
        assert_eq!(switch.button_name(8, 3), Some("Button Right"));
    }

    #[test]
    fn clear_purges_per_device_state() {
        let mut backend = MockBackend::new(vec![]);
        let mut switch = switch_with_mouse(&mut backend);

        switch.clear();

        assert!(!switch.has_device(8));
        assert_eq!(switch.button_name(8, 1), None);
    }

    #[test]
    fn modifier_state_decodes_each_bit() {
        let builder = MouseMove::new();
        let builder = EventSwitch::set_modifier_state(SHIFT_MASK | MOD1_MASK | MOD5_MASK, builder);

        let mut data = Data::new();
        builder.build(&mut data);

        assert_eq!(data.entries()[0].modifiers(), ["0", "3", "7"]);
    }

    #[test]
    fn motion_event_carries_pointer_and_window_context() {
        let mut backend = MockBackend::new(vec![]);
        backend.pointer.modifier_state = CONTROL_MASK;
        let switch = switch_with_mouse(&mut backend);

        let event = RawEvent::new(RawEventKind::Motion, 1000, 8);
        let mut data = Data::new();
        switch.add_motion_event(&mut backend, &event, Utc::now(), None, &mut data);

        let entry = &data.entries()[0];
        assert_eq!(entry.entry_type(), EntryType::MouseMove);
        assert_eq!(entry.data()[2], "100");
        assert_eq!(entry.data()[3], "200");
        assert_eq!(entry.data()[4], "test mouse");
        assert_eq!(entry.data()[5], "mock-window");
        assert_eq!(entry.data()[6], "10");
        assert_eq!(entry.data()[8], "800");
        assert_eq!(entry.data()[11], "0");
        assert_eq!(entry.modifiers(), ["2"]);
    }

    #[test]
    fn button_event_resolves_the_button_label() {
        let mut backend = MockBackend::new(vec![]);
        let switch = switch_with_mouse(&mut backend);

        let event = RawEvent::new(RawEventKind::ButtonPress, 1000, 8).detail(3);
        let mut data = Data::new();
        switch.add_button_event(
            &mut backend,
            &event,
            Utc::now(),
            None,
            ButtonAction::Press,
            3,
            &mut data,
        );

        let entry = &data.entries()[0];
        assert_eq!(entry.entry_type(), EntryType::MouseClick);
        assert_eq!(entry.data()[12], "3");
        assert_eq!(entry.data()[13], "Button Right");
        assert_eq!(entry.data()[14], "0");
    }

    #[test]
    fn missing_window_leaves_window_fields_empty() {
        let mut backend = MockBackend::new(vec![]);
        backend.window_name = None;
        backend.window_position = None;
        backend.window_size = None;
        let switch = switch_with_mouse(&mut backend);

        let event = RawEvent::new(RawEventKind::Motion, 1000, 8);
        let mut data = Data::new();
        switch.add_motion_event(&mut backend, &event, Utc::now(), None, &mut data);

        let entry = &data.entries()[0];
        assert_eq!(entry.data()[5], "");
        assert_eq!(entry.data()[6], "");
        assert_eq!(entry.data()[9], "");
    }
}
