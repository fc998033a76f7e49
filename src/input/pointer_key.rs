//! Pointer and key sub-switch.
//!
//! Owns the per-device scroll-valuator and x/y-valuator maps. Motion events
//! are emitted only when a changed valuator matches the device's x or y
//! axis; scroll records are derived from scroll-class valuators; wheel
//! button presses and pointer-emulated events are suppressed.

use crate::event::schema::ButtonAction;
use crate::event::{Data, Key, MouseScroll};
use crate::input::event_switch::EventSwitch;
use crate::input::transformer::IntervalTracker;
use crate::input::{
    Backend, DeviceInfo, InputEvent, RawEventKind, ScrollOrientation, AXIS_ABS_X, AXIS_ABS_Y,
    AXIS_REL_X, AXIS_REL_Y, BUTTON_HORIZ_WHEEL_LEFT, BUTTON_HORIZ_WHEEL_RIGHT, BUTTON_WHEEL_DOWN,
    BUTTON_WHEEL_UP,
};
use std::collections::HashMap;

/// Sub-switch handling motion, button, scroll and key events.
#[derive(Debug, Default)]
pub struct PointerKeySwitch {
    scroll_map: HashMap<i32, HashMap<usize, ScrollOrientation>>,
    valuator_x: HashMap<i32, usize>,
    valuator_y: HashMap<i32, usize>,
    pointer_id: i32,
}

impl PointerKeySwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all per-device state ahead of re-enumeration.
    pub fn clear(&mut self) {
        self.scroll_map.clear();
        self.valuator_x.clear();
        self.valuator_y.clear();
    }

    /// Record the scroll and axis valuators of one enumerated device.
    pub fn refresh_device(&mut self, pointer_id: Option<i32>, info: &DeviceInfo) {
        if let Some(pointer_id) = pointer_id {
            self.pointer_id = pointer_id;
        }

        for scroll in &info.scroll_classes {
            self.scroll_map
                .entry(info.id)
                .or_default()
                .insert(scroll.valuator, scroll.orientation);
        }

        for valuator in &info.valuators {
            match valuator.label.as_deref() {
                Some(AXIS_REL_X) | Some(AXIS_ABS_X) => {
                    self.valuator_x.insert(info.id, valuator.index);
                }
                Some(AXIS_REL_Y) | Some(AXIS_ABS_Y) => {
                    self.valuator_y.insert(info.id, valuator.index);
                }
                _ => {}
            }
        }
    }

    /// Process the event if this switch claims its kind. Returns whether
    /// the event was claimed.
    pub fn switch_on_event<B: Backend>(
        &mut self,
        backend: &mut B,
        event: &InputEvent,
        intervals: &mut IntervalTracker,
        switch: &EventSwitch,
        data: &mut Data,
    ) -> bool {
        match event.raw().kind {
            RawEventKind::Motion => {
                self.motion_event(backend, event, intervals, switch, data);
                self.scroll_event(backend, event, intervals, switch, data);
                true
            }
            RawEventKind::ButtonPress => {
                Self::button_event(backend, event, intervals, ButtonAction::Press, switch, data);
                true
            }
            RawEventKind::ButtonRelease => {
                Self::button_event(backend, event, intervals, ButtonAction::Release, switch, data);
                true
            }
            RawEventKind::KeyPress | RawEventKind::KeyRelease => {
                self.key_event(backend, event, intervals, switch, data);
                true
            }
            _ => false,
        }
    }

    fn button_event<B: Backend>(
        backend: &mut B,
        event: &InputEvent,
        intervals: &mut IntervalTracker,
        action: ButtonAction,
        switch: &EventSwitch,
        data: &mut Data,
    ) {
        let raw = event.raw();
        let button = switch.button_name(raw.source_id, raw.detail).unwrap_or("");
        if !switch.has_device(raw.source_id)
            || raw.pointer_emulated
            || button == BUTTON_WHEEL_UP
            || button == BUTTON_WHEEL_DOWN
            || button == BUTTON_HORIZ_WHEEL_LEFT
            || button == BUTTON_HORIZ_WHEEL_RIGHT
        {
            return;
        }

        switch.add_button_event(
            backend,
            raw,
            event.timestamp(),
            intervals.interval_for(raw.time),
            action,
            raw.detail,
            data,
        );
    }

    fn key_event<B: Backend>(
        &self,
        backend: &mut B,
        event: &InputEvent,
        intervals: &mut IntervalTracker,
        switch: &EventSwitch,
        data: &mut Data,
    ) {
        let raw = event.raw();
        if !switch.has_device(raw.source_id) {
            return;
        }

        let pointer = backend.query_pointer(self.pointer_id);
        let lookup = backend.lookup_key(raw, &pointer);

        let action = if raw.kind == RawEventKind::KeyRelease {
            ButtonAction::Release
        } else if raw.key_repeat {
            ButtonAction::Repeat
        } else {
            ButtonAction::Press
        };

        let mut builder = Key::new()
            .interval(intervals.interval_for(raw.time))
            .timestamp(event.timestamp())
            .position_x(pointer.root_x)
            .position_y(pointer.root_y)
            .action(action)
            .button(raw.detail.into())
            .character(lookup.character.unwrap_or_default())
            .name(lookup.symbol);
        if let Some(device) = switch.device(raw.source_id) {
            builder = builder.device(device);
        }

        let builder = EventSwitch::set_modifier_state(pointer.modifier_state, builder);
        let builder = switch.set_window_fields(backend, builder);
        let builder = switch.set_device_name_fields(builder, raw, pointer.screen);

        builder.build(data);
    }

    fn scroll_event<B: Backend>(
        &self,
        backend: &mut B,
        event: &InputEvent,
        intervals: &mut IntervalTracker,
        switch: &EventSwitch,
        data: &mut Data,
    ) {
        let raw = event.raw();
        let Some(scroll_valuators) = self.scroll_map.get(&raw.source_id) else {
            return;
        };
        if !switch.has_device(raw.source_id) || raw.pointer_emulated {
            return;
        }

        let mut builder = MouseScroll::new();
        let mut scrolled = false;
        for (valuator, orientation) in scroll_valuators {
            let Some(value) = raw.valuators.get(valuator) else {
                continue;
            };

            scrolled = true;
            builder = match orientation {
                ScrollOrientation::Horizontal => builder.horizontal(*value),
                ScrollOrientation::Vertical => builder.vertical(*value),
            };
        }

        if !scrolled {
            return;
        }

        let pointer = backend.query_pointer(self.pointer_id);
        let mut builder = builder
            .interval(intervals.interval_for(raw.time))
            .timestamp(event.timestamp())
            .position_x(pointer.root_x)
            .position_y(pointer.root_y);
        if let Some(device) = switch.device(raw.source_id) {
            builder = builder.device(device);
        }

        let builder = EventSwitch::set_modifier_state(pointer.modifier_state, builder);
        let builder = switch.set_window_fields(backend, builder);
        let builder = switch.set_device_name_fields(builder, raw, pointer.screen);

        builder.build(data);
    }

    fn motion_event<B: Backend>(
        &self,
        backend: &mut B,
        event: &InputEvent,
        intervals: &mut IntervalTracker,
        switch: &EventSwitch,
        data: &mut Data,
    ) {
        let raw = event.raw();
        if !switch.has_device(raw.source_id) || raw.pointer_emulated {
            return;
        }

        let moved = raw.valuators.keys().any(|valuator| {
            self.valuator_x.get(&raw.source_id) == Some(valuator)
                || self.valuator_y.get(&raw.source_id) == Some(valuator)
        });

        if moved {
            switch.add_motion_event(
                backend,
                raw,
                event.timestamp(),
                intervals.interval_for(raw.time),
                data,
            );
        }
    }
}
