//! Touch sub-switch.
//!
//! A touch begin emits a move and a press, an update emits a move, and an
//! end emits a move and a release, all assembled by the main switch.

use crate::event::schema::ButtonAction;
use crate::event::Data;
use crate::input::event_switch::EventSwitch;
use crate::input::transformer::IntervalTracker;
use crate::input::{Backend, InputEvent, RawEventKind};

/// Sub-switch handling touch events.
#[derive(Debug, Default)]
pub struct TouchSwitch;

impl TouchSwitch {
    pub fn new() -> Self {
        Self
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
            RawEventKind::TouchBegin => {
                Self::touch_motion(backend, event, intervals, switch, data);
                Self::touch_button(backend, event, intervals, ButtonAction::Press, switch, data);
                true
            }
            RawEventKind::TouchUpdate => {
                Self::touch_motion(backend, event, intervals, switch, data);
                true
            }
            RawEventKind::TouchEnd => {
                Self::touch_motion(backend, event, intervals, switch, data);
                Self::touch_button(backend, event, intervals, ButtonAction::Release, switch, data);
                true
            }
            _ => false,
        }
    }

    fn touch_motion<B: Backend>(
        backend: &mut B,
        event: &InputEvent,
        intervals: &mut IntervalTracker,
        switch: &EventSwitch,
        data: &mut Data,
    ) {
        let raw = event.raw();
        if switch.has_device(raw.source_id) {
            switch.add_motion_event(
                backend,
                raw,
                event.timestamp(),
                intervals.interval_for(raw.time),
                data,
            );
        }
    }

    fn touch_button<B: Backend>(
        backend: &mut B,
        event: &InputEvent,
        intervals: &mut IntervalTracker,
        action: ButtonAction,
        switch: &EventSwitch,
        data: &mut Data,
    ) {
        let raw = event.raw();
        if switch.has_device(raw.source_id) {
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
    }
}
