//! Transforms raw backend events into normalised event batches.
//!
//! The transformer owns the backend handle, the main event switch, and the
//! sub-switches. A devices-changed or hierarchy-changed event rebuilds the
//! per-device state; every other event is offered to the sub-switches in
//! order until one claims it.

use std::time::Duration;

use crate::event::schema::DeviceType;
use crate::event::Data;
use crate::input::event_switch::EventSwitch;
use crate::input::pointer_key::PointerKeySwitch;
use crate::input::touch::TouchSwitch;
use crate::input::{
    Backend, InputEvent, RawEventKind, DEVICE_CLASS_KEYBOARD, DEVICE_CLASS_MOUSE,
    DEVICE_CLASS_TOUCHPAD, DEVICE_CLASS_TOUCHSCREEN,
};
use crate::pipeline::EventTransform;

/// Inter-event interval bookkeeping in backend-native time units.
#[derive(Debug, Default)]
pub struct IntervalTracker {
    previous: Option<u64>,
}

impl IntervalTracker {
    /// The interval since the previous event, or `None` on the first event
    /// or when time moves backwards. Updates the previous time either way.
    pub fn interval_for(&mut self, time: u64) -> Option<Duration> {
        let interval = match self.previous {
            Some(previous) if time >= previous => Some(Duration::from_micros(time - previous)),
            _ => None,
        };
        self.previous = Some(time);

        if let Some(interval) = interval {
            tracing::trace!("interval {} microseconds", interval.as_micros());
        }

        interval
    }
}

/// Transforms raw input events into the normalised record format.
pub struct Transformer<B> {
    backend: B,
    switch: EventSwitch,
    pointer_key: Option<PointerKeySwitch>,
    touch: Option<TouchSwitch>,
    intervals: IntervalTracker,
}

impl<B: Backend> Transformer<B> {
    fn new(backend: B, pointer_key: Option<PointerKeySwitch>, touch: Option<TouchSwitch>) -> Self {
        let mut transformer = Self {
            backend,
            switch: EventSwitch::new(),
            pointer_key,
            touch,
            intervals: IntervalTracker::default(),
        };
        transformer.refresh_devices();
        transformer
    }

    fn classify(device_class: Option<&str>) -> DeviceType {
        match device_class {
            Some(DEVICE_CLASS_MOUSE) => DeviceType::Mouse,
            Some(DEVICE_CLASS_KEYBOARD) => DeviceType::Keyboard,
            Some(DEVICE_CLASS_TOUCHPAD) => DeviceType::Touchpad,
            Some(DEVICE_CLASS_TOUCHSCREEN) => DeviceType::Touchscreen,
            _ => DeviceType::Unknown,
        }
    }

    /// Purge and rebuild the per-device maps from the backend's device
    /// list, recording the master pointer for subsequent pointer queries.
    pub fn refresh_devices(&mut self) {
        self.switch.clear();
        if let Some(pointer_key) = self.pointer_key.as_mut() {
            pointer_key.clear();
        }

        let devices = self.backend.list_devices();
        let pointer_id = devices
            .iter()
            .find(|device| device.master_pointer)
            .map(|device| device.id);

        for device in &devices {
            if !device.enabled {
                continue;
            }

            let device_type = Self::classify(device.device_class.as_deref());
            self.switch
                .refresh_device(&mut self.backend, pointer_id, device_type, device);
            if let Some(pointer_key) = self.pointer_key.as_mut() {
                pointer_key.refresh_device(pointer_id, device);
            }
        }
    }
}

impl<B: Backend> EventTransform<InputEvent> for Transformer<B> {
    fn transform_event(&mut self, event: InputEvent) -> Data {
        let mut data = Data::new();

        match event.raw().kind {
            RawEventKind::DeviceChanged | RawEventKind::HierarchyChanged => {
                self.refresh_devices();
                return data;
            }
            _ => {}
        }

        let mut claimed = false;
        if let Some(pointer_key) = self.pointer_key.as_mut() {
            claimed = pointer_key.switch_on_event(
                &mut self.backend,
                &event,
                &mut self.intervals,
                &self.switch,
                &mut data,
            );
        }
        if !claimed {
            if let Some(touch) = self.touch.as_mut() {
                touch.switch_on_event(
                    &mut self.backend,
                    &event,
                    &mut self.intervals,
                    &self.switch,
                    &mut data,
                );
            }
        }

        data
    }
}

/// Builder selecting which sub-switches a [`Transformer`] carries.
#[derive(Debug, Default)]
pub struct TransformerBuilder {
    pointer_key: bool,
    touch: bool,
}

impl TransformerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle pointer and key events.
    pub fn pointer_key(mut self) -> Self {
        self.pointer_key = true;
        self
    }

    /// Handle touch events.
    pub fn touch(mut self) -> Self {
        self.touch = true;
        self
    }

    pub fn build<B: Backend>(self, backend: B) -> Transformer<B> {
        Transformer::new(
            backend,
            self.pointer_key.then(PointerKeySwitch::new),
            self.touch.then(TouchSwitch::new),
        )
    }
}
