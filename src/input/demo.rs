//! Synthetic backend and event source.
//!
//! Generates a plausible stream of raw events so the whole pipeline can be
//! exercised end to end without a host windowing system. Used by the
//! `--simulate` flag and nothing else.

use std::collections::VecDeque;
use std::time::Duration;

use crate::error::Result;
use crate::input::{
    Backend, DeviceInfo, InputEvent, KeyLookup, PointerQuery, RawEvent, RawEventKind, ScrollClass,
    ScrollOrientation, ValuatorClass, WindowId, AXIS_ABS_X, AXIS_ABS_Y, AXIS_REL_X, AXIS_REL_Y,
    DEVICE_CLASS_KEYBOARD, DEVICE_CLASS_MOUSE, DEVICE_CLASS_TOUCHSCREEN,
};
use crate::pipeline::{NextEvent, StopHandle};

const MASTER_POINTER_ID: i32 = 2;
const MOUSE_ID: i32 = 8;
const KEYBOARD_ID: i32 = 9;
const TOUCHSCREEN_ID: i32 = 10;

/// Keycode, printable character, and symbol name of the simulated keys.
const KEYS: [(i32, Option<&str>, &str); 4] = [
    (38, Some("a"), "a"),
    (40, Some("d"), "d"),
    (36, None, "Return"),
    (50, None, "Shift_L"),
];

/// A canned backend answering device and pointer queries for the
/// simulated device set.
pub struct DemoBackend {
    pointer: PointerQuery,
}

impl DemoBackend {
    pub fn new() -> Self {
        Self {
            pointer: PointerQuery {
                root_x: 512.0,
                root_y: 384.0,
                modifier_state: 0,
                screen: 0,
            },
        }
    }

    fn mouse() -> DeviceInfo {
        let mut info = DeviceInfo::new(MOUSE_ID, "simulated mouse");
        info.device_class = Some(DEVICE_CLASS_MOUSE.to_owned());
        info.button_labels = vec![
            Some("Button Left".to_owned()),
            Some("Button Middle".to_owned()),
            Some("Button Right".to_owned()),
            Some(crate::input::BUTTON_WHEEL_UP.to_owned()),
            Some(crate::input::BUTTON_WHEEL_DOWN.to_owned()),
        ];
        info.valuators = vec![
            ValuatorClass {
                index: 0,
                label: Some(AXIS_REL_X.to_owned()),
            },
            ValuatorClass {
                index: 1,
                label: Some(AXIS_REL_Y.to_owned()),
            },
            ValuatorClass {
                index: 3,
                label: Some("Rel Vert Scroll".to_owned()),
            },
        ];
        info.scroll_classes = vec![ScrollClass {
            valuator: 3,
            orientation: ScrollOrientation::Vertical,
        }];
        info
    }

    fn keyboard() -> DeviceInfo {
        let mut info = DeviceInfo::new(KEYBOARD_ID, "simulated keyboard");
        info.device_class = Some(DEVICE_CLASS_KEYBOARD.to_owned());
        info
    }

    fn touchscreen() -> DeviceInfo {
        let mut info = DeviceInfo::new(TOUCHSCREEN_ID, "simulated touchscreen");
        info.device_class = Some(DEVICE_CLASS_TOUCHSCREEN.to_owned());
        info.valuators = vec![
            ValuatorClass {
                index: 0,
                label: Some(AXIS_ABS_X.to_owned()),
            },
            ValuatorClass {
                index: 1,
                label: Some(AXIS_ABS_Y.to_owned()),
            },
        ];
        info
    }
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for DemoBackend {
    fn list_devices(&mut self) -> Vec<DeviceInfo> {
        let mut master = DeviceInfo::new(MASTER_POINTER_ID, "Virtual core pointer");
        master.master_pointer = true;

        vec![
            master,
            Self::mouse(),
            Self::keyboard(),
            Self::touchscreen(),
        ]
    }

    fn device_button_mapping(&mut self, _device_id: i32, map_size: usize) -> Option<Vec<i32>> {
        Some((1..=map_size as i32).collect())
    }

    fn query_pointer(&mut self, _pointer_id: i32) -> PointerQuery {
        // Drift the pointer so successive records differ.
        self.pointer.root_x = (self.pointer.root_x + 7.0) % 1920.0;
        self.pointer.root_y = (self.pointer.root_y + 3.0) % 1080.0;
        self.pointer.clone()
    }

    fn active_window(&mut self) -> Option<WindowId> {
        Some(WindowId(1))
    }

    fn focus_window(&mut self) -> Option<WindowId> {
        Some(WindowId(1))
    }

    fn window_name(&mut self, _window: WindowId) -> Option<String> {
        Some("simulated window".to_owned())
    }

    fn window_position(&mut self, _window: WindowId) -> Option<(f64, f64)> {
        Some((0.0, 0.0))
    }

    fn window_size(&mut self, _window: WindowId) -> Option<(f64, f64)> {
        Some((1920.0, 1080.0))
    }

    fn lookup_key(&mut self, event: &RawEvent, _pointer: &PointerQuery) -> KeyLookup {
        KEYS.iter()
            .find(|(detail, _, _)| *detail == event.detail)
            .map(|(_, character, symbol)| KeyLookup {
                character: character.map(str::to_owned),
                symbol: (*symbol).to_owned(),
            })
            .unwrap_or_default()
    }
}

/// Generate `count` raw events cycling through motion, clicks, keys,
/// scrolls and touches.
fn demo_events(count: usize) -> VecDeque<RawEvent> {
    let mut events = VecDeque::with_capacity(count);

    for index in 0..count {
        let time = 1_000 + (index as u64) * 8_000;
        let event = match index % 10 {
            0 => RawEvent::new(RawEventKind::Motion, time, MOUSE_ID)
                .valuator(0, 4.0)
                .valuator(1, -2.0),
            1 => RawEvent::new(RawEventKind::Motion, time, MOUSE_ID).valuator(1, 5.0),
            2 => RawEvent::new(RawEventKind::ButtonPress, time, MOUSE_ID).detail(1),
            3 => RawEvent::new(RawEventKind::ButtonRelease, time, MOUSE_ID).detail(1),
            4 => {
                let key = KEYS[(index / 10) % KEYS.len()].0;
                RawEvent::new(RawEventKind::KeyPress, time, KEYBOARD_ID).detail(key)
            }
            5 => {
                let key = KEYS[(index / 10) % KEYS.len()].0;
                RawEvent::new(RawEventKind::KeyRelease, time, KEYBOARD_ID).detail(key)
            }
            6 => RawEvent::new(RawEventKind::Motion, time, MOUSE_ID).valuator(3, 1.0),
            7 => RawEvent::new(RawEventKind::TouchBegin, time, TOUCHSCREEN_ID)
                .detail(1)
                .valuator(0, 300.0)
                .valuator(1, 500.0),
            8 => RawEvent::new(RawEventKind::TouchUpdate, time, TOUCHSCREEN_ID)
                .detail(1)
                .valuator(0, 310.0),
            _ => RawEvent::new(RawEventKind::TouchEnd, time, TOUCHSCREEN_ID).detail(1),
        };

        events.push_back(event);
    }

    events
}

/// An event source yielding the simulated stream. Once the stream is
/// exhausted the source stops the event loop.
pub struct DemoSource {
    events: VecDeque<RawEvent>,
    stop: StopHandle,
}

impl DemoSource {
    pub fn new(count: usize, stop: StopHandle) -> Self {
        Self {
            events: demo_events(count),
            stop,
        }
    }
}

impl NextEvent for DemoSource {
    type Event = InputEvent;

    async fn next(&mut self) -> Result<InputEvent> {
        // Pace the stream so the cooperative tasks interleave.
        tokio::time::sleep(Duration::from_millis(2)).await;

        match self.events.pop_front() {
            Some(raw) => Ok(InputEvent::new(raw)),
            None => {
                self.stop.stop();
                // A final refresh event; the loop observes the stop on its
                // next turn.
                Ok(InputEvent::new(RawEvent::new(
                    RawEventKind::DeviceChanged,
                    0,
                    MASTER_POINTER_ID,
                )))
            }
        }
    }
}
