//! Raw input events and the backend query surface.
//!
//! The concrete windowing/input provider lives outside this crate; the
//! transformer only sees the [`Backend`] trait and the [`RawEvent`] model
//! below. Labels follow the X Input conventions: device classes, button
//! labels and valuator axis labels are atom-name strings.

pub mod demo;
pub mod event_switch;
pub mod pointer_key;
pub mod touch;
pub mod transformer;

use std::collections::BTreeMap;

use chrono::Utc;

use crate::event::Timestamp;

pub use transformer::{Transformer, TransformerBuilder};

/// Device-class labels reported by the backend.
pub const DEVICE_CLASS_MOUSE: &str = "MOUSE";
pub const DEVICE_CLASS_KEYBOARD: &str = "KEYBOARD";
pub const DEVICE_CLASS_TOUCHPAD: &str = "TOUCHPAD";
pub const DEVICE_CLASS_TOUCHSCREEN: &str = "TOUCHSCREEN";

/// Button labels for wheel buttons. Wheel presses are modelled as scroll
/// events, so buttons resolving to these labels are suppressed.
pub const BUTTON_WHEEL_UP: &str = "Button Wheel Up";
pub const BUTTON_WHEEL_DOWN: &str = "Button Wheel Down";
pub const BUTTON_HORIZ_WHEEL_LEFT: &str = "Button Horiz Wheel Left";
pub const BUTTON_HORIZ_WHEEL_RIGHT: &str = "Button Horiz Wheel Right";

/// Axis labels identifying a device's x and y valuators.
pub const AXIS_REL_X: &str = "Rel X";
pub const AXIS_REL_Y: &str = "Rel Y";
pub const AXIS_ABS_X: &str = "Abs X";
pub const AXIS_ABS_Y: &str = "Abs Y";

/// The kind of a raw backend event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventKind {
    Motion,
    ButtonPress,
    ButtonRelease,
    KeyPress,
    KeyRelease,
    TouchBegin,
    TouchUpdate,
    TouchEnd,
    DeviceChanged,
    HierarchyChanged,
}

/// A raw event as produced by the backend.
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub kind: RawEventKind,
    /// Event time in backend-native units.
    pub time: u64,
    /// The source device id.
    pub source_id: i32,
    /// Button code or keycode, depending on the kind.
    pub detail: i32,
    /// Set when the backend emulated this event from another (e.g. scroll
    /// motion re-reported as wheel buttons).
    pub pointer_emulated: bool,
    /// Set on key events generated by auto-repeat.
    pub key_repeat: bool,
    /// Changed valuators by index.
    pub valuators: BTreeMap<usize, f64>,
}

impl RawEvent {
    pub fn new(kind: RawEventKind, time: u64, source_id: i32) -> Self {
        Self {
            kind,
            time,
            source_id,
            detail: 0,
            pointer_emulated: false,
            key_repeat: false,
            valuators: BTreeMap::new(),
        }
    }

    pub fn detail(mut self, detail: i32) -> Self {
        self.detail = detail;
        self
    }

    pub fn pointer_emulated(mut self) -> Self {
        self.pointer_emulated = true;
        self
    }

    pub fn key_repeat(mut self) -> Self {
        self.key_repeat = true;
        self
    }

    pub fn valuator(mut self, index: usize, value: f64) -> Self {
        self.valuators.insert(index, value);
        self
    }
}

/// A raw event stamped with the wall-clock time it was received.
#[derive(Debug, Clone)]
pub struct InputEvent {
    raw: RawEvent,
    timestamp: Timestamp,
}

impl InputEvent {
    pub fn new(raw: RawEvent) -> Self {
        Self {
            raw,
            timestamp: Utc::now(),
        }
    }

    pub fn raw(&self) -> &RawEvent {
        &self.raw
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Orientation of a scroll axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOrientation {
    Vertical,
    Horizontal,
}

/// A scroll axis on a device.
#[derive(Debug, Clone)]
pub struct ScrollClass {
    pub valuator: usize,
    pub orientation: ScrollOrientation,
}

/// A continuous axis on a device.
#[derive(Debug, Clone)]
pub struct ValuatorClass {
    pub index: usize,
    pub label: Option<String>,
}

/// One logical input device as enumerated by the backend.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub id: i32,
    pub name: String,
    pub enabled: bool,
    /// Whether this is the master pointer used for pointer queries.
    pub master_pointer: bool,
    /// The device-class atom name, if the backend reports one.
    pub device_class: Option<String>,
    /// Button labels in physical button order.
    pub button_labels: Vec<Option<String>>,
    pub valuators: Vec<ValuatorClass>,
    pub scroll_classes: Vec<ScrollClass>,
}

impl DeviceInfo {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            enabled: true,
            master_pointer: false,
            device_class: None,
            button_labels: Vec::new(),
            valuators: Vec::new(),
            scroll_classes: Vec::new(),
        }
    }
}

/// The pointer position and modifier context at query time.
#[derive(Debug, Clone, Default)]
pub struct PointerQuery {
    pub root_x: f64,
    pub root_y: f64,
    /// Effective modifier bitmask.
    pub modifier_state: u32,
    pub screen: i32,
}

/// An opaque window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowId(pub u64);

/// The result of resolving a key event against the keyboard mapping.
#[derive(Debug, Clone, Default)]
pub struct KeyLookup {
    /// The printable character, if the key produces one.
    pub character: Option<String>,
    /// The key symbol name.
    pub symbol: String,
}

/// Query surface of the host windowing/input system.
pub trait Backend {
    /// Enumerate the logical input devices.
    fn list_devices(&mut self) -> Vec<DeviceInfo>;

    /// The mapping from physical button index to logical button code for a
    /// device, or `None` if the device has no button mapping.
    fn device_button_mapping(&mut self, device_id: i32, map_size: usize) -> Option<Vec<i32>>;

    /// The current pointer position and modifier context.
    fn query_pointer(&mut self, pointer_id: i32) -> PointerQuery;

    /// The currently active window.
    fn active_window(&mut self) -> Option<WindowId>;

    /// The window holding input focus, used as a fallback for
    /// [`Backend::active_window`].
    fn focus_window(&mut self) -> Option<WindowId>;

    fn window_name(&mut self, window: WindowId) -> Option<String>;

    fn window_position(&mut self, window: WindowId) -> Option<(f64, f64)>;

    fn window_size(&mut self, window: WindowId) -> Option<(f64, f64)>;

    /// Resolve a key event to a printable character and key symbol name.
    fn lookup_key(&mut self, event: &RawEvent, pointer: &PointerQuery) -> KeyLookup;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    /// A scriptable backend for transformer and switch tests.
    pub struct MockBackend {
        pub devices: Vec<DeviceInfo>,
        pub pointer: PointerQuery,
        pub window_name: Option<String>,
        pub window_position: Option<(f64, f64)>,
        pub window_size: Option<(f64, f64)>,
        pub keys: Vec<(i32, Option<&'static str>, &'static str)>,
    }

    impl MockBackend {
        pub fn new(devices: Vec<DeviceInfo>) -> Self {
            Self {
                devices,
                pointer: PointerQuery {
                    root_x: 100.0,
                    root_y: 200.0,
                    modifier_state: 0,
                    screen: 0,
                },
                window_name: Some("mock-window".to_owned()),
                window_position: Some((10.0, 20.0)),
                window_size: Some((800.0, 600.0)),
                keys: vec![(38, Some("a"), "a"), (50, None, "Shift_L")],
            }
        }
    }

    impl Backend for MockBackend {
        fn list_devices(&mut self) -> Vec<DeviceInfo> {
            self.devices.clone()
        }

        fn device_button_mapping(&mut self, _device_id: i32, map_size: usize) -> Option<Vec<i32>> {
            Some((1..=map_size as i32).collect())
        }

        fn query_pointer(&mut self, _pointer_id: i32) -> PointerQuery {
            self.pointer.clone()
        }

        fn active_window(&mut self) -> Option<WindowId> {
            Some(WindowId(1))
        }

        fn focus_window(&mut self) -> Option<WindowId> {
            Some(WindowId(1))
        }

        fn window_name(&mut self, _window: WindowId) -> Option<String> {
            self.window_name.clone()
        }

        fn window_position(&mut self, _window: WindowId) -> Option<(f64, f64)> {
            self.window_position
        }

        fn window_size(&mut self, _window: WindowId) -> Option<(f64, f64)> {
            self.window_size
        }

        fn lookup_key(&mut self, event: &RawEvent, _pointer: &PointerQuery) -> KeyLookup {
            self.keys
                .iter()
                .find(|(detail, _, _)| *detail == event.detail)
                .map(|(_, character, symbol)| KeyLookup {
                    character: character.map(str::to_owned),
                    symbol: (*symbol).to_owned(),
                })
                .unwrap_or_default()
        }
    }
}
