//! Typed event records: the normalised unit produced by the transformer and
//! consumed unchanged by every storage sink.

pub mod data;
pub mod entry;
pub mod key;
pub mod mouse_click;
pub mod mouse_move;
pub mod mouse_scroll;
pub mod schema;

pub use data::Data;
pub use entry::{Entry, EntryType, EntryWithFields, FieldDefinition};
pub use key::Key;
pub use mouse_click::MouseClick;
pub use mouse_move::MouseMove;
pub use mouse_scroll::MouseScroll;
pub use schema::{ButtonAction, DataType, DeviceType, ModifierValue, Timestamp};
