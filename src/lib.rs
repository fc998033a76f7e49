//! evcap - capture input events and store them as JSON or SQLite
//!
//! Raw events from a host input backend are normalised into typed records,
//! annotated with modifier, focus-window, interval and device context, and
//! persisted through a batching storage manager.
//!
//! Architecture:
//! - Pipeline (`pipeline`): event loop pulling from a source and notifying
//!   listeners; the handler joins the transformer to storage
//! - Transformer (`input`): per-device state machines over the backend
//!   query surface
//! - Storage (`storage`): dual-trigger batching manager fanning out to the
//!   SQLite and JSON sinks
//! - Database (`database`): connection/query abstraction and the
//!   checksummed migration engine
//! - Runtime (`runtime`): scheduler, interval timer, locking buffer

pub mod cli;
pub mod database;
pub mod error;
pub mod event;
pub mod input;
pub mod pipeline;
pub mod runtime;
pub mod storage;
