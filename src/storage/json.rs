//! JSON sink: writes event batches as pretty-printed documents.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;
use serde_json::json;
use serde_json::ser::PrettyFormatter;

use crate::error::{Error, Result};
use crate::event::Data;
use crate::storage::Store;

/// A storage sink that prints events as JSON to an output stream.
pub struct JsonStorage {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonStorage {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Write documents to stdout.
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Write documents to a file opened in append mode, creating it if
    /// needed.
    pub fn append_to_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(Box::new(file)))
    }
}

impl Store for JsonStorage {
    fn store_event(&self, events: Data) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut formatted_entries = Vec::new();
        for mut entry in events.into_entries() {
            entry.to_named_representation();
            let entry = entry.with_fields();

            let fields: Vec<_> = entry
                .fields
                .iter()
                .zip(entry.data)
                .map(|(field, data)| json!({ "name": field.name, "data": data }))
                .collect();

            formatted_entries.push(json!({
                "type": entry.entry_type.name(),
                "fields": fields,
                "modifiers": entry.modifiers,
            }));
        }

        let output = json!({ "entries": formatted_entries });

        let mut writer = self.writer.lock().unwrap();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut *writer, formatter);
        output
            .serialize(&mut serializer)
            .map_err(|error| Error::Database(format!("formatting json output: {error}")))?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(|error| Error::Database(format!("writing json output: {error}")))?;

        Ok(())
    }
}
