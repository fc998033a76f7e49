//! Batches of event entries.

use crate::event::entry::Entry;

/// The entries generated from device events. The order of the entries
/// defines the final insertion order in the storage component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Data {
    entries: Vec<Entry>,
}

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Merge with another batch by extending the entries of this one.
    pub fn merge_with(&mut self, data: Data) {
        self.entries.extend(data.entries);
    }

    /// Take the entries out of this batch.
    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn add_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
