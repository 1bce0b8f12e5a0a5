//! Append-only record of every emitted sample for the current run.

use crate::channel::ChannelValues;

/// Immutable snapshot of all channels at emission time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRecord {
    index: u64,
    values: ChannelValues,
}

impl SampleRecord {
    /// Sample index, starting at 1
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn values(&self) -> &ChannelValues {
        &self.values
    }
}

/// Samples in emission order. Indices are assigned here, so they are
/// contiguous from 1 and never reused.
#[derive(Debug, Default)]
pub struct SessionStore {
    records: Vec<SampleRecord>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a snapshot under the next index and return the stored record
    pub fn append(&mut self, values: ChannelValues) -> &SampleRecord {
        let index = self.records.len() as u64 + 1;
        self.records.push(SampleRecord { index, values });
        &self.records[self.records.len() - 1]
    }

    pub fn get(&self, index: u64) -> Option<&SampleRecord> {
        let position = usize::try_from(index.checked_sub(1)?).ok()?;
        self.records.get(position)
    }

    /// Records in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = &SampleRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&SampleRecord> {
        self.records.last()
    }
}
