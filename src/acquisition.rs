//! # Acquisition Core
//!
//! Owns all ingestion state: the live display buffers, the current record
//! being synchronized, and the store of emitted samples. Every state change
//! goes through `&mut self`, so the event loop is the single writer.
//!
//! ## Line Pipeline
//! 1. `parser::parse_line` turns the raw bytes into a [`Reading`]; a bad line
//!    is returned as an error and leaves the state untouched
//! 2. `LiveBufferRouter` pushes each value to its channel buffer
//! 3. `SampleSynchronizer` updates the current record and decides emission
//! 4. An emitted snapshot is appended to the `SessionStore`

use crate::channel::Channel;
use crate::circular_buffer::CircularBuffer;
use crate::error::{ExportError, LineParseError};
use crate::exporter;
use crate::parser::{self, Reading};
use crate::router::LiveBufferRouter;
use crate::session_store::{SampleRecord, SessionStore};
use crate::synchronizer::{CurrentRecord, SampleSynchronizer};
use crate::visualization::{BufferCapacity, DisplaySurface};
use std::path::Path;

pub struct Acquisition {
    router: LiveBufferRouter,
    synchronizer: SampleSynchronizer,
    store: SessionStore,
}

impl Acquisition {
    pub fn new(capacity: BufferCapacity) -> Self {
        Self {
            router: LiveBufferRouter::new(capacity),
            synchronizer: SampleSynchronizer::new(),
            store: SessionStore::new(),
        }
    }

    /// Process one raw line from the transport.
    ///
    /// Returns the record emitted by this line, if any.
    pub fn handle_line(
        &mut self,
        raw: &[u8],
        surface: &mut dyn DisplaySurface,
    ) -> Result<Option<&SampleRecord>, LineParseError> {
        let reading = parser::parse_line(raw)?;
        Ok(self.apply(&reading, surface))
    }

    /// Apply an already parsed line
    pub fn apply(
        &mut self,
        reading: &Reading,
        surface: &mut dyn DisplaySurface,
    ) -> Option<&SampleRecord> {
        self.router.route(reading, surface);
        let snapshot = self.synchronizer.apply(reading)?;
        let record = self.store.append(snapshot);
        log::debug!("Stored sample {}", record.index());
        Some(record)
    }

    /// Swap in empty buffers of the new capacity; stored samples are kept
    pub fn set_buffer_capacity(&mut self, capacity: BufferCapacity) {
        log::info!(
            "Buffer capacity {} -> {}",
            self.router.capacity(),
            capacity
        );
        self.router.set_capacity(capacity);
    }

    pub fn buffer_capacity(&self) -> BufferCapacity {
        self.router.capacity()
    }

    /// Live buffer for one channel, for display surfaces to read back
    pub fn buffer(&self, channel: Channel) -> &CircularBuffer {
        self.router.buffer(channel)
    }

    pub fn current(&self) -> &CurrentRecord {
        self.synchronizer.current()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Write all stored samples to `path` as CSV
    pub fn export(&self, path: impl AsRef<Path>) -> Result<usize, ExportError> {
        exporter::export_csv(&self.store, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelValues;
    use crate::visualization::TerminalSurface;
    use tempfile::tempdir;

    fn run(
        acquisition: &mut Acquisition,
        lines: &[&str],
    ) -> Vec<Result<Option<u64>, LineParseError>> {
        let mut surface = TerminalSurface::new();
        lines
            .iter()
            .map(|line| {
                acquisition
                    .handle_line(line.as_bytes(), &mut surface)
                    .map(|record| record.map(|r| r.index()))
            })
            .collect()
    }

    #[test]
    fn test_two_group_lines_emit_first_sample() {
        let mut acquisition = Acquisition::new(BufferCapacity::OneThousand);
        let results = run(&mut acquisition, &["C:1,R:2,IR:3,G:4", "X:5,Y:6,Z:7"]);

        assert_eq!(results, vec![Ok(None), Ok(Some(1))]);
        assert_eq!(acquisition.store().len(), 1);
        let record = acquisition.store().get(1).unwrap();
        assert_eq!(
            *record.values(),
            ChannelValues::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0])
        );
    }

    #[test]
    fn test_interleaved_stream_indices_have_no_gaps() {
        let mut acquisition = Acquisition::new(BufferCapacity::OneThousand);
        let mut lines = Vec::new();
        for i in 1..=20 {
            lines.push(format!("C:{},R:2,IR:3,G:4\r\n", i));
            lines.push("X:127,Y:127,Z:127\r\n".to_string());
        }
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        run(&mut acquisition, &refs);

        let indices: Vec<u64> = acquisition.store().iter().map(|r| r.index()).collect();
        assert_eq!(indices, (1..=20).collect::<Vec<u64>>());
        assert_eq!(acquisition.store().last().unwrap().values()[Channel::C], 20.0);
    }

    #[test]
    fn test_malformed_line_changes_nothing() {
        let mut acquisition = Acquisition::new(BufferCapacity::OneThousand);
        run(&mut acquisition, &["C:1,R:2,IR:3,G:4"]);

        let results = run(&mut acquisition, &["X:5,Y:oops,Z:7"]);
        assert!(results[0].is_err());
        assert!(acquisition.buffer(Channel::X).is_empty());
        assert!(!acquisition.current().acc_updated);
        assert_eq!(acquisition.current().values[Channel::X], 0.0);

        let results = run(&mut acquisition, &["X:5,Y:6,Z:7"]);
        assert_eq!(results, vec![Ok(Some(1))]);
    }

    #[test]
    fn test_zero_channel_blocks_store_but_not_buffers() {
        let mut acquisition = Acquisition::new(BufferCapacity::OneThousand);
        run(&mut acquisition, &["C:0,R:2,IR:3,G:4", "X:5,Y:6,Z:7", "X:5,Y:6,Z:7"]);

        assert!(acquisition.store().is_empty());
        assert_eq!(acquisition.buffer(Channel::X).len(), 2);
        assert_eq!(acquisition.buffer(Channel::C).get_data(), vec![0.0]);
    }

    #[test]
    fn test_capacity_change_keeps_store() {
        let mut acquisition = Acquisition::new(BufferCapacity::OneThousand);
        run(&mut acquisition, &["C:1,R:2,IR:3,G:4", "X:5,Y:6,Z:7"]);

        acquisition.set_buffer_capacity(BufferCapacity::TenThousand);

        assert_eq!(acquisition.buffer_capacity(), BufferCapacity::TenThousand);
        assert!(acquisition.buffer(Channel::C).is_empty());
        assert_eq!(acquisition.buffer(Channel::C).capacity(), 10000);
        assert_eq!(acquisition.store().len(), 1);
        assert!(acquisition.current().values.all_non_zero());
    }

    #[test]
    fn test_surface_sees_every_push() {
        let mut acquisition = Acquisition::new(BufferCapacity::OneThousand);
        let mut surface = TerminalSurface::new();
        for line in ["C:1,R:2", "C:3", "X:9"] {
            acquisition.handle_line(line.as_bytes(), &mut surface).unwrap();
        }
        assert_eq!(surface.view(Channel::C).redraws, 2);
        assert_eq!(surface.view(Channel::C).latest, Some(3.0));
        assert_eq!(surface.view(Channel::X).samples, 1);
        assert_eq!(surface.view(Channel::Z).redraws, 0);
    }

    #[test]
    fn test_export_is_independent_of_field_order() {
        let mut acquisition = Acquisition::new(BufferCapacity::OneThousand);
        run(
            &mut acquisition,
            &["G:4,IR:3,R:2,C:1", "Z:7,X:5,Y:6", "C:2,R:2,IR:3,G:4", "Y:6,Z:7,X:5"],
        );
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.csv");

        assert_eq!(acquisition.export(&path).unwrap(), 2);
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1.0,2.0,3.0,4.0,5.0,6.0,7.0");
        assert_eq!(lines[2], "2.0,2.0,3.0,4.0,5.0,6.0,7.0");
    }
}
