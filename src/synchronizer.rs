//! # Sample Synchronizer
//!
//! Pairs the two device cadences into complete samples. PPG channels and the
//! accelerometer report on separate lines at their own rates; a sample is
//! only emitted once both groups have refreshed since the previous one.
//!
//! ## Emission Rule
//! After each line: `ppg_updated && acc_updated && no value is exactly 0`.
//! When the zero check fails the flags stay set and emission waits for a
//! later line. A channel that keeps reporting exactly `0` therefore blocks
//! emission for as long as it does.

use crate::channel::{ChannelValues, Group};
use crate::parser::Reading;

/// Latest value per channel plus per-group freshness
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentRecord {
    pub values: ChannelValues,
    pub ppg_updated: bool,
    pub acc_updated: bool,
}

impl CurrentRecord {
    fn ready(&self) -> bool {
        self.ppg_updated && self.acc_updated && self.values.all_non_zero()
    }
}

#[derive(Debug, Default)]
pub struct SampleSynchronizer {
    current: CurrentRecord,
}

impl SampleSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &CurrentRecord {
        &self.current
    }

    /// Apply one parsed line.
    ///
    /// Returns the snapshot to store when this line completes a sample. At
    /// most one snapshot is produced per call.
    pub fn apply(&mut self, reading: &Reading) -> Option<ChannelValues> {
        for (channel, value) in reading.iter() {
            self.current.values[channel] = value;
            match channel.group() {
                Group::Ppg => self.current.ppg_updated = true,
                Group::Acc => self.current.acc_updated = true,
            }
        }

        if !self.current.ready() {
            return None;
        }

        self.current.ppg_updated = false;
        self.current.acc_updated = false;
        Some(self.current.values)
    }
}
