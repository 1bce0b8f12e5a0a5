//! # Channel Model
//!
//! The closed set of sensor channels the device reports and the two device
//! groups they belong to.
//!
//! ## Groups
//! - PPG: `C` (sample count), `R` (red), `IR` (infrared), `G` (green)
//! - ACC: `X`, `Y`, `Z` accelerometer axes
//!
//! Channel names on the wire are case-sensitive and mapped through
//! [`Channel::from_name`]. Anything else is rejected at the parse boundary.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Sensor channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    C,
    R,
    Ir,
    G,
    X,
    Y,
    Z,
}

/// Device group a channel is sampled with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Ppg,
    Acc,
}

impl Channel {
    pub const COUNT: usize = 7;

    /// All channels in export column order
    pub const ALL: [Channel; Channel::COUNT] = [
        Channel::C,
        Channel::R,
        Channel::Ir,
        Channel::G,
        Channel::X,
        Channel::Y,
        Channel::Z,
    ];

    /// Wire and CSV header name
    pub fn name(self) -> &'static str {
        match self {
            Channel::C => "C",
            Channel::R => "R",
            Channel::Ir => "IR",
            Channel::G => "G",
            Channel::X => "X",
            Channel::Y => "Y",
            Channel::Z => "Z",
        }
    }

    /// Human readable title for display surfaces
    pub fn title(self) -> &'static str {
        match self {
            Channel::C => "Count",
            Channel::R => "Red",
            Channel::Ir => "IR",
            Channel::G => "Green",
            Channel::X => "Acc X",
            Channel::Y => "Acc Y",
            Channel::Z => "Acc Z",
        }
    }

    pub fn from_name(name: &str) -> Option<Channel> {
        Channel::ALL.into_iter().find(|channel| channel.name() == name)
    }

    pub fn group(self) -> Group {
        match self {
            Channel::C | Channel::R | Channel::Ir | Channel::G => Group::Ppg,
            Channel::X | Channel::Y | Channel::Z => Group::Acc,
        }
    }

    /// Position in [`Channel::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One floating-point value per channel, stored in column order
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelValues([f64; Channel::COUNT]);

impl ChannelValues {
    pub fn new(values: [f64; Channel::COUNT]) -> Self {
        Self(values)
    }

    pub fn as_array(&self) -> &[f64; Channel::COUNT] {
        &self.0
    }

    /// Iterate `(channel, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        Channel::ALL.into_iter().zip(self.0.iter().copied())
    }

    /// True when no value is exactly zero (`-0.0` counts as zero)
    pub fn all_non_zero(&self) -> bool {
        self.0.iter().all(|value| *value != 0.0)
    }
}

impl Index<Channel> for ChannelValues {
    type Output = f64;

    fn index(&self, channel: Channel) -> &f64 {
        &self.0[channel.index()]
    }
}

impl IndexMut<Channel> for ChannelValues {
    fn index_mut(&mut self, channel: Channel) -> &mut f64 {
        &mut self.0[channel.index()]
    }
}
