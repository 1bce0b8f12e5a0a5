//! # Visualization Boundary Module
//!
//! The seam between the ingestion core and whatever draws the live buffers.
//! The core never owns a renderer: it is handed a [`DisplaySurface`] per call
//! and pings it after each push with the buffer that changed. A plotting
//! surface reads it back in chronological order through
//! [`CircularBuffer::get_data`].
//!
//! ## Key Types
//! - `BufferCapacity`: the selectable history lengths for the live buffers
//! - `DisplaySurface`: redraw notification target
//! - `TerminalSurface`: headless surface that tracks what a plot would show
//!   and renders it as a text summary for the `status` command

use crate::channel::Channel;
use crate::circular_buffer::CircularBuffer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of samples kept per channel for live display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum BufferCapacity {
    /// 1000 samples
    #[default]
    OneThousand,
    /// 3000 samples
    ThreeThousand,
    /// 5000 samples
    FiveThousand,
    /// 7000 samples
    SevenThousand,
    /// 10000 samples
    TenThousand,
}

impl BufferCapacity {
    pub const ALL: [BufferCapacity; 5] = [
        BufferCapacity::OneThousand,
        BufferCapacity::ThreeThousand,
        BufferCapacity::FiveThousand,
        BufferCapacity::SevenThousand,
        BufferCapacity::TenThousand,
    ];

    pub fn samples(self) -> usize {
        match self {
            BufferCapacity::OneThousand => 1000,
            BufferCapacity::ThreeThousand => 3000,
            BufferCapacity::FiveThousand => 5000,
            BufferCapacity::SevenThousand => 7000,
            BufferCapacity::TenThousand => 10000,
        }
    }

    pub fn from_samples(samples: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.samples() == samples)
    }
}

impl TryFrom<usize> for BufferCapacity {
    type Error = String;

    fn try_from(samples: usize) -> Result<Self, Self::Error> {
        Self::from_samples(samples).ok_or_else(|| {
            let allowed: Vec<String> = Self::ALL.iter().map(|c| c.to_string()).collect();
            format!(
                "unsupported buffer capacity {} (choose one of {})",
                samples,
                allowed.join(", ")
            )
        })
    }
}

impl From<BufferCapacity> for usize {
    fn from(capacity: BufferCapacity) -> usize {
        capacity.samples()
    }
}

impl fmt::Display for BufferCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.samples())
    }
}

/// Something that redraws a channel when new data lands in its buffer
pub trait DisplaySurface {
    fn data_available(&mut self, channel: Channel, buffer: &CircularBuffer);
}

/// Per-channel view state kept by [`TerminalSurface`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelView {
    pub redraws: u64,
    pub samples: usize,
    pub latest: Option<f64>,
}

/// Headless display surface.
///
/// Keeps the figures a plot header would show. The value range is only
/// computed when rendering, over the buffers passed in.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    views: [ChannelView; Channel::COUNT],
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self, channel: Channel) -> &ChannelView {
        &self.views[channel.index()]
    }

    /// Forget everything shown so far, e.g. after the buffers were replaced
    pub fn clear(&mut self) {
        self.views = Default::default();
    }

    /// One line per channel: title, buffered samples, latest value, range
    pub fn render<'a, F>(&self, buffer_for: F) -> String
    where
        F: Fn(Channel) -> &'a CircularBuffer,
    {
        let mut out = String::new();
        for channel in Channel::ALL {
            let view = self.view(channel);
            let latest = view
                .latest
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "-".to_string());
            let range = buffer_for(channel)
                .min_max()
                .map(|(min, max)| format!("[{:.2}, {:.2}]", min, max))
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "{:<6} {:>6} samples  latest {:>12}  range {}\n",
                channel.title(),
                view.samples,
                latest,
                range
            ));
        }
        out
    }
}

impl DisplaySurface for TerminalSurface {
    fn data_available(&mut self, channel: Channel, buffer: &CircularBuffer) {
        let view = &mut self.views[channel.index()];
        view.redraws += 1;
        view.samples = buffer.len();
        view.latest = buffer.last();
        log::trace!("Redraw {} ({} samples)", channel, view.samples);
    }
}
