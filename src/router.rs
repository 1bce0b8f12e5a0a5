//! Fans parsed channel values out to their live display buffers.

use crate::channel::Channel;
use crate::circular_buffer::CircularBuffer;
use crate::parser::Reading;
use crate::visualization::{BufferCapacity, DisplaySurface};

pub struct LiveBufferRouter {
    buffers: [CircularBuffer; Channel::COUNT],
    capacity: BufferCapacity,
}

impl LiveBufferRouter {
    pub fn new(capacity: BufferCapacity) -> Self {
        Self {
            buffers: std::array::from_fn(|_| CircularBuffer::new(capacity.samples())),
            capacity,
        }
    }

    /// Push every value of the line into its channel buffer and notify the
    /// surface after each push
    pub fn route(&mut self, reading: &Reading, surface: &mut dyn DisplaySurface) {
        for (channel, value) in reading.iter() {
            let buffer = &mut self.buffers[channel.index()];
            buffer.push(value);
            surface.data_available(channel, buffer);
        }
    }

    /// Replace every buffer with an empty one of the new capacity.
    /// Buffered history is dropped.
    pub fn set_capacity(&mut self, capacity: BufferCapacity) {
        for buffer in self.buffers.iter_mut() {
            buffer.reset(capacity.samples());
        }
        self.capacity = capacity;
    }

    pub fn capacity(&self) -> BufferCapacity {
        self.capacity
    }

    pub fn buffer(&self, channel: Channel) -> &CircularBuffer {
        &self.buffers[channel.index()]
    }
}
