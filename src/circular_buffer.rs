//! Fixed-capacity rolling sample history for one channel.
//!
//! Writes overwrite the oldest sample once the buffer is full. Reads always
//! come back oldest first, regardless of where the write cursor sits.

pub struct CircularBuffer {
    data: Vec<f64>,
    cursor: usize,
    wrapped: bool,
}

pub trait SampleSliceExt {
    fn min_max(&self) -> Option<(f64, f64)>;
}

impl SampleSliceExt for [f64] {
    fn min_max(&self) -> Option<(f64, f64)> {
        self.iter().fold(None, |acc, &value| match acc {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })
    }
}

impl CircularBuffer {
    /// Create an empty buffer. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity.max(1)],
            cursor: 0,
            wrapped: false,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.data[self.cursor] = value;
        self.cursor = (self.cursor + 1) % self.data.len();
        if self.cursor == 0 {
            self.wrapped = true;
        }
    }

    /// Buffered samples, oldest first
    pub fn get_data(&self) -> Vec<f64> {
        if self.wrapped {
            let mut ordered = Vec::with_capacity(self.data.len());
            ordered.extend_from_slice(&self.data[self.cursor..]);
            ordered.extend_from_slice(&self.data[..self.cursor]);
            ordered
        } else {
            self.data[..self.cursor].to_vec()
        }
    }

    /// Discard all samples and start over with a new capacity
    pub fn reset(&mut self, capacity: usize) {
        *self = Self::new(capacity);
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        if self.wrapped {
            self.data.len()
        } else {
            self.cursor
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_wrapped(&self) -> bool {
        self.wrapped
    }

    /// Smallest and largest buffered sample, read in place
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.data[..self.len()].min_max()
    }

    /// Most recently pushed sample
    pub fn last(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let newest = (self.cursor + self.data.len() - 1) % self.data.len();
        Some(self.data[newest])
    }
}
