use alloc::{vec, vec::Vec};

/// Current and previous state of a single device.
///
/// Both buffers have the size of the device layout. Events are written into
/// [`Self::current`], while [`Self::previous`] holds the state from the end of
/// the previous update pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateBuffers {
    current: Vec<u8>,
    previous: Vec<u8>,
}

impl StateBuffers {
    /// Creates zeroed buffers of the given size.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            current: vec![0; size],
            previous: vec![0; size],
        }
    }

    #[must_use]
    pub fn current(&self) -> &[u8] {
        &self.current
    }

    #[must_use]
    pub fn previous(&self) -> &[u8] {
        &self.previous
    }

    pub(crate) fn current_mut(&mut self) -> &mut [u8] {
        &mut self.current
    }

    /// Makes the current state the previous one.
    ///
    /// The current state is kept, since events may update only parts of it.
    pub(crate) fn snapshot(&mut self) {
        self.previous.copy_from_slice(&self.current);
    }

    /// Zeroes both buffers.
    pub(crate) fn clear(&mut self) {
        self.current.fill(0);
        self.previous.fill(0);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.current.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_keeps_current() {
        let mut buffers = StateBuffers::new(2);
        buffers.current_mut()[1] = 7;
        assert_eq!(buffers.previous(), [0, 0]);

        buffers.snapshot();
        assert_eq!(buffers.previous(), [0, 7]);
        assert_eq!(buffers.current(), [0, 7]);

        buffers.clear();
        assert!(buffers.current().iter().chain(buffers.previous()).all(|&b| b == 0));
    }
}
