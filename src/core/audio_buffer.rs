use bytes::{Bytes, BytesMut};

/// Errors raised while accumulating a recording phase.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AudioBufferError {
    #[error("Audio exceeds the maximum of {max_bytes} bytes per recording")]
    TooLarge { max_bytes: usize },
}

/// Bounded accumulator for the binary frames of one recording phase.
#[derive(Debug)]
pub struct AudioBuffer {
    data: BytesMut,
    max_bytes: usize,
}

impl AudioBuffer {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            data: BytesMut::new(),
            max_bytes,
        }
    }

    /// Append one frame. On overflow the whole phase is discarded.
    pub fn append(&mut self, frame: &[u8]) -> Result<(), AudioBufferError> {
        if self.data.len() + frame.len() > self.max_bytes {
            self.reset();
            return Err(AudioBufferError::TooLarge {
                max_bytes: self.max_bytes,
            });
        }
        self.data.extend_from_slice(frame);
        Ok(())
    }

    /// Hand out the accumulated audio as one contiguous view and empty the buffer.
    pub fn take(&mut self) -> Bytes {
        self.data.split().freeze()
    }

    pub fn reset(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}
