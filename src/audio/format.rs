//! Stream format shared by the codec and modem PCM endpoints.

use std::fmt;

/// Sample encoding of a PCM stream. The modem path only carries S16_LE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    S16Le,
}

impl SampleEncoding {
    pub fn bits(self) -> u32 {
        match self {
            SampleEncoding::S16Le => 16,
        }
    }
}

/// Direction of a PCM stream as seen from this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamDirection {
    Capture,
    Playback,
}

impl fmt::Display for StreamDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamDirection::Capture => f.write_str("capture"),
            StreamDirection::Playback => f.write_str("playback"),
        }
    }
}

/// Requested configuration for every endpoint of a bridging session.
///
/// Built once at startup from [`crate::config::Config`] and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Logical device index shared by the codec and modem cards
    pub device: u32,
    pub channels: u32,
    pub rate: u32,
    /// Period size in frames
    pub period_size: u32,
    pub period_count: u32,
    pub encoding: SampleEncoding,
}

impl AudioFormat {
    pub fn bits(&self) -> u32 {
        self.encoding.bits()
    }

    /// Bytes per frame (one sample for every channel).
    pub fn frame_bytes(&self) -> usize {
        (self.channels * self.bits() / 8) as usize
    }

    pub fn frames_to_bytes(&self, frames: usize) -> usize {
        frames * self.frame_bytes()
    }
}
