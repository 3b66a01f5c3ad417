//! Narrow interface to the platform audio stack.
//!
//! The bridging core only ever talks to PCM streams through these two traits,
//! so the ALSA backend can be swapped for a scripted one in tests.

use anyhow::Result;

use super::format::{AudioFormat, StreamDirection};

/// Opens PCM streams on a given card/device pair.
pub trait PcmBackend {
    fn open(
        &mut self,
        card: u32,
        device: u32,
        direction: StreamDirection,
        format: &AudioFormat,
    ) -> Result<Box<dyn PcmStream>>;
}

/// One open, blocking PCM stream. Dropping the stream closes it.
pub trait PcmStream {
    /// Whether the stream finished hardware setup and can transfer audio.
    fn is_ready(&self) -> bool;

    /// Size of the negotiated stream buffer in bytes.
    fn buffer_size_bytes(&self) -> usize;

    /// Fill `buf` completely from a capture stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Write all of `buf` to a playback stream.
    fn write(&mut self, buf: &[u8]) -> Result<()>;
}
