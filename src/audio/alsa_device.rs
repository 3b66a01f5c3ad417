//! ALSA PCM device wrappers for the codec and modem streams.

use alsa::pcm::{Access, Format, Frames, HwParams, State, PCM};
use alsa::{Direction, ValueOr};
use anyhow::{Context, Result};

use super::device::{PcmBackend, PcmStream};
use super::format::{AudioFormat, SampleEncoding, StreamDirection};

/// Recoveries allowed within a single read/write before giving up.
const MAX_RECOVERIES: u32 = 3;

/// Opens `"<prefix>:<card>,<device>"` PCM streams, e.g. `hw:1,0`.
pub struct AlsaBackend {
    prefix: &'static str,
}

impl AlsaBackend {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix }
    }
}

impl PcmBackend for AlsaBackend {
    fn open(
        &mut self,
        card: u32,
        device: u32,
        direction: StreamDirection,
        format: &AudioFormat,
    ) -> Result<Box<dyn PcmStream>> {
        let name = format!("{}:{},{}", self.prefix, card, device);
        let stream = AlsaStream::open(name, direction, format)?;
        Ok(Box::new(stream))
    }
}

/// A blocking interleaved PCM stream.
pub struct AlsaStream {
    pcm: PCM,
    name: String,
    direction: StreamDirection,
    frame_bytes: usize,
    buffer_bytes: usize,
}

impl AlsaStream {
    fn open(name: String, direction: StreamDirection, format: &AudioFormat) -> Result<Self> {
        let alsa_direction = match direction {
            StreamDirection::Capture => Direction::Capture,
            StreamDirection::Playback => Direction::Playback,
        };
        let pcm = PCM::new(&name, alsa_direction, false)
            .with_context(|| format!("Failed to open PCM device '{}' for {}", name, direction))?;

        // Configure hardware parameters
        {
            let hwp = HwParams::any(&pcm).with_context(|| "Failed to initialize HwParams")?;
            hwp.set_access(Access::RWInterleaved)?;
            hwp.set_format(alsa_format(format.encoding))?;
            hwp.set_channels(format.channels)?;
            hwp.set_rate(format.rate, ValueOr::Nearest)?;
            hwp.set_period_size_near(format.period_size as Frames, ValueOr::Nearest)?;
            hwp.set_periods(format.period_count, ValueOr::Nearest)?;
            pcm.hw_params(&hwp)
                .with_context(|| format!("Failed to apply hw params to '{}'", name))?;
        }

        // Read back actual negotiated parameters
        let (actual_rate, period_size, buffer_frames) = {
            let hwp = pcm.hw_params_current()?;
            (hwp.get_rate()?, hwp.get_period_size()?, hwp.get_buffer_size()?)
        };
        let buffer_bytes = format.frames_to_bytes(buffer_frames.max(0) as usize);

        log::info!(
            "ALSA {}: device={}, rate={}, channels={}, period_size={}, buffer={} frames ({} bytes)",
            direction,
            name,
            actual_rate,
            format.channels,
            period_size,
            buffer_frames,
            buffer_bytes,
        );

        Ok(Self {
            pcm,
            name,
            direction,
            frame_bytes: format.frame_bytes(),
            buffer_bytes,
        })
    }

    /// Run the ALSA xrun/suspend recovery path, bounded per transfer.
    fn recover(&self, err: alsa::Error, recoveries: &mut u32) -> Result<()> {
        *recoveries += 1;
        if *recoveries > MAX_RECOVERIES {
            return Err(err).with_context(|| {
                format!(
                    "PCM '{}' still failing after {} recoveries",
                    self.name, MAX_RECOVERIES
                )
            });
        }

        log::warn!(
            "ALSA {} error on '{}': {}, recovering...",
            self.direction,
            self.name,
            err
        );
        self.pcm
            .try_recover(err, true)
            .with_context(|| format!("Failed to recover PCM '{}'", self.name))
    }

    /// Largest prefix of a buffer made of whole frames.
    fn whole_frames_len(&self, len: usize) -> usize {
        len - len % self.frame_bytes
    }
}

impl PcmStream for AlsaStream {
    fn is_ready(&self) -> bool {
        matches!(self.pcm.state(), State::Prepared | State::Running)
    }

    fn buffer_size_bytes(&self) -> usize {
        self.buffer_bytes
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        let io = self.pcm.io_bytes();
        let len = self.whole_frames_len(buf.len());
        let mut offset = 0;
        let mut recoveries = 0;

        while offset < len {
            match io.readi(&mut buf[offset..len]) {
                Ok(frames) => offset += frames * self.frame_bytes,
                Err(e) => self.recover(e, &mut recoveries)?,
            }
        }
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        let io = self.pcm.io_bytes();
        let len = self.whole_frames_len(buf.len());
        let mut offset = 0;
        let mut recoveries = 0;

        // Short writes are normal; keep going until every frame is queued.
        while offset < len {
            match io.writei(&buf[offset..len]) {
                Ok(frames) => offset += frames * self.frame_bytes,
                Err(e) => self.recover(e, &mut recoveries)?,
            }
        }
        Ok(())
    }
}

impl Drop for AlsaStream {
    fn drop(&mut self) {
        log::debug!("Closing ALSA {} stream '{}'", self.direction, self.name);
    }
}

fn alsa_format(encoding: SampleEncoding) -> Format {
    match encoding {
        SampleEncoding::S16Le => Format::S16LE,
    }
}
