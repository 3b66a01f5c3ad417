//! Glitch suppression for audio captured from the modem.
//!
//! The modem's baseband path occasionally emits near-full-scale positive
//! spikes. Those samples are muted; everything else, including ordinary
//! loud audio and all negative samples, passes through untouched.

/// Samples strictly above this value are treated as glitches.
pub const GLITCH_THRESHOLD: i16 = 30000;

/// Bytes in one stereo S16_LE frame.
const FRAME_BYTES: usize = 4;

/// Zero every S16_LE sample above [`GLITCH_THRESHOLD`] in place.
///
/// The buffer is walked one 2-channel frame (4 bytes) at a time. A trailing
/// partial frame, when the length is not a multiple of 4, is left as is.
pub fn suppress_glitches(buf: &mut [u8]) {
    for frame in buf.chunks_exact_mut(FRAME_BYTES) {
        for sample in frame.chunks_exact_mut(2) {
            if i16::from_le_bytes([sample[0], sample[1]]) > GLITCH_THRESHOLD {
                sample.copy_from_slice(&[0, 0]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn samples(buf: &[u8]) -> Vec<i16> {
        buf.chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect()
    }

    #[test]
    fn mutes_full_scale_spike() {
        let mut buf = frames(&[100, -200, 0x7FFF, 5]);
        suppress_glitches(&mut buf);

        assert_eq!(&buf[4..6], &[0x00, 0x00]);
        assert_eq!(samples(&buf), vec![100, -200, 0, 5]);
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut buf = frames(&[30000, 30001, 29999, 32767]);
        suppress_glitches(&mut buf);
        assert_eq!(samples(&buf), vec![30000, 0, 29999, 0]);
    }

    #[test]
    fn negative_samples_pass() {
        let input = [i16::MIN, -1, -30001, -32000];
        let mut buf = frames(&input);
        suppress_glitches(&mut buf);
        assert_eq!(samples(&buf), input.to_vec());
    }

    #[test]
    fn length_is_preserved_and_quiet_audio_untouched() {
        let input: Vec<i16> = (0..3072 * 2).map(|i| ((i * 37) % 20000) as i16 - 10000).collect();
        let mut buf = frames(&input);
        let len = buf.len();
        suppress_glitches(&mut buf);

        assert_eq!(buf.len(), len);
        assert_eq!(samples(&buf), input);
    }

    #[test]
    fn trailing_partial_frame_is_left_alone() {
        // One whole frame followed by a lone sample that would otherwise be muted.
        let mut buf = frames(&[31000, 1, 32767]);
        suppress_glitches(&mut buf);
        assert_eq!(samples(&buf), vec![0, 1, 32767]);

        let mut short = vec![0xFF, 0x7F, 0xFF];
        suppress_glitches(&mut short);
        assert_eq!(short, vec![0xFF, 0x7F, 0xFF]);
    }

    #[test]
    fn empty_buffer() {
        let mut buf: Vec<u8> = Vec::new();
        suppress_glitches(&mut buf);
        assert!(buf.is_empty());
    }
}
