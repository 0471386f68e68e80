// Format conversion for CPAL audio streams and WAV export
//
// The click mix is rendered in f32 and converted when written to the device
// buffer (f32, i16 or u16) or to a 16-bit WAV file. All conversions are
// allocation-free and suitable for real-time audio callbacks.

use cpal::{FromSample, Sample};

/// Convert f32 sample to i16
///
/// Maps [-1.0, 1.0] to [i16::MIN, i16::MAX], clamping values outside the range
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped >= 0.0 {
        (clamped * i16::MAX as f32) as i16
    } else {
        (clamped * -(i16::MIN as f32)) as i16
    }
}

/// Write one mono sample to every channel of an interleaved frame
#[inline]
pub fn write_mono_to_interleaved_frame<T>(internal_sample: f32, output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    for channel_sample in output_frame.iter_mut() {
        *channel_sample = Sample::from_sample::<f32>(internal_sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_to_i16_conversion() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(-1.0), i16::MIN);
        // Out of range is clamped
        assert_eq!(f32_to_i16(2.5), i16::MAX);
        assert_eq!(f32_to_i16(-7.0), i16::MIN);
    }

    #[test]
    fn test_mono_fills_all_channels() {
        let mut frame = [0.0f32; 2];
        write_mono_to_interleaved_frame(0.25, &mut frame);
        assert_eq!(frame, [0.25, 0.25]);

        let mut frame = [0i16; 3];
        write_mono_to_interleaved_frame(1.0, &mut frame);
        assert!(frame.iter().all(|s| *s == i16::MAX));

        let mut frame = [0u16; 2];
        write_mono_to_interleaved_frame(0.0, &mut frame);
        assert!(frame.iter().all(|s| *s == 32768));
    }
}
