// Format conversion for device and file output
//
// The engine renders f32 internally. The realtime callback converts to the
// device sample type through cpal's `FromSample`; the WAV exporter quantises
// to signed integers.

use cpal::{FromSample, Sample};

/// Convert an f32 sample to i16
///
/// Maps [-1.0, 1.0] to [i16::MIN, i16::MAX] and clamps anything outside.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped >= 0.0 {
        (clamped * i16::MAX as f32) as i16
    } else {
        (clamped * -(i16::MIN as f32)) as i16
    }
}

/// Convert an f32 sample to a signed integer of `bits` bits (16 or 24)
#[inline]
pub fn f32_to_int(sample: f32, bits: u16) -> i32 {
    let clamped = sample.clamp(-1.0, 1.0);
    let max = ((1i64 << (bits - 1)) - 1) as f32;
    if clamped >= 0.0 {
        (clamped * max) as i32
    } else {
        (clamped * (max + 1.0)) as i32
    }
}

/// Write one stereo frame into an interleaved device buffer
///
/// Extra channels get silence; a mono device gets the L/R average.
#[inline]
pub fn write_stereo_to_interleaved_frame<T>((left, right): (f32, f32), output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    if output_frame.len() >= 2 {
        output_frame[0] = Sample::from_sample::<f32>(left);
        output_frame[1] = Sample::from_sample::<f32>(right);
        for channel_sample in output_frame.iter_mut().skip(2) {
            *channel_sample = Sample::from_sample::<f32>(0.0);
        }
    } else if let Some(channel_sample) = output_frame.first_mut() {
        *channel_sample = Sample::from_sample::<f32>((left + right) * 0.5);
    }
}
