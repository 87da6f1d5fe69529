// Audio Export - writes rendered buffers to WAV files
//
// The render itself happens in `offline`; this module only limits and
// quantises the result.

use crate::audio::format_conversion::{f32_to_i16, f32_to_int};
use crate::audio::offline::SampleBuffer;
use crate::sequencer::pattern::PatternSlot;
use hound::{WavSpec, WavWriter};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

/// Peak above which the export is normalised
pub const LIMITER_CEILING: f32 = 0.95;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Nothing to render: bar count must be at least 1")]
    EmptyRender,

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Render thread panicked")]
    RenderPanicked,

    #[error("Unsupported bit depth: {0} (expected 16 or 24)")]
    UnsupportedBitDepth(u16),

    #[error("Unsupported channel count: {0} (expected 1 or 2)")]
    UnsupportedChannels(u16),
}

/// Audio export settings
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    /// Output file path
    pub output_path: String,
    /// Sample rate the render runs at (Hz)
    pub sample_rate: u32,
    /// Bit depth (16 or 24)
    pub bit_depth: u16,
    /// Number of channels (1=mono, 2=stereo)
    pub channels: u16,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_path: "export.wav".to_string(),
            sample_rate: 44100,
            bit_depth: 16,
            channels: 2,
        }
    }
}

/// `groovebox_<slot>_<bpm>bpm.wav`
pub fn suggested_file_name(slot: PatternSlot, bpm: f64) -> String {
    format!("groovebox_{}_{}bpm.wav", slot, bpm.round() as u32)
}

/// Gain that brings `peak` down to the limiter ceiling, or unity
pub fn limiter_gain(peak: f32) -> f32 {
    if peak > LIMITER_CEILING {
        LIMITER_CEILING / peak
    } else {
        1.0
    }
}

pub struct WavExporter {
    settings: ExportSettings,
}

impl WavExporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Write `buffer` to the configured path and return that path
    pub fn write(&self, buffer: &SampleBuffer) -> Result<PathBuf, ExportError> {
        let path = Path::new(&self.settings.output_path).to_path_buf();
        let file = std::io::BufWriter::new(std::fs::File::create(&path)?);
        self.write_to(buffer, file)?;
        log::info!(
            "Exported {:.2}s to {}",
            buffer.duration_secs(),
            path.display()
        );
        Ok(path)
    }

    /// Write `buffer` as WAV into any seekable sink
    pub fn write_to<W: Write + Seek>(&self, buffer: &SampleBuffer, sink: W) -> Result<(), ExportError> {
        let bits = self.settings.bit_depth;
        if bits != 16 && bits != 24 {
            return Err(ExportError::UnsupportedBitDepth(bits));
        }
        let channels = self.settings.channels;
        if channels != 1 && channels != 2 {
            return Err(ExportError::UnsupportedChannels(channels));
        }

        let spec = WavSpec {
            channels,
            sample_rate: buffer.sample_rate,
            bits_per_sample: bits,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::new(sink, spec)?;

        let gain = limiter_gain(buffer.peak());
        if gain < 1.0 {
            log::debug!("Export limiter: peak {:.3}, gain {:.3}", buffer.peak(), gain);
        }

        for (left, right) in buffer.left.iter().zip(&buffer.right) {
            let (left, right) = (left * gain, right * gain);
            let frame = if channels == 2 {
                [Some(left), Some(right)]
            } else {
                [Some((left + right) * 0.5), None]
            };
            for sample in frame.into_iter().flatten() {
                if bits == 16 {
                    writer.write_sample(f32_to_i16(sample))?;
                } else {
                    writer.write_sample(f32_to_int(sample, 24))?;
                }
            }
        }

        writer.finalize()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn ramp(frames: usize, amplitude: f32) -> SampleBuffer {
        let left: Vec<f32> = (0..frames)
            .map(|i| amplitude * (i as f32 / frames as f32 * 2.0 - 1.0))
            .collect();
        let right = left.iter().map(|s| -s).collect();
        SampleBuffer {
            sample_rate: 44100,
            left,
            right,
        }
    }

    #[test]
    fn test_export_settings_default() {
        let settings = ExportSettings::default();
        assert_eq!(settings.sample_rate, 44100);
        assert_eq!(settings.bit_depth, 16);
        assert_eq!(settings.channels, 2);
    }

    #[test]
    fn test_suggested_file_name() {
        assert_eq!(suggested_file_name(PatternSlot::B, 128.0), "groovebox_B_128bpm.wav");
        assert_eq!(suggested_file_name(PatternSlot::A, 99.6), "groovebox_A_100bpm.wav");
    }

    #[test]
    fn test_limiter_only_above_ceiling() {
        assert_eq!(limiter_gain(0.5), 1.0);
        assert_eq!(limiter_gain(0.95), 1.0);
        assert!((limiter_gain(1.9) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_write_stereo_16_bit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let exporter = WavExporter::new(ExportSettings {
            output_path: path.to_string_lossy().into_owned(),
            ..ExportSettings::default()
        });
        let written = exporter.write(&ramp(1000, 0.5)).unwrap();
        assert_eq!(written, path);

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(reader.len(), 2000);
    }

    #[test]
    fn test_hot_signal_is_normalised() {
        let exporter = WavExporter::new(ExportSettings::default());
        let mut cursor = Cursor::new(Vec::new());
        exporter.write_to(&ramp(500, 2.0), &mut cursor).unwrap();

        cursor.set_position(0);
        let mut reader = hound::WavReader::new(cursor).unwrap();
        let max = reader
            .samples::<i16>()
            .map(|s| s.unwrap().unsigned_abs())
            .max()
            .unwrap();
        let ceiling = (LIMITER_CEILING * i16::MAX as f32) as u16;
        assert!(max <= ceiling + 1);
        assert!(max > ceiling - 400);
    }

    #[test]
    fn test_mono_24_bit() {
        let exporter = WavExporter::new(ExportSettings {
            bit_depth: 24,
            channels: 1,
            ..ExportSettings::default()
        });
        let mut cursor = Cursor::new(Vec::new());
        exporter.write_to(&ramp(100, 0.5), &mut cursor).unwrap();
        cursor.set_position(0);
        let reader = hound::WavReader::new(cursor).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 24);
        assert_eq!(reader.len(), 100);
    }

    #[test]
    fn test_rejects_bad_bit_depth() {
        let exporter = WavExporter::new(ExportSettings {
            bit_depth: 8,
            ..ExportSettings::default()
        });
        let result = exporter.write_to(&ramp(10, 0.1), Cursor::new(Vec::new()));
        assert!(matches!(result, Err(ExportError::UnsupportedBitDepth(8))));
    }
}
