//! WAV file reading and writing.
//!
//! Integer files are scaled to `[-1, 1)`; 32-bit files are IEEE float. The
//! kernel takes one input channel, so [`read_wav`] mixes down, while its
//! output is written back as stereo with [`write_wav_stereo`].

use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};

use crate::{Error, Result, StereoSamples};

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.duration());
    let duration_secs = num_frames as f64 / f64::from(spec.sample_rate);

    let format = match spec.sample_format {
        SampleFormat::Float => WavFormat::IeeeFloat,
        SampleFormat::Int => WavFormat::Pcm,
    };

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs,
        format,
    })
}

/// WAV file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Bit depth per sample: 16, 24 or 32 (float).
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Interleaved samples of every channel as `f32`.
fn read_interleaved<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let hound_spec = reader.spec();
    let spec = WavSpec::from(hound_spec);

    let samples = match hound_spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok((samples, spec))
}

fn check_bit_depth(bits: u16) -> Result<()> {
    match bits {
        16 | 24 | 32 => Ok(()),
        other => Err(Error::UnsupportedFormat(format!(
            "{other}-bit output (expected 16, 24 or 32)"
        ))),
    }
}

/// Read a WAV file and return mono samples along with the spec.
///
/// Multi-channel files are mixed down by averaging channels.
///
/// # Example
/// ```ignore
/// let (samples, spec) = read_wav("voice.wav")?;
/// println!("Loaded {} samples at {} Hz", samples.len(), spec.sample_rate);
/// ```
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavSpec)> {
    let (samples, spec) = read_interleaved(path)?;
    let channels = usize::from(spec.channels.max(1));

    let mono = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };

    Ok((mono, spec))
}

/// Read a WAV file as stereo.
///
/// Mono files are duplicated to both channels; files with more than two
/// channels keep the first two.
pub fn read_wav_stereo<P: AsRef<Path>>(path: P) -> Result<(StereoSamples, WavSpec)> {
    let (samples, spec) = read_interleaved(path)?;

    let stereo = match spec.channels {
        0 | 1 => StereoSamples::from_mono(samples),
        2 => StereoSamples::from_interleaved(&samples),
        channels => {
            let (left, right) = samples
                .chunks_exact(usize::from(channels))
                .map(|frame| (frame[0], frame[1]))
                .unzip();
            StereoSamples::new(left, right)
        }
    };

    Ok((stereo, spec))
}

fn to_int(sample: f32, max_val: f32) -> i32 {
    (sample * max_val).clamp(-max_val, max_val - 1.0) as i32
}

/// Write mono samples to a WAV file.
///
/// `spec.channels` is forced to 1.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    check_bit_depth(spec.bits_per_sample)?;
    let spec = WavSpec { channels: 1, ..spec };
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;

    if spec.bits_per_sample == 32 {
        for &sample in samples {
            writer.write_sample(sample)?;
        }
    } else {
        let max_val = (1i32 << (spec.bits_per_sample - 1)) as f32;
        for &sample in samples {
            writer.write_sample(to_int(sample, max_val))?;
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Write stereo samples to a WAV file.
///
/// `spec.channels` is forced to 2.
pub fn write_wav_stereo<P: AsRef<Path>>(
    path: P,
    samples: &StereoSamples,
    spec: WavSpec,
) -> Result<()> {
    check_bit_depth(spec.bits_per_sample)?;
    let spec = WavSpec { channels: 2, ..spec };
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;

    if spec.bits_per_sample == 32 {
        for (&l, &r) in samples.left.iter().zip(&samples.right) {
            writer.write_sample(l)?;
            writer.write_sample(r)?;
        }
    } else {
        let max_val = (1i32 << (spec.bits_per_sample - 1)) as f32;
        for (&l, &r) in samples.left.iter().zip(&samples.right) {
            writer.write_sample(to_int(l, max_val))?;
            writer.write_sample(to_int(r, max_val))?;
        }
    }

    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 / len as f32).sin() * 0.9).collect()
    }

    #[test]
    fn test_roundtrip_f32() {
        let samples = ramp(1000);
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &samples, WavSpec::default()).unwrap();

        let (loaded, spec) = read_wav(file.path()).unwrap();
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(loaded, samples);
    }

    #[test]
    fn test_roundtrip_i24() {
        let samples = ramp(1000);
        let spec = WavSpec {
            bits_per_sample: 24,
            ..WavSpec::default()
        };
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &samples, spec).unwrap();

        let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
        assert_eq!(loaded_spec.bits_per_sample, 24);
        for (a, b) in samples.iter().zip(&loaded) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_unsupported_depth() {
        let file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            bits_per_sample: 12,
            ..WavSpec::default()
        };
        let err = write_wav(file.path(), &[0.0], spec).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_stereo_mixdown() {
        let stereo = StereoSamples::new(vec![1.0, 0.5], vec![0.0, 0.5]);
        let file = NamedTempFile::new().unwrap();
        write_wav_stereo(file.path(), &stereo, WavSpec::default()).unwrap();

        let (mono, spec) = read_wav(file.path()).unwrap();
        assert_eq!(spec.channels, 2);
        assert_eq!(mono, vec![0.5, 0.5]);

        let (back, _) = read_wav_stereo(file.path()).unwrap();
        assert_eq!(back, stereo);
    }

    #[test]
    fn test_info() {
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &vec![0.0; 22050], WavSpec::default()).unwrap();
        let info = read_wav_info(file.path()).unwrap();
        assert_eq!(info.num_frames, 22050);
        assert!((info.duration_secs - 0.5).abs() < 1e-9);
        assert_eq!(info.format, WavFormat::IeeeFloat);
    }
}
