//! WAV input and output.
//!
//! Recordings are always reduced to a mono [`Waveform`]; the writers only
//! produce mono files.

use std::{fs::File, io::BufReader, path::Path};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::{signals::FiniteSignal, Error, WavLoadError, Waveform};

const SUPPORTED_INT_WIDTHS: [u16; 3] = [8, 16, 32];

/// Load a WAV file as a mono [`Waveform`].
///
/// Integer PCM of 8, 16 or 32 bits is scaled by the signed full-scale value
/// of its bit depth, 32-bit float is taken as is. Frames with more than one
/// channel are averaged.
pub fn load(path: impl AsRef<Path>) -> Result<Waveform, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(WavLoadError::Io)?;
    let reader = WavReader::new(BufReader::new(file)).map_err(map_hound_error)?;

    let spec = reader.spec();
    tracing::debug!(
        "loading {}: {} channel(s), {} bit {:?}, {} Hz",
        path.display(),
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format,
        spec.sample_rate
    );

    let interleaved = read_interleaved(reader)?;
    let data = downmix(&interleaved, spec.channels);

    Waveform::new(spec.sample_rate, data)
}

fn read_interleaved<R: std::io::Read>(reader: WavReader<R>) -> Result<Vec<f64>, Error> {
    let spec = reader.spec();

    match spec.sample_format {
        SampleFormat::Int if SUPPORTED_INT_WIDTHS.contains(&spec.bits_per_sample) => {
            let full_scale = full_scale(spec.bits_per_sample);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / full_scale))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| map_hound_error(err).into())
        }
        SampleFormat::Float if spec.bits_per_sample == 32 => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| map_hound_error(err).into()),
        SampleFormat::Int => Err(Error::UnsupportedFormat(format!(
            "{} bit integer samples, expected one of 8, 16 or 32 bit",
            spec.bits_per_sample
        ))),
        SampleFormat::Float => Err(Error::UnsupportedFormat(format!(
            "{} bit float samples",
            spec.bits_per_sample
        ))),
    }
}

#[inline]
fn full_scale(bits_per_sample: u16) -> f64 {
    (1u64 << (bits_per_sample - 1)) as f64
}

/// Averages every frame of `channels` interleaved samples into one sample.
/// A trailing incomplete frame is dropped.
pub fn downmix(interleaved: &[f64], channels: u16) -> Vec<f32> {
    let channels = usize::from(channels.max(1));

    interleaved
        .chunks_exact(channels)
        .map(|frame| (frame.iter().sum::<f64>() / channels as f64) as f32)
        .collect()
}

/// Write a mono 16 bit PCM file, samples are truncated towards zero after
/// scaling by `i16::MAX`.
pub fn write_pcm16(
    path: impl AsRef<Path>,
    signal: impl FiniteSignal,
    sample_rate: u32,
) -> Result<(), Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(map_hound_error)?;
    for s in signal {
        let s = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(s).map_err(map_hound_error)?;
    }
    writer.finalize().map_err(map_hound_error)?;

    Ok(())
}

/// Write a mono 32 bit float file.
pub fn write_float(
    path: impl AsRef<Path>,
    signal: impl FiniteSignal,
    sample_rate: u32,
) -> Result<(), Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec).map_err(map_hound_error)?;
    for s in signal {
        writer.write_sample(s).map_err(map_hound_error)?;
    }
    writer.finalize().map_err(map_hound_error)?;

    Ok(())
}

pub(crate) fn map_hound_error(err: hound::Error) -> WavLoadError {
    match err {
        hound::Error::IoError(error) => WavLoadError::Io(error),
        err => WavLoadError::Format(err.to_string()),
    }
}
