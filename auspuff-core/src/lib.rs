mod coefficients;
mod impulse_response;
mod normalize;
mod profile;
mod window;

pub mod analysis;
pub mod pipeline;
pub mod registry;
pub mod signals;
pub mod synth;
pub mod wav;

pub use coefficients::*;
pub use impulse_response::*;
pub use normalize::*;
pub use profile::*;
pub use window::*;

use thiserror::Error;

use std::{io, slice::Iter};

/// Mono audio with its sample rate. Never empty, rate always non-zero.
#[derive(Debug, Clone)]
pub struct Waveform {
    sample_rate: u32,
    data: Vec<f32>,
}

impl Waveform {
    pub fn new(sample_rate: u32, data: Vec<f32>) -> Result<Self, Error> {
        if sample_rate == 0 {
            return Err(Error::InvalidParameter(
                "sample rate must be greater than zero".to_string(),
            ));
        }

        if data.is_empty() {
            return Err(Error::EmptyInput("waveform has no samples"));
        }

        Ok(Self { sample_rate, data })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.data.len() as f64 / self.sample_rate as f64
    }

    pub fn iter(&self) -> Iter<'_, f32> {
        self.data.iter()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }
}

#[inline]
pub fn dbfs(v: f64) -> f64 {
    20.0 * f64::log10(v.abs())
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
    #[error("{operation} needs the `{feature}` feature, which is not compiled in")]
    MissingDependency {
        operation: &'static str,
        feature: &'static str,
    },
    #[error("unknown vehicle profile `{0}`, run `auspuff profiles` for a list")]
    UnknownProfile(String),
    #[error("empty input: {0}")]
    EmptyInput(&'static str),
    #[error("sample rate mismatch: response is {response} Hz, sweep is {sweep} Hz")]
    SampleRateMismatch { response: u32, sweep: u32 },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("`{0}` is not a valid C identifier")]
    InvalidIdentifier(String),
    #[error("registry already has a different entry named `{0}`")]
    DuplicateEntry(String),
    #[error("error loading a waveform")]
    Wav(#[from] WavLoadError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid registry manifest")]
    Manifest(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum WavLoadError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed wav file: {0}")]
    Format(String),
}
