//! One invocation: pick a producer, build the impulse response, normalize.

use std::path::{Path, PathBuf};

use crate::{
    deconvolve, normalize,
    synth::{synthesize_with, Backend, PhaseMode, SynthParams},
    wav, Error, ImpulseResponse, Metadata, VehicleProfile, Waveform,
};

pub const DEFAULT_SAMPLES: usize = 8192;
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Where the impulse response comes from. Exactly one per run.
#[derive(Debug, Clone, PartialEq)]
pub enum Producer {
    Synth {
        profile: String,
        seed: u64,
        phase_mode: PhaseMode,
    },
    /// A recording that already is an impulse.
    Trim { input: PathBuf },
    /// A recorded sweep response plus the sweep that was played.
    Deconvolve { response: PathBuf, sweep: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Options {
    pub samples: usize,
    pub sample_rate: u32,
    pub normalize: bool,
    pub backend: Backend,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
            sample_rate: DEFAULT_SAMPLE_RATE,
            normalize: true,
            backend: Backend::detect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Produced {
    pub ir: ImpulseResponse,
    pub metadata: Metadata,
}

pub fn produce(producer: &Producer, options: &Options) -> Result<Produced, Error> {
    let (ir, metadata) = match producer {
        Producer::Synth {
            profile,
            seed,
            phase_mode,
        } => {
            let profile = VehicleProfile::find(profile)?;
            let params = SynthParams::new(options.samples, options.sample_rate)
                .with_seed(*seed)
                .with_phase_mode(*phase_mode)
                .with_backend(options.backend);

            let ir = synthesize_with(profile, &params)?;
            let metadata = Metadata {
                description: Some(profile.description.to_string()),
                source: Some(format!("procedural synthesis: {}", profile.name)),
            };

            (ir, metadata)
        }
        Producer::Trim { input } => {
            let recording = load_checked(input, options)?;
            let ir = ImpulseResponse::from_waveform(&recording, options.samples)?;
            let metadata = Metadata {
                description: Some("Recorded exhaust impulse response".to_string()),
                source: Some(format!("direct wav: {}", input.display())),
            };

            (ir, metadata)
        }
        Producer::Deconvolve { response, sweep } => {
            let recording = load_checked(response, options)?;
            let reference = wav::load(sweep)?;
            let ir = deconvolve(&recording, &reference, options.samples)?;
            let metadata = Metadata {
                description: Some("Recorded exhaust impulse response".to_string()),
                source: Some(format!(
                    "deconvolution: {} / {}",
                    response.display(),
                    sweep.display()
                )),
            };

            (ir, metadata)
        }
    };

    let ir = if options.normalize { normalize(ir) } else { ir };

    if ir.is_silent() {
        tracing::warn!("impulse response is all zeros, the table will be silent");
    }

    Ok(Produced { ir, metadata })
}

fn load_checked(path: &Path, options: &Options) -> Result<Waveform, Error> {
    let waveform = wav::load(path)?;

    tracing::info!(
        "loaded {}: {} samples @ {} Hz",
        path.display(),
        waveform.len(),
        waveform.sample_rate()
    );

    if waveform.sample_rate() != options.sample_rate {
        tracing::warn!(
            "{} is recorded at {} Hz, not {} Hz; keeping the recorded rate",
            path.display(),
            waveform.sample_rate(),
            options.sample_rate
        );
    }

    Ok(waveform)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn synth_is_normalized() {
        let producer = Producer::Synth {
            profile: "car_4cyl".to_string(),
            seed: 42,
            phase_mode: PhaseMode::Random,
        };
        let options = Options {
            samples: 2_048,
            ..Options::default()
        };

        let produced = produce(&producer, &options).unwrap();

        assert_eq!(produced.ir.len(), 2_048);
        assert!((produced.ir.peak() - 1.0).abs() < 1e-12);
        assert_eq!(
            produced.metadata.source.as_deref(),
            Some("procedural synthesis: car_4cyl")
        );
    }

    #[test]
    fn normalization_can_be_disabled() {
        let producer = Producer::Synth {
            profile: "tractor".to_string(),
            seed: 1,
            phase_mode: PhaseMode::Fixed,
        };
        let options = Options {
            samples: 1_024,
            normalize: false,
            ..Options::default()
        };

        let produced = produce(&producer, &options).unwrap();

        assert!(produced.ir.peak() != 1.0);
    }

    #[test]
    fn unknown_profile_fails() {
        let producer = Producer::Synth {
            profile: "rocket".to_string(),
            seed: 1,
            phase_mode: PhaseMode::Random,
        };

        let result = produce(&producer, &Options::default());

        assert!(matches!(result, Err(Error::UnknownProfile(_))));
    }
}
