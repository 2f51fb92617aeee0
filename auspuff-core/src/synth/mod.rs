//! Procedural impulse responses for [`VehicleProfile`]s.
//!
//! The model is a sum of exponentially decaying harmonics of the profile's
//! fundamental plus a faster decaying broadband noise floor:
//!
//! ```text
//! τ     = decay_ms / 1000 / ln(1000)
//! ir(t) = Σ aᵢ · sin(2π·f₀·(i+1)·t + φᵢ) · e^(-t/τ)
//!       + noise_ratio · N(0,1) · e^(-t/(0.3·τ))
//! ```
//!
//! followed by a 0.5 ms linear attack. All randomness is drawn up front into
//! an [`Excitation`], so every [`Synthesizer`] backend renders the same
//! response for the same seed.

mod scalar;
#[cfg(feature = "vectorized")]
mod vectorized;

pub use scalar::Scalar;
#[cfg(feature = "vectorized")]
pub use vectorized::Vectorized;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

use std::{f64::consts::TAU, fmt};

use crate::{Attack, Error, ImpulseResponse, VehicleProfile};

/// Noise envelope time constant relative to the harmonic one.
pub const NOISE_DECAY_RATIO: f64 = 0.3;

/// Phase step between harmonics in [`PhaseMode::Fixed`].
pub const FIXED_PHASE_STEP: f64 = 1.234567;

pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhaseMode {
    /// Harmonic phases drawn uniformly from `[0, 2π)` with the seeded
    /// generator.
    #[default]
    Random,
    /// Harmonic `i` starts at `i * 1.234567` rad, the seed only affects the
    /// noise.
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Vectorized,
    Scalar,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Vectorized, Backend::Scalar];

    /// Best backend compiled into this build.
    pub fn detect() -> Self {
        if cfg!(feature = "vectorized") {
            Backend::Vectorized
        } else {
            Backend::Scalar
        }
    }

    pub fn synthesizer(&self) -> Result<Box<dyn Synthesizer>, Error> {
        match self {
            #[cfg(feature = "vectorized")]
            Backend::Vectorized => Ok(Box::new(Vectorized)),
            #[cfg(not(feature = "vectorized"))]
            Backend::Vectorized => Err(Error::MissingDependency {
                operation: "vectorized synthesis",
                feature: "vectorized",
            }),
            Backend::Scalar => Ok(Box::new(Scalar)),
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Backend::Vectorized => "vectorized",
                Backend::Scalar => "scalar",
            }
        )
    }
}

/// A single harmonic as it ends up in the rendered response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partial {
    pub frequency: f64,
    pub amplitude: f64,
    pub phase: f64,
}

/// Everything random about one synthesized response.
#[derive(Debug, Clone, PartialEq)]
pub struct Excitation {
    pub partials: Vec<Partial>,
    /// One standard normal draw per output sample.
    pub noise: Vec<f64>,
}

impl Excitation {
    /// Phases are drawn first, one per audible harmonic, then the noise.
    pub fn draw(
        profile: &VehicleProfile,
        num_samples: usize,
        sample_rate: u32,
        seed: u64,
        phase_mode: PhaseMode,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let partials = profile
            .audible_harmonics(sample_rate)
            .map(|(i, frequency, amplitude)| {
                let phase = match phase_mode {
                    PhaseMode::Random => rng.gen_range(0.0..TAU),
                    PhaseMode::Fixed => i as f64 * FIXED_PHASE_STEP,
                };

                Partial {
                    frequency,
                    amplitude,
                    phase,
                }
            })
            .collect();

        let noise = (0..num_samples)
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect();

        Self { partials, noise }
    }

    pub fn len(&self) -> usize {
        self.noise.len()
    }

    pub fn is_empty(&self) -> bool {
        self.noise.is_empty()
    }
}

/// Numeric backend rendering the decaying harmonics and noise of the model.
/// The attack is applied afterwards by [`synthesize_with`].
pub trait Synthesizer: Send + Sync {
    fn backend(&self) -> Backend;

    fn render(&self, profile: &VehicleProfile, excitation: &Excitation, sample_rate: u32)
        -> Vec<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthParams {
    pub num_samples: usize,
    pub sample_rate: u32,
    pub seed: u64,
    pub phase_mode: PhaseMode,
    pub backend: Backend,
}

impl SynthParams {
    pub fn new(num_samples: usize, sample_rate: u32) -> Self {
        Self {
            num_samples,
            sample_rate,
            seed: DEFAULT_SEED,
            phase_mode: PhaseMode::default(),
            backend: Backend::detect(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_phase_mode(mut self, phase_mode: PhaseMode) -> Self {
        self.phase_mode = phase_mode;
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }
}

/// Synthesizes the named profile with random phases on the detected
/// backend. The result is not normalized.
pub fn synthesize(
    profile_name: &str,
    num_samples: usize,
    sample_rate: u32,
    seed: u64,
) -> Result<ImpulseResponse, Error> {
    let profile = VehicleProfile::find(profile_name)?;
    let params = SynthParams::new(num_samples, sample_rate).with_seed(seed);

    synthesize_with(profile, &params)
}

pub fn synthesize_with(
    profile: &VehicleProfile,
    params: &SynthParams,
) -> Result<ImpulseResponse, Error> {
    if params.num_samples == 0 {
        return Err(Error::InvalidParameter(
            "impulse response length must be greater than zero".to_string(),
        ));
    }

    if params.sample_rate == 0 {
        return Err(Error::InvalidParameter(
            "sample rate must be greater than zero".to_string(),
        ));
    }

    let synthesizer = params.backend.synthesizer()?;
    let excitation = Excitation::draw(
        profile,
        params.num_samples,
        params.sample_rate,
        params.seed,
        params.phase_mode,
    );

    tracing::debug!(
        "synthesizing `{}` on {} backend: {} of {} harmonics, {} samples @ {} Hz, seed {}",
        profile.name,
        synthesizer.backend(),
        excitation.partials.len(),
        profile.harmonics.len(),
        params.num_samples,
        params.sample_rate,
        params.seed
    );

    let mut data = synthesizer.render(profile, &excitation, params.sample_rate);
    Attack::from_millis(Attack::DEFAULT_MS, params.sample_rate).apply(&mut data);

    Ok(ImpulseResponse::new(params.sample_rate, data))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same_arguments_same_response() {
        let a = synthesize("car_v6", 2_048, 48_000, 7).unwrap();
        let b = synthesize("car_v6", 2_048, 48_000, 7).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn seed_changes_response() {
        let a = synthesize("car_v6", 2_048, 48_000, 7).unwrap();
        let b = synthesize("car_v6", 2_048, 48_000, 8).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn starts_silent() {
        let ir = synthesize("motorcycle", 1_024, 48_000, 1).unwrap();

        assert_eq!(ir.len(), 1_024);
        assert_eq!(ir.data[0], 0.0);
    }

    #[test]
    fn unknown_profile() {
        let result = synthesize("zeppelin", 1_024, 48_000, 1);

        assert!(matches!(result, Err(Error::UnknownProfile(_))));
    }

    #[test]
    fn zero_length() {
        assert!(matches!(
            synthesize("truck", 0, 48_000, 1),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn harmonics_above_nyquist_are_skipped() {
        let f1 = VehicleProfile::find("f1").unwrap();

        // Nyquist at 400 Hz is below the 450 Hz fundamental
        let excitation = Excitation::draw(f1, 256, 800, 3, PhaseMode::Random);
        assert!(excitation.partials.is_empty());

        let ir = synthesize("f1", 256, 800, 3).unwrap();
        assert_eq!(ir.len(), 256);
        assert!(ir.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn random_phases_are_in_range() {
        let profile = VehicleProfile::find("f1").unwrap();

        let excitation = Excitation::draw(profile, 16, 48_000, 99, PhaseMode::Random);

        assert_eq!(excitation.partials.len(), 8);
        assert!(excitation
            .partials
            .iter()
            .all(|p| (0.0..TAU).contains(&p.phase)));
    }

    #[test]
    fn fixed_phases_ignore_seed() {
        let profile = VehicleProfile::find("car_4cyl").unwrap();

        let a = Excitation::draw(profile, 16, 48_000, 1, PhaseMode::Fixed);
        let b = Excitation::draw(profile, 16, 48_000, 2, PhaseMode::Fixed);

        assert_eq!(a.partials, b.partials);
        assert_ne!(a.noise, b.noise);
        assert_eq!(a.partials[3].phase, 3.0 * FIXED_PHASE_STEP);
        assert_eq!(a.partials[3].frequency, 480.0);
    }

    #[test]
    fn backends_agree() {
        let profile = VehicleProfile::find("truck").unwrap();
        let params = SynthParams::new(4_096, 44_100).with_seed(5);

        let results: Vec<_> = Backend::ALL
            .iter()
            .filter_map(|&backend| synthesize_with(profile, &params.with_backend(backend)).ok())
            .collect();

        assert_eq!(results.len(), if cfg!(feature = "vectorized") { 2 } else { 1 });
        for other in &results[1..] {
            for (a, b) in results[0].iter().zip(other.iter()) {
                assert!((a - b).abs() < 1e-12);
            }
        }
    }

    #[cfg(not(feature = "vectorized"))]
    #[test]
    fn vectorized_backend_is_missing() {
        assert!(matches!(
            Backend::Vectorized.synthesizer(),
            Err(Error::MissingDependency { .. })
        ));
        assert_eq!(Backend::detect(), Backend::Scalar);
    }
}
