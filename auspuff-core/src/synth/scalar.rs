use std::f64::consts::PI;

use super::{Backend, Excitation, Synthesizer, NOISE_DECAY_RATIO};
use crate::VehicleProfile;

/// Sample by sample rendering without any array support.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scalar;

impl Synthesizer for Scalar {
    fn backend(&self) -> Backend {
        Backend::Scalar
    }

    fn render(
        &self,
        profile: &VehicleProfile,
        excitation: &Excitation,
        sample_rate: u32,
    ) -> Vec<f64> {
        let tau = profile.decay_tau();
        let noise_tau = NOISE_DECAY_RATIO * tau;

        excitation
            .noise
            .iter()
            .enumerate()
            .map(|(n, noise)| {
                let t = n as f64 / sample_rate as f64;
                let envelope = f64::exp(-t / tau);

                let tonal = excitation.partials.iter().fold(0.0, |sum, p| {
                    let w = 2.0 * PI * p.frequency;
                    sum + p.amplitude * (f64::sin(w * t + p.phase) * envelope)
                });

                tonal + profile.noise_ratio * (noise * f64::exp(-t / noise_tau))
            })
            .collect()
    }
}
