use ndarray::{Array1, ArrayView1};

use std::f64::consts::PI;

use super::{Backend, Excitation, Synthesizer, NOISE_DECAY_RATIO};
use crate::VehicleProfile;

/// Whole-buffer rendering on `ndarray` arrays.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vectorized;

impl Synthesizer for Vectorized {
    fn backend(&self) -> Backend {
        Backend::Vectorized
    }

    fn render(
        &self,
        profile: &VehicleProfile,
        excitation: &Excitation,
        sample_rate: u32,
    ) -> Vec<f64> {
        let tau = profile.decay_tau();
        let t = Array1::from_shape_fn(excitation.len(), |n| n as f64 / sample_rate as f64);
        let envelope = t.mapv(|t| f64::exp(-t / tau));

        let mut ir = Array1::<f64>::zeros(excitation.len());
        for p in &excitation.partials {
            let w = 2.0 * PI * p.frequency;
            let tone = t.mapv(|t| f64::sin(w * t + p.phase)) * &envelope;
            ir.scaled_add(p.amplitude, &tone);
        }

        let noise_envelope = t.mapv(|t| f64::exp(-t / (NOISE_DECAY_RATIO * tau)));
        let noise = &ArrayView1::from(excitation.noise.as_slice()) * &noise_envelope;
        ir.scaled_add(profile.noise_ratio, &noise);

        ir.to_vec()
    }
}
