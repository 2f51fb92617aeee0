/// Logarithmic sine sweep, `sin(2π f0 k (e^(t/k) - 1))` with
/// `k = T / ln(f1 / f0)`.
///
/// Yields `⌊T · rate⌋` samples. `k` follows the requested duration `T`, not
/// the truncated sample count.
#[derive(Debug, Clone)]
pub struct ExponentialSweep {
    sample_index: usize,
    start_frequency: f64,
    sample_rate: u32,
    n_samples: usize,
    amplitude: f32,
    k: f64,
}

impl ExponentialSweep {
    pub fn new(
        start_frequency: f64,
        end_frequency: f64,
        amplitude: f32,
        duration: f64,
        sample_rate: u32,
    ) -> Self {
        let n_samples = (duration * sample_rate as f64) as usize;
        let k = duration / (end_frequency / start_frequency).ln();

        Self {
            sample_index: 0,
            start_frequency,
            sample_rate,
            n_samples,
            amplitude,
            k,
        }
    }

    /// Instantaneous frequency at sample `n`.
    pub fn frequency_at(&self, n: usize) -> f64 {
        let t = n as f64 / self.sample_rate as f64;
        self.start_frequency * f64::exp(t / self.k)
    }
}

impl Iterator for ExponentialSweep {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        use std::f64::consts::PI;

        if self.sample_index < self.n_samples {
            let t = self.sample_index as f64 / self.sample_rate as f64;
            let phase = 2.0 * PI * self.start_frequency * self.k * (f64::exp(t / self.k) - 1.0);
            let s = self.amplitude * phase.sin() as f32;

            self.sample_index += 1;

            Some(s)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.n_samples - self.sample_index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ExponentialSweep {}
