/// Linear fade-in over the first `width` samples, `i / (width - 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attack {
    width: usize,
}

impl Attack {
    pub const DEFAULT_MS: f64 = 0.5;

    pub fn new(width: usize) -> Self {
        Self { width }
    }

    /// Ramp length for `ms` milliseconds, rounded up to whole samples.
    pub fn from_millis(ms: f64, sample_rate: u32) -> Self {
        let width = (sample_rate as f64 * ms / 1000.0).ceil() as usize;

        Self { width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn gain(&self, n: usize) -> f64 {
        if n >= self.width {
            1.0
        } else if self.width == 1 {
            0.0
        } else {
            n as f64 / (self.width - 1) as f64
        }
    }

    pub fn apply(&self, data: &mut [f64]) {
        for (n, s) in data.iter_mut().take(self.width).enumerate() {
            *s *= self.gain(n);
        }
    }
}
