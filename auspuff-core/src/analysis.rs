//! Summary numbers for produced impulse responses.

#[cfg(feature = "fft")]
use rustfft::{num_complex::Complex, FftPlanner};

pub fn peak(data: &[f64]) -> f64 {
    data.iter().fold(0.0, |peak, s| peak.max(s.abs()))
}

pub fn rms(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    (data.iter().map(|s| s * s).sum::<f64>() / data.len() as f64).sqrt()
}

/// Magnitude spectrum from DC up to Nyquist, one bin per `sample_rate / n`.
#[cfg(feature = "fft")]
pub fn magnitude_spectrum(data: &[f64]) -> Vec<f64> {
    let mut buffer: Vec<_> = data.iter().map(|&s| Complex::new(s, 0.0)).collect();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(buffer.len());
    fft.process(&mut buffer);

    buffer
        .into_iter()
        .take(data.len() / 2 + 1)
        .map(|c| c.norm())
        .collect()
}

/// Frequency of the strongest spectral bin.
#[cfg(feature = "fft")]
pub fn dominant_frequency(data: &[f64], sample_rate: u32) -> Option<f64> {
    if data.is_empty() {
        return None;
    }

    let spectrum = magnitude_spectrum(data);
    let (bin, _) = spectrum
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))?;

    Some(bin as f64 * sample_rate as f64 / data.len() as f64)
}

/// Share of the spectral energy at or below `cutoff` Hz.
#[cfg(feature = "fft")]
pub fn energy_below(data: &[f64], sample_rate: u32, cutoff: f64) -> f64 {
    let spectrum = magnitude_spectrum(data);
    let bin_width = sample_rate as f64 / data.len() as f64;

    let total: f64 = spectrum.iter().map(|m| m * m).sum();
    if total == 0.0 {
        return 0.0;
    }

    let low: f64 = spectrum
        .iter()
        .enumerate()
        .take_while(|(bin, _)| *bin as f64 * bin_width <= cutoff)
        .map(|(_, m)| m * m)
        .sum();

    low / total
}
