#[cfg(feature = "fft")]
use rustfft::{num_complex::Complex, FftPlanner};

use std::slice::Iter;

use crate::{Error, Waveform};

/// Relative Tikhonov term, scaled by the largest sweep bin magnitude.
pub const REGULARIZATION: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    pub sample_rate: u32,
    pub data: Vec<f64>,
}

impl ImpulseResponse {
    pub fn new(sample_rate: u32, data: Vec<f64>) -> Self {
        Self { sample_rate, data }
    }

    /// Use a recording that already is an impulse, truncated or zero padded
    /// to `length` samples.
    pub fn from_waveform(waveform: &Waveform, length: usize) -> Result<Self, Error> {
        if length == 0 {
            return Err(Error::InvalidParameter(
                "impulse response length must be greater than zero".to_string(),
            ));
        }

        let mut data: Vec<f64> = waveform.iter().take(length).map(|&s| s as f64).collect();
        data.resize(length, 0.0);

        Ok(Self {
            sample_rate: waveform.sample_rate(),
            data,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, f64> {
        self.data.iter()
    }

    /// Largest absolute coefficient.
    pub fn peak(&self) -> f64 {
        self.data.iter().fold(0.0, |peak, c| peak.max(c.abs()))
    }

    pub fn is_silent(&self) -> bool {
        self.peak() == 0.0
    }

    pub fn duration_ms(&self) -> f64 {
        self.data.len() as f64 / self.sample_rate as f64 * 1000.0
    }
}

/// Recovers the impulse response of the system that turned `sweep` into
/// `response`.
///
/// Both signals are zero padded to a power of two of at least twice the
/// longer one, so the circular division below behaves like a linear one.
/// The transfer function is estimated as
///
/// ```text
/// H = R · conj(S) / (|S|² + ε),   ε = 1e-6 · max |S|
/// ```
///
/// which keeps bins where the sweep carries almost no energy from blowing
/// up. The result is truncated or zero padded to `target_length`.
#[cfg(feature = "fft")]
pub fn deconvolve(
    response: &Waveform,
    sweep: &Waveform,
    target_length: usize,
) -> Result<ImpulseResponse, Error> {
    if response.sample_rate() != sweep.sample_rate() {
        return Err(Error::SampleRateMismatch {
            response: response.sample_rate(),
            sweep: sweep.sample_rate(),
        });
    }

    if target_length == 0 {
        return Err(Error::InvalidParameter(
            "impulse response length must be greater than zero".to_string(),
        ));
    }

    let sample_rate = response.sample_rate();
    let fft_len = (2 * response.len().max(sweep.len())).next_power_of_two();

    tracing::debug!(
        "deconvolving {} response samples with {} sweep samples, fft size {fft_len}",
        response.len(),
        sweep.len()
    );

    let mut response = to_padded_complex(response, fft_len);
    let mut sweep = to_padded_complex(sweep, fft_len);

    // convert into frequency domain
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(fft_len);

    fft.process(&mut response);
    fft.process(&mut sweep);

    let sweep_peak = sweep.iter().fold(0.0f64, |peak, s| peak.max(s.norm()));
    if sweep_peak == 0.0 {
        tracing::warn!("reference sweep is silent, impulse response will be all zeros");
        return Ok(ImpulseResponse::new(sample_rate, vec![0.0; target_length]));
    }

    let epsilon = REGULARIZATION * sweep_peak;

    let mut transfer: Vec<Complex<f64>> = response
        .iter()
        .zip(sweep.iter())
        .map(|(r, s)| *r * s.conj() / (s.norm_sqr() + epsilon))
        .collect();

    // back to time domain
    let ifft = planner.plan_fft_inverse(fft_len);
    ifft.process(&mut transfer);

    let scale = 1.0 / fft_len as f64;
    let mut data: Vec<f64> = transfer
        .into_iter()
        .take(target_length)
        .map(|h| h.re * scale)
        .collect();
    data.resize(target_length, 0.0);

    Ok(ImpulseResponse::new(sample_rate, data))
}

#[cfg(not(feature = "fft"))]
pub fn deconvolve(
    _response: &Waveform,
    _sweep: &Waveform,
    _target_length: usize,
) -> Result<ImpulseResponse, Error> {
    Err(Error::MissingDependency {
        operation: "deconvolution",
        feature: "fft",
    })
}

#[cfg(feature = "fft")]
fn to_padded_complex(waveform: &Waveform, len: usize) -> Vec<Complex<f64>> {
    let mut buffer: Vec<_> = waveform
        .iter()
        .map(|&s| Complex::new(s as f64, 0.0))
        .collect();
    buffer.resize(len, Complex::new(0.0, 0.0));

    buffer
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn direct_trim_truncates() {
        let waveform = Waveform::new(48_000, vec![0.5, -0.25, 0.125, 1.0]).unwrap();

        let ir = ImpulseResponse::from_waveform(&waveform, 2).unwrap();

        assert_eq!(ir.data, vec![0.5, -0.25]);
        assert_eq!(ir.sample_rate, 48_000);
    }

    #[test]
    fn direct_trim_pads() {
        let waveform = Waveform::new(44_100, vec![0.5, -0.25]).unwrap();

        let ir = ImpulseResponse::from_waveform(&waveform, 5).unwrap();

        assert_eq!(ir.data, vec![0.5, -0.25, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn peak_and_silence() {
        let ir = ImpulseResponse::new(48_000, vec![0.1, -0.7, 0.3]);
        assert_eq!(ir.peak(), 0.7);
        assert!(!ir.is_silent());

        let ir = ImpulseResponse::new(48_000, vec![0.0; 8]);
        assert!(ir.is_silent());
    }

    #[cfg(feature = "fft")]
    mod deconvolution {
        use super::super::*;
        use crate::signals::generate_sweep;

        fn argmax(data: &[f64]) -> usize {
            data.iter()
                .enumerate()
                .fold((0, 0.0), |(index, peak), (i, c)| {
                    if c.abs() > peak {
                        (i, c.abs())
                    } else {
                        (index, peak)
                    }
                })
                .0
        }

        #[test]
        fn delayed_sweep_peaks_at_delay() {
            let sweep = generate_sweep(0.5, 20.0, 3_500.0, 8_000).unwrap();
            let delay = 37;

            let mut delayed = vec![0.0f32; delay];
            delayed.extend(sweep.iter());
            let response = Waveform::new(8_000, delayed).unwrap();

            let ir = deconvolve(&response, &sweep, 512).unwrap();

            assert_eq!(ir.len(), 512);
            assert_eq!(argmax(&ir.data), delay);
            assert!(ir.data[delay] > 0.5);
        }

        #[test]
        fn short_sweep_still_yields_target_length() {
            let sweep = generate_sweep(0.1, 50.0, 3_000.0, 8_000).unwrap();
            let response = Waveform::new(8_000, vec![0.1; 4_000]).unwrap();

            let ir = deconvolve(&response, &sweep, 3_000).unwrap();

            assert_eq!(ir.len(), 3_000);
        }

        #[test]
        fn target_longer_than_fft_is_zero_padded() {
            let sweep = generate_sweep(0.01, 50.0, 3_000.0, 8_000).unwrap();

            let ir = deconvolve(&sweep, &sweep, 1_000).unwrap();

            // 80 samples => fft size 256
            assert_eq!(ir.len(), 1_000);
            assert!(ir.data[256..].iter().all(|&c| c == 0.0));
        }

        #[test]
        fn rate_mismatch() {
            let a = Waveform::new(8_000, vec![0.1; 16]).unwrap();
            let b = Waveform::new(16_000, vec![0.1; 16]).unwrap();

            let result = deconvolve(&a, &b, 8);

            assert!(matches!(result, Err(Error::SampleRateMismatch { .. })));
        }

        #[test]
        fn silent_sweep_gives_silent_ir() {
            let sweep = Waveform::new(8_000, vec![0.0; 64]).unwrap();
            let response = Waveform::new(8_000, vec![0.3; 64]).unwrap();

            let ir = deconvolve(&response, &sweep, 32).unwrap();

            assert!(ir.is_silent());
            assert_eq!(ir.len(), 32);
        }
    }

    #[cfg(not(feature = "fft"))]
    #[test]
    fn deconvolution_needs_fft() {
        let waveform = Waveform::new(8_000, vec![0.1; 16]).unwrap();

        let result = deconvolve(&waveform, &waveform, 8);

        assert!(matches!(result, Err(Error::MissingDependency { .. })));
    }
}
