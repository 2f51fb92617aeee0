mod exponential;

pub use exponential::ExponentialSweep;

use crate::{Error, Waveform};

/// Full scale logarithmic sweep of `duration` seconds from `start_frequency`
/// to `end_frequency`.
///
/// The same waveform is used as playback stimulus and as the reference for
/// [`crate::deconvolve`].
pub fn generate_sweep(
    duration: f64,
    start_frequency: f64,
    end_frequency: f64,
    sample_rate: u32,
) -> Result<Waveform, Error> {
    if !(duration > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "sweep duration must be positive, got {duration}"
        )));
    }

    if !(start_frequency > 0.0 && end_frequency > start_frequency) {
        return Err(Error::InvalidParameter(format!(
            "sweep needs 0 < start < end, got {start_frequency} Hz to {end_frequency} Hz"
        )));
    }

    if sample_rate == 0 {
        return Err(Error::InvalidParameter(
            "sample rate must be greater than zero".to_string(),
        ));
    }

    let sweep = ExponentialSweep::new(
        start_frequency,
        end_frequency,
        1.0,
        duration,
        sample_rate,
    );

    tracing::debug!(
        "sweep: {} samples, {start_frequency} Hz to {end_frequency} Hz @ {sample_rate} Hz",
        sweep.len()
    );

    Waveform::new(sample_rate, sweep.collect())
}
