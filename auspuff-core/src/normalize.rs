use crate::ImpulseResponse;

/// Scales `ir` so its largest absolute coefficient is exactly 1.0.
///
/// A silent response is returned untouched.
pub fn normalize(mut ir: ImpulseResponse) -> ImpulseResponse {
    let peak = ir.peak();

    if peak == 0.0 {
        tracing::warn!("impulse response is silent, skipping normalization");
        return ir;
    }

    for c in ir.data.iter_mut() {
        *c /= peak;
    }

    ir
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn peak_becomes_one() {
        let ir = ImpulseResponse::new(48_000, vec![0.1, -0.4, 0.2]);

        let ir = normalize(ir);

        assert_eq!(ir.peak(), 1.0);
        assert_eq!(ir.data, vec![0.25, -1.0, 0.5]);
    }

    #[test]
    fn idempotent() {
        let ir = ImpulseResponse::new(48_000, vec![0.3, -0.07, 0.9, 0.013, -0.5]);

        let once = normalize(ir);
        let twice = normalize(once.clone());

        assert_eq!(once, twice);
    }

    #[test]
    fn silence_is_left_alone() {
        let ir = ImpulseResponse::new(48_000, vec![0.0; 16]);

        let normalized = normalize(ir.clone());

        assert_eq!(normalized, ir);
    }
}
