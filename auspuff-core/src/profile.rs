use crate::Error;

/// Parameters used to fabricate an exhaust impulse response for a vehicle
/// class without a recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleProfile {
    pub name: &'static str,
    /// Time until the harmonic envelope has decayed by 60 dB.
    pub decay_ms: f64,
    pub fundamental_hz: f64,
    /// Amplitude of the fundamental and its overtones, in order.
    pub harmonics: &'static [f64],
    pub noise_ratio: f64,
    pub description: &'static str,
}

pub const PROFILES: &[VehicleProfile] = &[
    VehicleProfile {
        name: "car_4cyl",
        decay_ms: 180.0,
        fundamental_hz: 120.0,
        harmonics: &[1.0, 0.6, 0.35, 0.18, 0.08, 0.04],
        noise_ratio: 0.05,
        description: "Naturally aspirated inline four (Fiat, VW, Toyota)",
    },
    VehicleProfile {
        name: "car_4cyl_turbo",
        decay_ms: 140.0,
        fundamental_hz: 110.0,
        harmonics: &[1.0, 0.7, 0.4, 0.2, 0.1, 0.05],
        noise_ratio: 0.08,
        description: "Turbocharged inline four",
    },
    VehicleProfile {
        name: "car_v6",
        decay_ms: 200.0,
        fundamental_hz: 100.0,
        harmonics: &[1.0, 0.5, 0.25, 0.12, 0.06, 0.03],
        noise_ratio: 0.04,
        description: "V6",
    },
    VehicleProfile {
        name: "car_v8",
        decay_ms: 220.0,
        fundamental_hz: 90.0,
        harmonics: &[1.0, 0.45, 0.22, 0.1, 0.05, 0.025],
        noise_ratio: 0.03,
        description: "American V8",
    },
    VehicleProfile {
        name: "motorcycle",
        decay_ms: 80.0,
        fundamental_hz: 280.0,
        harmonics: &[1.0, 0.8, 0.55, 0.3, 0.15, 0.07, 0.03],
        noise_ratio: 0.12,
        description: "Single or twin cylinder motorcycle",
    },
    VehicleProfile {
        name: "motorcycle_inline4",
        decay_ms: 90.0,
        fundamental_hz: 320.0,
        harmonics: &[1.0, 0.7, 0.45, 0.2, 0.08, 0.03],
        noise_ratio: 0.09,
        description: "Inline four motorcycle (Ninja, CBR)",
    },
    VehicleProfile {
        name: "truck",
        decay_ms: 300.0,
        fundamental_hz: 65.0,
        harmonics: &[1.0, 0.55, 0.28, 0.14, 0.07, 0.035],
        noise_ratio: 0.06,
        description: "Diesel truck",
    },
    VehicleProfile {
        name: "tractor",
        decay_ms: 350.0,
        fundamental_hz: 45.0,
        harmonics: &[1.0, 0.6, 0.3, 0.15],
        noise_ratio: 0.15,
        description: "Tractor / slow revving engine",
    },
    VehicleProfile {
        name: "f1",
        decay_ms: 60.0,
        fundamental_hz: 450.0,
        harmonics: &[1.0, 0.9, 0.7, 0.5, 0.35, 0.2, 0.1, 0.05],
        noise_ratio: 0.15,
        description: "F1 / race car",
    },
    VehicleProfile {
        name: "custom",
        decay_ms: 150.0,
        fundamental_hz: 150.0,
        harmonics: &[1.0, 0.5, 0.25],
        noise_ratio: 0.05,
        description: "Custom preset",
    },
];

impl VehicleProfile {
    pub fn all() -> &'static [VehicleProfile] {
        PROFILES
    }

    pub fn find(name: &str) -> Result<&'static VehicleProfile, Error> {
        PROFILES
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::UnknownProfile(name.to_string()))
    }

    /// Time constant of the harmonic envelope, chosen so that `e^(-t/τ)`
    /// reaches -60 dB at `decay_ms`.
    pub fn decay_tau(&self) -> f64 {
        self.decay_ms / 1000.0 / f64::ln(1000.0)
    }

    /// `(index, frequency, amplitude)` of every harmonic at or below
    /// Nyquist.
    pub fn audible_harmonics(&self, sample_rate: u32) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        let nyquist = sample_rate as f64 / 2.0;

        self.harmonics
            .iter()
            .enumerate()
            .map(|(i, &amplitude)| (i, self.fundamental_hz * (i + 1) as f64, amplitude))
            .take_while(move |&(_, frequency, _)| frequency <= nyquist)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup() {
        let truck = VehicleProfile::find("truck").unwrap();

        assert_eq!(truck.fundamental_hz, 65.0);
        assert_eq!(truck.harmonics.len(), 6);
    }

    #[test]
    fn unknown() {
        let result = VehicleProfile::find("hovercraft");

        assert!(matches!(result, Err(Error::UnknownProfile(name)) if name == "hovercraft"));
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in PROFILES.iter().enumerate() {
            assert!(PROFILES[i + 1..].iter().all(|b| b.name != a.name));
        }
    }

    #[test]
    fn envelope_hits_minus_60_db_at_decay_time() {
        let profile = VehicleProfile::find("car_v8").unwrap();
        let t = profile.decay_ms / 1000.0;

        let gain = f64::exp(-t / profile.decay_tau());

        assert!((gain - 1e-3).abs() < 1e-12);
    }

    #[test]
    fn harmonics_above_nyquist_are_dropped() {
        let f1 = VehicleProfile::find("f1").unwrap();

        // 450 Hz * 8 = 3600 Hz, only the first four fit below 2 kHz
        let harmonics: Vec<_> = f1.audible_harmonics(4_000).collect();

        assert_eq!(harmonics.len(), 4);
        assert_eq!(harmonics.last().unwrap().1, 1_800.0);
        assert_eq!(f1.audible_harmonics(48_000).count(), 8);
    }
}
