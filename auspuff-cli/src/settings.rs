use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use auspuff_core::{
    pipeline::{DEFAULT_SAMPLES, DEFAULT_SAMPLE_RATE},
    synth::DEFAULT_SEED,
};

const SETTINGS_FILE: &str = "auspuff";
const ENV_PREFIX: &str = "AUSPUFF";

/// Defaults for everything a command line flag can leave out.
///
/// Layered lowest to highest: built in values, `auspuff.toml` in the working
/// directory (or the file given with `--config`), `AUSPUFF_*` environment
/// variables. Explicit flags win over all of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub samples: usize,
    pub sample_rate: u32,
    pub seed: u64,
    pub sweep_duration: f64,
    pub sweep_start: f64,
    pub sweep_end: f64,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(SETTINGS_FILE).required(false),
        };

        Config::builder()
            .set_default("samples", DEFAULT_SAMPLES as i64)?
            .set_default("sample_rate", DEFAULT_SAMPLE_RATE as i64)?
            .set_default("seed", DEFAULT_SEED as i64)?
            .set_default("sweep_duration", 5.0)?
            .set_default("sweep_start", 20.0)?
            .set_default("sweep_end", 20_000.0)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("auspuff.toml");
        std::fs::write(&path, "samples = 4096\nsweep_end = 16000.0\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();

        assert_eq!(settings.samples, 4096);
        assert_eq!(settings.sweep_end, 16_000.0);
        assert_eq!(settings.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(settings.seed, DEFAULT_SEED);
        assert_eq!(settings.sweep_duration, 5.0);
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = TempDir::new().unwrap();

        let result = Settings::load(Some(&dir.path().join("missing.toml")));

        assert!(result.is_err());
    }
}
