use std::{fs::File, path::Path, sync::Arc};

use tracing::Level;
use tracing_subscriber::{filter::Targets, fmt, prelude::*};

/// Human readable log on stderr, stdout is reserved for generated headers.
///
/// `verbosity` counts `-v` flags. With `log_file` everything from our own
/// crates is additionally written there as JSON.
pub fn init(verbosity: u8, log_file: Option<&Path>) -> Result<(), std::io::Error> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let stderr_log = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            Targets::default()
                .with_target("auspuff", level)
                .with_default(Level::WARN),
        );

    let file_log = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            Some(fmt::layer().with_writer(Arc::new(file)).json())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_log)
        .with(file_log)
        // `auspuff` also covers `auspuff_core`, targets match by prefix
        .with(
            Targets::default()
                .with_target("auspuff", Level::TRACE)
                .with_default(Level::WARN),
        )
        .init();

    Ok(())
}
