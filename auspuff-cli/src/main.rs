mod log;
mod output;
mod settings;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use auspuff_core::{
    analysis, dbfs,
    pipeline::{produce, Options, Producer, Produced},
    signals::generate_sweep,
    synth::{Backend, PhaseMode},
    wav, CoefficientTable, VehicleProfile,
};

use output::Library;
use settings::Settings;

/// Upper edge of the band reported as low frequency energy.
const LOW_BAND_HZ: f64 = 500.0;

#[derive(Parser)]
#[clap(author, version, about = "Exhaust impulse responses for the engine simulator")]
struct Cli {
    /// Log more, repeat for trace output
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Also write a JSON log to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// Settings file, defaults to ./auspuff.toml if present
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    subcommand: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fabricate an impulse response from a vehicle profile
    Synth {
        profile: String,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, value_enum, default_value_t)]
        phase: Phase,
        #[arg(long, value_enum, default_value_t)]
        backend: BackendChoice,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Turn a recording into an impulse response
    Convert {
        /// Recorded impulse, or the recorded sweep response with --sweep
        input: PathBuf,
        /// Reference sweep that was played during the recording
        #[arg(long)]
        sweep: Option<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Write a logarithmic calibration sweep
    Sweep {
        output: PathBuf,
        /// Length in seconds
        #[arg(short, long)]
        duration: Option<f64>,
        /// Start frequency in Hz
        #[arg(long = "start")]
        start_frequency: Option<f64>,
        /// End frequency in Hz
        #[arg(long = "end")]
        end_frequency: Option<f64>,
        #[arg(long)]
        sample_rate: Option<u32>,
    },
    /// List the vehicle profiles
    Profiles,
    /// Synthesize every profile into a directory and build the library
    Batch {
        out_dir: PathBuf,
        #[arg(long)]
        samples: Option<usize>,
        #[arg(long)]
        sample_rate: Option<u32>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Header file to write, stdout if omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// C identifier of the preset
    #[arg(short, long, default_value = "custom")]
    name: String,
    /// Number of coefficients
    #[arg(long)]
    samples: Option<usize>,
    #[arg(long)]
    sample_rate: Option<u32>,
    #[arg(long)]
    no_normalize: bool,
    /// Append to the output file instead of replacing it
    #[arg(long, requires = "output")]
    append: bool,
    /// Add the preset to impulse_library.h next to the output
    #[arg(long, requires = "output")]
    update_library: bool,
    /// Also write the impulse response as 32 bit float wav
    #[arg(long)]
    wav: Option<PathBuf>,
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum Phase {
    #[default]
    Random,
    Fixed,
}

impl From<Phase> for PhaseMode {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Random => PhaseMode::Random,
            Phase::Fixed => PhaseMode::Fixed,
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum BackendChoice {
    #[default]
    Auto,
    Vectorized,
    Scalar,
}

impl From<BackendChoice> for Backend {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Auto => Backend::detect(),
            BackendChoice::Vectorized => Backend::Vectorized,
            BackendChoice::Scalar => Backend::Scalar,
        }
    }
}

impl OutputArgs {
    fn options(&self, settings: &Settings, backend: Backend) -> Options {
        Options {
            samples: self.samples.unwrap_or(settings.samples),
            sample_rate: self.sample_rate.unwrap_or(settings.sample_rate),
            normalize: !self.no_normalize,
            backend,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    log::init(cli.verbose, cli.log_file.as_deref()).context("could not set up logging")?;
    let settings = Settings::load(cli.config.as_deref()).context("could not load settings")?;

    match cli.subcommand {
        Command::Synth {
            profile,
            seed,
            phase,
            backend,
            output,
        } => {
            let options = output.options(&settings, backend.into());
            let producer = Producer::Synth {
                profile,
                seed: seed.unwrap_or(settings.seed),
                phase_mode: phase.into(),
            };

            run(&producer, &options, &output)
        }
        Command::Convert {
            input,
            sweep,
            output,
        } => {
            let options = output.options(&settings, Backend::detect());
            let producer = match sweep {
                Some(sweep) => Producer::Deconvolve {
                    response: input,
                    sweep,
                },
                None => Producer::Trim { input },
            };

            run(&producer, &options, &output)
        }
        Command::Sweep {
            output,
            duration,
            start_frequency,
            end_frequency,
            sample_rate,
        } => {
            let duration = duration.unwrap_or(settings.sweep_duration);
            let start_frequency = start_frequency.unwrap_or(settings.sweep_start);
            let end_frequency = end_frequency.unwrap_or(settings.sweep_end);
            let sample_rate = sample_rate.unwrap_or(settings.sample_rate);

            let sweep = generate_sweep(duration, start_frequency, end_frequency, sample_rate)?;
            wav::write_pcm16(&output, sweep.iter().copied(), sample_rate)
                .with_context(|| format!("could not write {}", output.display()))?;

            tracing::info!(
                "sweep written to {} ({duration}s, {start_frequency:.0} Hz to {end_frequency:.0} Hz @ {sample_rate} Hz)",
                output.display()
            );

            Ok(())
        }
        Command::Profiles => {
            println!("Available vehicle profiles:");
            for profile in VehicleProfile::all() {
                println!("  {:<25} {}", profile.name, profile.description);
            }

            Ok(())
        }
        Command::Batch {
            out_dir,
            samples,
            sample_rate,
            seed,
        } => {
            let options = Options {
                samples: samples.unwrap_or(settings.samples),
                sample_rate: sample_rate.unwrap_or(settings.sample_rate),
                normalize: true,
                backend: Backend::detect(),
            };

            batch(&out_dir, &options, seed.unwrap_or(settings.seed))
        }
    }
}

fn run(producer: &Producer, options: &Options, args: &OutputArgs) -> anyhow::Result<()> {
    let Produced { ir, metadata } = produce(producer, options)?;
    let table = CoefficientTable::new(&ir, &args.name, metadata)?;

    report(&table, ir.sample_rate);

    // everything that can fail without I/O is done before the first write
    let library = match (&args.output, args.update_library) {
        (Some(path), true) => {
            let mut library = Library::beside(path)?;
            library.record(&table, output::header_name(path)?);
            Some(library)
        }
        _ => None,
    };

    if let Some(path) = &args.wav {
        wav::write_float(path, ir.iter().map(|&c| c as f32), ir.sample_rate)
            .with_context(|| format!("could not write {}", path.display()))?;
        tracing::info!("impulse response preview written to {}", path.display());
    }

    match &args.output {
        Some(path) => {
            output::write_header(path, &table, args.append)?;
            tracing::info!("saved {} ({} coefficients)", path.display(), table.len());
        }
        None => print!("{table}"),
    }

    if let Some(library) = library {
        let path = library.write()?;
        tracing::info!(
            "updated {} ({} presets)",
            path.display(),
            library.registry().len()
        );
    }

    Ok(())
}

fn batch(out_dir: &Path, options: &Options, seed: u64) -> anyhow::Result<()> {
    let tables = std::thread::scope(|scope| {
        let handles: Vec<_> = VehicleProfile::all()
            .iter()
            .map(|profile| {
                scope.spawn(move || {
                    let producer = Producer::Synth {
                        profile: profile.name.to_string(),
                        seed,
                        phase_mode: PhaseMode::Random,
                    };
                    let Produced { ir, metadata } = produce(&producer, options)?;

                    CoefficientTable::new(&ir, profile.name, metadata)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(table) => table.map_err(anyhow::Error::from),
                Err(_) => Err(anyhow::anyhow!("synthesis thread panicked")),
            })
            .collect::<anyhow::Result<Vec<_>>>()
    })?;

    let mut library = Library::open(out_dir)?;
    let headers: Vec<_> = tables
        .iter()
        .map(|table| format!("{}.h", table.name()))
        .collect();
    for (table, header) in tables.iter().zip(&headers) {
        library.record(table, header);
    }

    fs::create_dir_all(out_dir)
        .with_context(|| format!("could not create {}", out_dir.display()))?;

    for (table, header) in tables.iter().zip(&headers) {
        output::write_header(&out_dir.join(header), table, false)?;
        report(table, options.sample_rate);
    }

    library.write()?;

    tracing::info!(
        "{} presets written to {}",
        tables.len(),
        out_dir.display()
    );

    Ok(())
}

fn report(table: &CoefficientTable, sample_rate: u32) {
    let data = table.coefficients();

    tracing::info!(
        "`{}`: {} coefficients, peak {:.2} dBFS, rms {:.2} dBFS",
        table.name(),
        table.len(),
        dbfs(analysis::peak(data)),
        dbfs(analysis::rms(data))
    );

    if let Some(frequency) = analysis::dominant_frequency(data, sample_rate) {
        tracing::debug!(
            "`{}`: dominant frequency {frequency:.1} Hz, {:.0}% of the energy below {LOW_BAND_HZ} Hz",
            table.name(),
            100.0 * analysis::energy_below(data, sample_rate, LOW_BAND_HZ)
        );
    }
}
