use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use reverb_sampler::sensor::simulated::{SimulatedMicrophone, SimulatedRangefinder};
use reverb_sampler::telemetry::TelemetrySnapshot;
use reverb_sampler::{
    Channel, ChannelId, Clock, ManualClock, Pacer, RecordReader, SamplerConfig, SamplerLoop,
    SystemClock, ThreadPacer, Variant,
};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "reverb_cli",
    about = "Reverberation sampler: desktop simulation and host-side record tools"
)]
struct Cli {
    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the sampling loop on simulated sensors, writing records to stdout
    Simulate(SimulateArgs),
    /// Read protocol lines and print one JSON object per valid record
    Parse(ParseArgs),
    /// Print the timing preset for a variant as JSON
    Config {
        #[arg(long, value_enum, default_value_t = Variant::DualChannel)]
        variant: Variant,
    },
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[arg(long, value_enum, default_value_t = Variant::DualChannel)]
    variant: Variant,
    /// Number of records to produce before exiting
    #[arg(long, default_value_t = 4)]
    cycles: u64,
    /// Seed for the simulated sensors
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Pace the loop on the wall clock instead of virtual time
    #[arg(long, default_value_t = false)]
    realtime: bool,
    /// Print the Reverberation(s) header first (loudness-only variant)
    #[arg(long, default_value_t = false)]
    header: bool,
    /// Print a telemetry summary as JSON on stderr when done
    #[arg(long, default_value_t = false)]
    summary: bool,
}

#[derive(Args, Debug)]
struct ParseArgs {
    #[arg(long, value_enum, default_value_t = Variant::DualChannel)]
    variant: Variant,
    /// Exit with status 2 if any line was rejected
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Input file (defaults to stdin)
    input: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Simulate(args) => run_simulate(&args),
        Commands::Parse(args) => run_parse(&args),
        Commands::Config { variant } => run_config(variant),
    }
}

fn run_simulate(args: &SimulateArgs) -> Result<ExitCode> {
    let config = SamplerConfig::for_variant(args.variant);
    let channels = simulated_channels(args.variant, args.seed);

    let snapshot = if args.realtime {
        drive(config, channels, SystemClock::new(), ThreadPacer::default(), args)?
    } else {
        let clock = ManualClock::new();
        drive(config, channels, &clock, &clock, args)?
    };

    if args.summary {
        eprintln!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(ExitCode::from(0))
}

fn drive<C: Clock, P: Pacer>(
    config: SamplerConfig,
    channels: Vec<Channel>,
    clock: C,
    pacer: P,
    args: &SimulateArgs,
) -> Result<TelemetrySnapshot> {
    let stdout = io::stdout().lock();
    let mut sampler_loop = SamplerLoop::new(config, channels, clock, pacer, stdout)
        .context("assembling sampling loop")?
        .with_header(args.header);
    Ok(sampler_loop.run(Some(args.cycles)))
}

fn simulated_channels(variant: Variant, seed: u64) -> Vec<Channel> {
    let ids: &[ChannelId] = match variant {
        Variant::DualChannel => &[ChannelId::A, ChannelId::B],
        Variant::SingleChannel | Variant::LoudnessOnly => &[ChannelId::A],
    };

    ids.iter()
        .map(|&id| {
            let channel_seed = seed.wrapping_add(u64::from(id.get()) * 1_000);
            let microphone = SimulatedMicrophone::new(channel_seed);
            if variant.reads_distance() {
                Channel::new(id, SimulatedRangefinder::new(channel_seed + 1), microphone)
            } else {
                Channel::loudness_only(id, microphone)
            }
        })
        .collect()
}

fn run_parse(args: &ParseArgs) -> Result<ExitCode> {
    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let mut reader = RecordReader::new(input, args.variant);
    let mut stdout = io::stdout().lock();
    let mut accepted = 0usize;
    for record in reader.by_ref() {
        writeln!(stdout, "{}", serde_json::to_string(&record)?)?;
        accepted += 1;
    }
    stdout.flush()?;

    tracing::info!(
        "Parsed {} record(s) from {} line(s), {} rejected",
        accepted,
        reader.lines_read(),
        reader.rejected()
    );

    if args.strict && reader.rejected() > 0 {
        eprintln!("{} line(s) rejected", reader.rejected());
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::from(0))
}

fn run_config(variant: Variant) -> Result<ExitCode> {
    let config = SamplerConfig::for_variant(variant);
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(ExitCode::from(0))
}
