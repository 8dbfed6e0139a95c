//! vocal-reshape command line interface
//!
//! Time-stretches a vocal recording to a target tempo and shifts its pitch.

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use vocal_reshape::config::{DEFAULT_INPUT, DEFAULT_OUTPUT};
use vocal_reshape::{AudioResult, ChannelPolicy, Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "vocal-reshape")]
#[command(about = "Time-stretch and pitch-shift a vocal track to a target tempo", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Input audio file
    #[arg(value_name = "FILE", env = "VOCAL_RESHAPE_INPUT", default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Output WAV file
    #[arg(short, long, value_name = "FILE", env = "VOCAL_RESHAPE_OUTPUT", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    #[command(flatten)]
    tempo: TempoArgs,

    /// Pitch shift in semitones (negative lowers the pitch)
    #[arg(short, long, env = "VOCAL_RESHAPE_SEMITONES", default_value_t = -5, allow_negative_numbers = true)]
    semitones: i32,

    /// Known tempo of the input; skips estimation
    #[arg(long, value_name = "BPM", allow_negative_numbers = true)]
    source_bpm: Option<f64>,

    /// How to treat multi-channel input
    #[arg(long, value_enum, default_value_t = ChannelMode::Downmix)]
    channels: ChannelMode,

    /// Leave this many dB between the normalized peak and full scale
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    headroom_db: f64,
}

#[derive(clap::Args, Clone, Copy)]
struct TempoArgs {
    /// Target tempo in BPM
    #[arg(
        short = 'b',
        long = "bpm",
        env = "VOCAL_RESHAPE_BPM",
        default_value_t = 65.0,
        allow_negative_numbers = true
    )]
    target_bpm: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Print stream info and tempo estimate without writing anything
    Analyze {
        /// Input audio file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        tempo: TempoArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ChannelMode {
    /// Average all channels into one
    Downmix,
    /// Refuse anything but mono input
    Reject,
}

impl From<ChannelMode> for ChannelPolicy {
    fn from(mode: ChannelMode) -> Self {
        match mode {
            ChannelMode::Downmix => ChannelPolicy::Downmix,
            ChannelMode::Reject => ChannelPolicy::Reject,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    info!("vocal-reshape {}", vocal_reshape::VERSION);

    let result = match &cli.command {
        Some(Commands::Analyze { input, tempo }) => analyze(&cli, input.clone(), *tempo),
        None => process(&cli),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn base_config(cli: &Cli, input: PathBuf, tempo: TempoArgs) -> PipelineConfig {
    let mut config = PipelineConfig::new(input, &cli.output)
        .with_target_bpm(tempo.target_bpm)
        .with_semitones(cli.semitones)
        .with_channel_policy(cli.channels.into())
        .with_headroom_db(cli.headroom_db);
    if let Some(bpm) = cli.source_bpm {
        config = config.with_source_bpm(bpm);
    }
    config
}

fn process(cli: &Cli) -> AudioResult<()> {
    let config = base_config(cli, cli.input.clone(), cli.tempo);
    let report = Pipeline::new(config)?.run()?;

    println!(
        "{:.2} BPM -> {:.2} BPM (ratio {:.3}), {:+} semitones",
        report.tempo.bpm,
        cli.tempo.target_bpm,
        report.stretch_ratio,
        report.semitones
    );
    println!(
        "{:.2} s in, {:.2} s out, {} samples written",
        report.input_duration.as_secs_f64(),
        report.output_duration.as_secs_f64(),
        report.samples_written
    );
    Ok(())
}

fn analyze(cli: &Cli, input: PathBuf, tempo: TempoArgs) -> AudioResult<()> {
    let config = base_config(cli, input, tempo);
    let report = Pipeline::new(config)?.analyze()?;
    let metadata = &report.metadata;

    println!("Codec:        {}", metadata.codec);
    println!("Sample rate:  {} Hz", metadata.sample_rate);
    println!("Channels:     {}", metadata.channels);
    if let Some(bits) = metadata.bit_depth {
        println!("Bit depth:    {}", bits.bits());
    }
    println!(
        "Duration:     {:.2} s",
        report.decoded_duration.as_secs_f64()
    );
    println!(
        "Tempo:        {:.2} BPM (confidence {:.2})",
        report.tempo.bpm, report.tempo.confidence
    );
    println!(
        "Stretch:      {:.3} to reach {} BPM, output about {:.2} s",
        report.stretch_ratio,
        tempo.target_bpm,
        report.output_duration.as_secs_f64()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocal_reshape::ErrorKind;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("vocal-reshape").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert!(cli.command.is_none());
        assert_eq!(cli.input, PathBuf::from(DEFAULT_INPUT));
        assert_eq!(cli.tempo.target_bpm, 65.0);
        assert_eq!(cli.semitones, -5);
        assert_eq!(cli.headroom_db, 0.0);
        assert!(cli.source_bpm.is_none());
        assert!(matches!(cli.channels, ChannelMode::Downmix));
    }

    #[test]
    fn test_negative_semitones_and_flags() {
        let cli = parse(&[
            "take.flac",
            "-s",
            "-7",
            "-b",
            "70",
            "--source-bpm",
            "140",
            "--channels",
            "reject",
            "-o",
            "out.wav",
        ]);
        assert_eq!(cli.input, PathBuf::from("take.flac"));
        assert_eq!(cli.output, PathBuf::from("out.wav"));
        assert_eq!(cli.semitones, -7);
        assert_eq!(cli.tempo.target_bpm, 70.0);

        let config = base_config(&cli, cli.input.clone(), cli.tempo);
        assert_eq!(config.source_bpm, Some(140.0));
        assert_eq!(config.channel_policy, ChannelPolicy::Reject);
    }

    #[test]
    fn test_negative_headroom_reaches_config_validation() {
        let cli = parse(&["take.wav", "--headroom-db", "-1", "-o", "out.wav"]);
        assert_eq!(cli.headroom_db, -1.0);

        let config = base_config(&cli, cli.input.clone(), cli.tempo);
        let err = Pipeline::new(config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn test_analyze_subcommand() {
        let cli = parse(&["-v", "analyze", "take.wav", "--bpm", "60"]);
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Analyze { input, tempo }) => {
                assert_eq!(input, PathBuf::from("take.wav"));
                assert_eq!(tempo.target_bpm, 60.0);
            }
            None => panic!("expected the analyze subcommand"),
        }
    }

    #[test]
    fn test_output_from_environment() {
        // SAFETY: no other test in this binary reads or asserts on this variable
        unsafe { std::env::set_var("VOCAL_RESHAPE_OUTPUT", "from_env.wav") };
        let cli = parse(&["take.wav"]);
        let explicit = parse(&["take.wav", "-o", "flag.wav"]);
        unsafe { std::env::remove_var("VOCAL_RESHAPE_OUTPUT") };

        assert_eq!(cli.output, PathBuf::from("from_env.wav"));
        assert_eq!(explicit.output, PathBuf::from("flag.wav"));
    }

    #[test]
    fn test_usage_errors_are_rejected_by_parser() {
        let result = Cli::try_parse_from(["vocal-reshape", "--semitones", "low"]);
        assert!(result.is_err());
    }
}
