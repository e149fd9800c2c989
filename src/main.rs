mod audio;
mod config;
mod error;
mod meter;
mod settings;
mod shutdown;
mod telemetry;
mod terminal;

use clap::Parser;
use config::{LogConfig, RunConfig, VisualizerConfig};
use error::MeterError;
use meter::bar::BarOptions;
use settings::Settings;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "peakbar")]
#[command(author = "Terminal Art Generator")]
#[command(version)]
#[command(about = "Live terminal peak meter for audio inputs", long_about = None)]
struct Cli {
    /// Amount of input channels
    #[arg(short, long)]
    channels: Option<usize>,

    /// Smoothing graph with last n printed samples, set 1 to disable
    #[arg(short, long)]
    buffer: Option<usize>,

    /// Compensate weak audio signal with this amplifier value
    #[arg(short, long)]
    amplify: Option<f32>,

    /// Print value before each channel bar
    #[arg(long)]
    values: bool,

    /// Print channel index before each channel bar
    #[arg(long)]
    index: bool,

    /// Input device name (default input device if omitted)
    #[arg(short, long)]
    device: Option<String>,

    /// Requested audio block size in frames
    #[arg(long)]
    block_size: Option<u32>,

    /// Redraw interval in milliseconds
    #[arg(short, long)]
    refresh_ms: Option<u64>,

    /// List input devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Verbose logging
    #[arg(long)]
    debug: bool,

    /// Log file path
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Command line wins over the settings file, which wins over defaults.
    fn run_config(&self, settings: &Settings) -> Result<RunConfig, MeterError> {
        let file = &settings.meter;
        let bar = BarOptions {
            show_values: self.values || file.values.unwrap_or(false),
            show_index: self.index || file.index.unwrap_or(false),
        };
        let visualizer = VisualizerConfig::new(
            self.channels.or(file.channels).unwrap_or(config::DEFAULT_CHANNELS),
            self.buffer.or(file.buffer).unwrap_or(config::DEFAULT_SMOOTHING),
            self.amplify.or(file.amplify).unwrap_or(config::DEFAULT_AMPLIFY),
            bar,
        )?;

        let refresh_ms = self
            .refresh_ms
            .or(file.refresh_ms)
            .unwrap_or(config::DEFAULT_REFRESH_MS)
            .max(1);

        Ok(RunConfig {
            visualizer,
            device: self.device.clone().or_else(|| file.device.clone()),
            block_size: self.block_size.or(file.block_size),
            refresh: Duration::from_millis(refresh_ms),
        })
    }
}

fn main() {
    let cli = Cli::parse();

    telemetry::init(&LogConfig {
        debug: cli.debug,
        path: cli.log_file.clone().unwrap_or_else(LogConfig::default_path),
    });

    if let Err(err) = run(&cli) {
        error!("{err}");
        eprintln!("peakbar: {err}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), MeterError> {
    if cli.list_devices {
        for name in audio::list_input_devices()? {
            println!("{name}");
        }
        return Ok(());
    }

    let settings = Settings::load();
    let config = cli.run_config(&settings)?;
    info!("starting with {:?}", config);

    meter::run(&config)?;
    println!("Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("peakbar").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_without_flags_or_settings() {
        let config = parse(&[]).run_config(&Settings::default()).unwrap();
        assert_eq!(config.visualizer.channels, 2);
        assert_eq!(config.visualizer.smoothing, 10);
        assert!((config.visualizer.amplify - 3.5).abs() < f32::EPSILON);
        assert_eq!(config.visualizer.bar, BarOptions::default());
        assert_eq!(config.refresh, Duration::from_millis(10));
        assert!(config.device.is_none());
    }

    #[test]
    fn flags_override_settings() {
        let settings =
            Settings::parse("[meter]\nchannels = 6\nbuffer = 4\ndevice = \"pulse\"").unwrap();
        let config = parse(&["--channels", "3", "--values"]).run_config(&settings).unwrap();
        assert_eq!(config.visualizer.channels, 3);
        assert_eq!(config.visualizer.smoothing, 4);
        assert!(config.visualizer.bar.show_values);
        assert!(!config.visualizer.bar.show_index);
        assert_eq!(config.device.as_deref(), Some("pulse"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let result = parse(&["--channels", "0"]).run_config(&Settings::default());
        assert!(matches!(result, Err(MeterError::InvalidChannels(0))));

        let result = parse(&["--amplify=-2"]).run_config(&Settings::default());
        assert!(matches!(result, Err(MeterError::InvalidAmplify(_))));
    }

    #[test]
    fn huge_buffer_is_rejected_not_allocated() {
        let result = parse(&["--buffer", "18446744073709551615"]).run_config(&Settings::default());
        assert!(matches!(result, Err(MeterError::InvalidSmoothing(_))));

        let settings = Settings::parse("[meter]\nchannels = 100000").unwrap();
        let result = parse(&[]).run_config(&settings);
        assert!(matches!(result, Err(MeterError::InvalidChannels(100000))));
    }

    #[test]
    fn refresh_never_zero() {
        let config = parse(&["--refresh-ms", "0"]).run_config(&Settings::default()).unwrap();
        assert_eq!(config.refresh, Duration::from_millis(1));
    }
}
