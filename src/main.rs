//! gesturectl - hand-gesture game controller.
//!
//! Reads a hand-landmark tracker feed, turns two-handed poses into
//! debounced game commands, and sends them to a WebSocket listener.

mod command;
mod config;
mod error;
mod gesture;
mod session;
mod sexp;
mod tracking;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use command::{CommandSink, LogSink, WebSocketSink};
use config::Config;
use gesture::{GesturePipeline, SideConvention, ThumbConvention};
use tracking::{FeedSource, FrameSource};

#[derive(Parser, Debug)]
#[command(name = "gesturectl", about = "Hand-gesture game controller")]
struct Cli {
    /// S-expression config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tracker feed to read, or `-` for stdin
    #[arg(long, default_value = "-")]
    input: PathBuf,

    /// WebSocket endpoint for commands (default: ws://127.0.0.1:8080)
    #[arg(long)]
    endpoint: Option<String>,

    /// Log commands instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Vertical midline in landmark coordinates
    #[arg(long)]
    midline: Option<f32>,

    /// Input frames are not selfie-flipped
    #[arg(long)]
    unmirrored: bool,

    /// Treat the right half of the frame as the near side
    #[arg(long)]
    swap_sides: bool,

    /// Seconds between status log lines
    #[arg(long)]
    status_interval_secs: Option<u64>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    fn resolve_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(midline) = self.midline {
            anyhow::ensure!(midline.is_finite(), "--midline must be a finite number");
            config.classifier.midline = midline;
        }
        if self.unmirrored {
            config.classifier.thumb = ThumbConvention::Unmirrored;
        }
        if self.swap_sides {
            config.classifier.sides = SideConvention::NearRight;
        }
        if let Some(secs) = self.status_interval_secs {
            anyhow::ensure!(secs > 0, "--status-interval-secs must be positive");
            config.status_interval = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("gesturectl {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesturectl=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.resolve_config()?;
    if cli.print_config {
        println!("{}", config.config_sexp());
        return Ok(());
    }

    info!("gesturectl v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "midline {}, thumb {}, sides {}",
        config.classifier.midline,
        config.classifier.thumb.as_str(),
        config.classifier.sides.as_str()
    );

    let pipeline = GesturePipeline::new(config.classifier, config.debounce.clone());
    let mut source = FeedSource::open(&cli.input)
        .with_context(|| format!("opening tracker feed {}", cli.input.display()))?;

    let mut sink: Box<dyn CommandSink> = if cli.dry_run {
        info!("dry run: commands are logged, not sent");
        Box::new(LogSink::new(config.alphabet))
    } else {
        match WebSocketSink::connect(&config.endpoint, config.alphabet) {
            Ok(sink) => Box::new(sink),
            Err(e) => {
                source.release();
                return Err(e).context("opening command channel");
            }
        }
    };

    let shutdown = session::install_signal_handlers();
    let stats = session::run(
        &mut source,
        sink.as_mut(),
        &pipeline,
        shutdown,
        config.status_interval,
    )?;

    info!(
        "gesturectl shutting down ({} frame(s), {} command(s))",
        stats.frames, stats.commands
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "gesturectl",
            "--endpoint",
            "ws://10.0.0.9:7000",
            "--midline",
            "320",
            "--unmirrored",
            "--swap-sides",
            "--status-interval-secs",
            "5",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.endpoint, "ws://10.0.0.9:7000");
        assert_eq!(config.classifier.midline, 320.0);
        assert_eq!(config.classifier.thumb, ThumbConvention::Unmirrored);
        assert_eq!(config.classifier.sides, SideConvention::NearRight);
        assert_eq!(config.status_interval, Duration::from_secs(5));
        assert_eq!(cli.input, PathBuf::from("-"));
    }

    #[test]
    fn test_no_flags_gives_defaults() {
        let cli = Cli::try_parse_from(["gesturectl"]).unwrap();
        assert_eq!(cli.resolve_config().unwrap(), Config::default());
    }

    #[test]
    fn test_zero_status_interval_rejected() {
        let cli = Cli::try_parse_from(["gesturectl", "--status-interval-secs", "0"]).unwrap();
        assert!(cli.resolve_config().is_err());
    }
}
