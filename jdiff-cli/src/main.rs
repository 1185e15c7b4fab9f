//! jdiff — entry point.
//!
//! ```text
//! jdiff encode <frames-dir> <out-dir> [--version N] [--quality Q]
//! jdiff decode <encoded-dir> <out-dir>
//! jdiff --config <path>           Load a custom config TOML
//! jdiff --gen-config              Write default config to stdout
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use jdiff_cli::config::CliConfig;
use jdiff_cli::pipeline;
use jdiff_core::Version;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "jdiff", about = "Drift-free JPEG difference encoder")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "jdiff.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a directory of JPEG frames into a difference stream.
    Encode {
        /// Directory of input frames, encoded in file-name order.
        input: PathBuf,
        /// Directory receiving encoded frames and manifest.json.
        output: PathBuf,
        /// Diff version (1-4); overrides the config file.
        #[arg(short, long)]
        version: Option<Version>,
        /// Compression quality (1-100); overrides the config file.
        #[arg(short, long)]
        quality: Option<u8>,
    },
    /// Reconstruct the frames a viewer would display.
    Decode {
        /// Directory written by `encode`.
        input: PathBuf,
        /// Directory receiving reconstructed JPEG frames.
        output: PathBuf,
    },
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&CliConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let Some(command) = cli.command else {
        eprintln!("nothing to do; see `jdiff --help`");
        std::process::exit(2);
    };

    let mut config = CliConfig::load(&cli.config);

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("jdiff v{}", env!("CARGO_PKG_VERSION"));

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received; stopping after the current frame");
        flag.store(false, Ordering::SeqCst);
    });

    match command {
        Command::Encode {
            input,
            output,
            version,
            quality,
        } => {
            if let Some(version) = version {
                config.encoder.version = version;
            }
            if let Some(quality) = quality {
                config.encoder.quality = quality;
            }
            info!(
                "version: {}, quality: {}",
                config.encoder.version, config.encoder.quality
            );

            let summary = pipeline::encode_sequence(
                &config,
                &input,
                &output,
                config.encoder.version,
                running,
            )
            .await?;
            info!(
                "wrote {} frames ({} skipped) in {:.2?}; {} -> {} bytes, ratio {:.3}",
                summary.frames_written,
                summary.frames_skipped,
                summary.elapsed,
                summary.stats.input_bytes,
                summary.stats.output_bytes,
                summary.stats.compression_ratio(),
            );
            if let Some(rate) = summary.throughput {
                info!(
                    "recent rate: {:.1} fps, {:.0} B/s",
                    rate.frames_per_sec, rate.bytes_per_sec
                );
            }
            if summary.stats.reconstruction_failures > 0 {
                tracing::warn!(
                    "{} reconstruction failures; later frames may have drifted",
                    summary.stats.reconstruction_failures
                );
            }
        }
        Command::Decode { input, output } => {
            let summary = pipeline::decode_sequence(&config, &input, &output, running).await?;
            info!(
                "reconstructed {} frames from {} bytes in {:.2?}",
                summary.frames_written, summary.bytes_read, summary.elapsed
            );
        }
    }

    Ok(())
}
