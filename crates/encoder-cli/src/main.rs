//! encoder-bench
//!
//! Validates one encoder forward kernel against the sequential reference and
//! reports its latency and estimated memory bandwidth per block size.

use std::io::IsTerminal;

use anyhow::{Context, Result};
use clap::Parser;
use encoder_common::{BenchConfig, EncoderError};
use encoder_kernels::{Backend, DeviceKind, HostSimtBackend, KernelVariant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use encoder_cli::cli::{Cli, LogFormat, OutputFormat};
use encoder_cli::exit::{EXIT_SUCCESS, exit_code_for};
use encoder_cli::harness;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code_for(&e));
    }

    let code = match run(&cli) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            error!("{e}");
            let mut source = e.source();
            while let Some(err) = source {
                error!("  Caused by: {err}");
                source = err.source();
            }
            exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> Result<()> {
    // an unknown selector must fail before anything is printed or computed
    let variant = KernelVariant::from_selector(cli.kernel)?;
    let config = cli.to_config().context("invalid benchmark configuration")?;
    variant.check_shape(&config.shape)?;
    let device = DeviceKind::from(cli.device).resolve()?;
    info!(%device, shape = %config.shape, "configuration ready");

    println!("Using kernel {}", variant.selector());

    #[cfg(feature = "cuda")]
    if device == DeviceKind::Cuda {
        return bench(cli, &config, &encoder_kernels::CudaBackend::new()?, variant);
    }
    bench(cli, &config, &HostSimtBackend::new(), variant)
}

fn bench<B: Backend>(cli: &Cli, config: &BenchConfig, backend: &B, variant: KernelVariant) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            harness::run_with(config, backend, variant, |row| println!("{row}"))?;
        }
        OutputFormat::Json => {
            let report = harness::run(config, backend, variant)?;
            println!("{}", report.to_json().context("failed to serialize report")?);
        }
    }
    Ok(())
}

/// Logs go to stderr so stdout carries only the report.
fn setup_logging(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_new(&cli.log_level)
        .map_err(|e| EncoderError::invalid(format!("invalid log level `{}`: {e}", cli.log_level)))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    let installed = match cli.log_format {
        LogFormat::Json => {
            subscriber.json().with_timer(tracing_subscriber::fmt::time::uptime()).try_init()
        }
        LogFormat::Compact => subscriber.compact().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}
