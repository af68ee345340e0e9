//! Command-line arguments.

use clap::{Parser, ValueEnum};
use encoder_common::{BenchConfig, DEFAULT_BLOCK_SIZES, EncoderShape, Result};
use encoder_kernels::DeviceKind;

/// Encoder forward kernel validation and bandwidth benchmark.
///
/// Validates the selected kernel against a sequential reference, then times
/// it at each block size and prints the estimated memory bandwidth.
#[derive(Debug, Parser)]
#[command(name = "encoder-bench", version)]
#[command(about = "Validate and benchmark encoder forward kernels")]
#[command(after_help = "Kernels:\n  1  thread-per-token\n  2  thread-per-element (default)\n  3  vectorized-x4 (C must be a multiple of 4)")]
pub struct Cli {
    /// Kernel variant to run
    #[arg(default_value_t = 2, allow_negative_numbers = true, value_name = "KERNEL")]
    pub kernel: i64,

    /// Batch size B
    #[arg(short = 'b', long, default_value_t = 8, value_name = "B")]
    pub batch: usize,

    /// Sequence length T
    #[arg(short = 't', long, default_value_t = 1024, value_name = "T")]
    pub seq_len: usize,

    /// Channels C
    #[arg(short = 'c', long, default_value_t = 768, value_name = "C")]
    pub channels: usize,

    /// Vocabulary size V
    #[arg(long, default_value_t = 50257, value_name = "V")]
    pub vocab: usize,

    /// Block sizes to benchmark, in order
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_BLOCK_SIZES, value_name = "N,..")]
    pub block_sizes: Vec<usize>,

    /// Block size of the correctness launch
    #[arg(long, default_value_t = 512, value_name = "N")]
    pub validation_block_size: usize,

    /// Validate at every benchmarked block size, not just the validation one
    #[arg(long)]
    pub validate_all: bool,

    /// Timed invocations per block size
    #[arg(long = "repeat", default_value_t = 1000, value_name = "N")]
    pub repeat_times: usize,

    /// Untimed invocations before each timed batch
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub warmup: usize,

    /// Seed for input generation
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Device to run on
    #[arg(long, value_enum, default_value_t = DeviceArg::Auto)]
    pub device: DeviceArg,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", value_name = "LEVEL")]
    pub log_level: String,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceArg {
    Cpu,
    Cuda,
    Auto,
}

impl From<DeviceArg> for DeviceKind {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Cpu => DeviceKind::Cpu,
            DeviceArg::Cuda => DeviceKind::Cuda,
            DeviceArg::Auto => DeviceKind::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `block_size N | time T ms | bandwidth X GB/s` lines
    Text,
    /// One JSON report on stdout
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

impl Cli {
    /// Build the benchmark configuration from the parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns [`encoder_common::EncoderError::InvalidArguments`] for a zero
    /// dimension, a block size outside `1..=1024` or zero repeats.
    pub fn to_config(&self) -> Result<BenchConfig> {
        let config = BenchConfig {
            shape: EncoderShape::new(self.batch, self.seq_len, self.channels, self.vocab)?,
            block_sizes: self.block_sizes.clone(),
            validation_block_size: self.validation_block_size,
            validate_every_block_size: self.validate_all,
            repeat_times: self.repeat_times,
            warmup: self.warmup,
            seed: self.seed,
            ..BenchConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}
