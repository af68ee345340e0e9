//! Latency and bandwidth reporting.
//!
//! Bandwidth is an analytical estimate, not a hardware counter: every output
//! element is charged 3 reads and 1 write of 4 bytes, whether or not an
//! embedding row is reused by several tokens.

use std::fmt;
use std::time::Duration;

use encoder_common::EncoderShape;
use encoder_kernels::KernelVariant;
use serde::Serialize;

/// Bytes per `f32` / `i32` element.
pub const BYTES_PER_ELEMENT: u64 = 4;
/// Memory operations charged per output element (3 reads + 1 write).
pub const MEMORY_OPS_PER_ELEMENT: u64 = 4;

/// Estimated bytes moved by one encoder forward call: `B*T*C*4*4`.
pub fn memory_ops_bytes(shape: &EncoderShape) -> u64 {
    shape.num_elements() as u64 * MEMORY_OPS_PER_ELEMENT * BYTES_PER_ELEMENT
}

/// `bytes / time` in GB/s, clamped to a finite non-negative value.
pub fn bandwidth_gbs(bytes: u64, time_ms: f64) -> f64 {
    let bw = bytes as f64 / time_ms / 1e6;
    if bw.is_finite() && bw >= 0.0 { bw } else { 0.0 }
}

/// Measurement for one block size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchRow {
    pub block_size: usize,
    /// Average latency per call in milliseconds.
    pub time_ms: f64,
    /// Estimated achieved bandwidth in GB/s.
    pub bandwidth_gbs: f64,
}

impl BenchRow {
    pub fn new(block_size: usize, avg: Duration, shape: &EncoderShape) -> Self {
        let time_ms = avg.as_secs_f64() * 1e3;
        Self { block_size, time_ms, bandwidth_gbs: bandwidth_gbs(memory_ops_bytes(shape), time_ms) }
    }
}

impl fmt::Display for BenchRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block_size {:4} | time {:.4} ms | bandwidth {:.2} GB/s",
            self.block_size, self.time_ms, self.bandwidth_gbs
        )
    }
}

/// Result of a full run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchReport {
    /// Selector of the kernel that was run.
    pub kernel: u32,
    pub kernel_name: &'static str,
    pub backend: &'static str,
    pub shape: EncoderShape,
    pub repeat_times: usize,
    pub memory_ops_bytes: u64,
    pub rows: Vec<BenchRow>,
}

impl BenchReport {
    pub fn new(
        variant: KernelVariant,
        backend: &'static str,
        shape: EncoderShape,
        repeat_times: usize,
        rows: Vec<BenchRow>,
    ) -> Self {
        Self {
            kernel: variant.selector(),
            kernel_name: variant.name(),
            backend,
            shape,
            repeat_times,
            memory_ops_bytes: memory_ops_bytes(&shape),
            rows,
        }
    }

    /// One line per block size.
    pub fn render_text(&self) -> String {
        self.rows.iter().map(|row| format!("{row}\n")).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
