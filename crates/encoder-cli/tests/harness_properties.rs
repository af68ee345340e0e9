//! Property tests for the end-to-end harness on the host backend.
//!
//! Key invariants tested:
//! - Any valid shape and seed validates for every variant
//! - Rows come back in block-size order with finite, non-negative bandwidth

use encoder_cli::run;
use encoder_common::{BenchConfig, EncoderShape};
use encoder_kernels::{HostSimtBackend, KernelVariant};
use proptest::prelude::*;

fn config() -> impl Strategy<Value = BenchConfig> {
    (1usize..4, 1usize..16, 1usize..8, 1usize..64, any::<u64>(), 1usize..=1024).prop_map(
        |(b, t, c4, v, seed, validation_block_size)| BenchConfig {
            shape: EncoderShape::new(b, t, c4 * 4, v).unwrap(),
            validation_block_size,
            validate_every_block_size: true,
            repeat_times: 2,
            seed,
            ..BenchConfig::default()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_every_variant_validates(cfg in config()) {
        let backend = HostSimtBackend::new();
        for variant in KernelVariant::ALL {
            let report = run(&cfg, &backend, variant).unwrap();
            let blocks: Vec<usize> = report.rows.iter().map(|r| r.block_size).collect();
            prop_assert_eq!(blocks, cfg.block_sizes.clone());
            for row in &report.rows {
                prop_assert!(row.bandwidth_gbs.is_finite() && row.bandwidth_gbs >= 0.0);
                prop_assert!(row.time_ms >= 0.0);
            }
        }
    }
}
