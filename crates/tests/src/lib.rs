//! # Integration Tests
//!
//! Workspace-level tests.
//!
//! Covers:
//! - Contract snapshot tests
//! - Synthetic end-to-end tracking (generator -> driver -> tracker)
//! - Fatal error propagation through the driver

#[cfg(test)]
mod contract_tests {
    use contracts::{ContractError, StreamTag, TrackerConfig, TRACKING_LOST_TAG};

    #[test]
    fn test_tracking_lost_key() {
        assert_eq!(TRACKING_LOST_TAG, "tracking_lost");
        assert!(StreamTag::tracking_lost(0).is_tracking_lost());
    }

    #[test]
    fn test_fatal_taxonomy() {
        assert!(ContractError::initialization("pss", "bad").is_fatal());
        assert!(ContractError::channel_estimation("singular").is_fatal());
        assert!(!ContractError::config_validation("cell_id", "bad").is_fatal());
        assert!(!ContractError::stream_format("partial").is_fatal());
    }

    #[test]
    fn test_config_file_to_tracker() {
        let toml = r#"
cell_id = 2
psr_threshold = 3.5
track_after = 4
track_every = 4
"#;
        let config =
            config_loader::ConfigLoader::load_from_str(toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert_eq!(config, TrackerConfig::new(2, 3.5, 4, 4));

        let tracker = sync_engine::ReferenceTracker::from_config(config).unwrap();
        assert_eq!(tracker.geometry().frame_len, 9600);
        assert!(!tracker.is_locked());
    }

    #[test]
    fn test_unknown_cell_fails_initialization() {
        let mut config = TrackerConfig::default();
        config.cell_id = 3;
        let err = sync_engine::ReferenceTracker::from_config(config).unwrap_err();
        assert!(matches!(err, ContractError::Initialization { .. }));
    }
}

#[cfg(test)]
mod e2e_tests {
    use contracts::{FrequencyCorrection, Sample, TrackerConfig};
    use ingestion::{GeneratorConfig, SignalGenerator, StreamDriver, StreamOutput};
    use observability::TrackerMetricsAggregator;
    use sync_engine::{PssCorrector, ReferenceTracker};

    const FRAME: usize = 9600;
    const SYMBOL_START: usize = 832;
    const SYMBOL_END: usize = 960;

    fn generate(config: GeneratorConfig, frames: usize) -> Vec<Sample> {
        SignalGenerator::new(config).unwrap().generate(frames)
    }

    /// Drive the whole stream, aggregating per-step metrics
    fn track(
        config: TrackerConfig,
        samples: &[Sample],
    ) -> (StreamOutput, ReferenceTracker, TrackerMetricsAggregator) {
        let tracker = ReferenceTracker::from_config(config).unwrap();
        let mut driver = StreamDriver::new(tracker);
        let mut aggregator = TrackerMetricsAggregator::new();

        driver.extend(samples);
        while let Some(result) = driver.step().unwrap() {
            aggregator.update(&result, &driver.processor().status());
        }

        let output = driver.take_output();
        (output, driver.into_processor(), aggregator)
    }

    fn symbol_power(frame: &[Sample]) -> f32 {
        frame[SYMBOL_START..SYMBOL_END]
            .iter()
            .map(|s| s.norm_sqr())
            .sum::<f32>()
            / (SYMBOL_END - SYMBOL_START) as f32
    }

    #[test]
    fn test_locks_and_emits_aligned_frames() {
        let samples = generate(GeneratorConfig::default(), 20);
        let (output, tracker, aggregator) = track(TrackerConfig::new(0, 3.0, 3, 4), &samples);

        assert!(tracker.is_locked());
        assert!(output.tags.is_empty());
        assert_eq!(output.dropped, 0);
        assert_eq!(output.samples.len() as u64, output.frames * FRAME as u64);
        // The last frame stays buffered
        assert_eq!(output.frames, 19);

        for frame in output.samples.chunks(FRAME) {
            assert!(symbol_power(frame) > 0.5);
            let idle = frame[..SYMBOL_START]
                .iter()
                .map(|s| s.norm_sqr())
                .sum::<f32>()
                / SYMBOL_START as f32;
            assert!(idle < 0.1);
        }

        let summary = aggregator.summary();
        assert_eq!(summary.acquisitions, 1);
        assert!(summary.searches < summary.total_steps);
        assert!(summary.peak_quality.min > 3.0);
    }

    #[test]
    fn test_timing_offset_is_absorbed() {
        let config = GeneratorConfig {
            timing_offset: 3000,
            ..Default::default()
        };
        let samples = generate(config, 12);
        let (output, tracker, _) = track(TrackerConfig::new(0, 3.0, 2, 2), &samples);

        assert!(tracker.is_locked());
        assert!(output.frames >= 8);
        for frame in output.samples.chunks(FRAME) {
            assert!(symbol_power(frame) > 0.5);
        }
    }

    fn assert_single_loss_and_recovery(track_every: u32) {
        let config = GeneratorConfig {
            fade: Some(10..16),
            ..Default::default()
        };
        let samples = generate(config, 40);
        let (output, tracker, aggregator) =
            track(TrackerConfig::new(0, 3.0, 3, track_every), &samples);

        let lost = output.lost_offsets();
        assert_eq!(lost.len(), 1, "lost offsets {lost:?}");
        assert_eq!(lost[0] % FRAME as u64, 0);
        assert!(lost[0] < output.samples.len() as u64);

        assert!(tracker.is_locked());
        let summary = aggregator.summary();
        assert_eq!(summary.acquisitions, 2);
        assert_eq!(summary.losses, 1);
        assert!(output.dropped > 0);
    }

    #[test]
    fn test_fade_emits_one_loss_then_relocks() {
        assert_single_loss_and_recovery(0);
    }

    #[test]
    fn test_fade_with_skipped_searches() {
        assert_single_loss_and_recovery(3);
    }

    #[test]
    fn test_frequency_offset_is_estimated_and_removed() {
        let config = GeneratorConfig {
            frequency_offset: 0.2,
            ..Default::default()
        };
        let samples = generate(config, 16);
        let (output, tracker, _) = track(TrackerConfig::new(0, 3.0, 2, 0), &samples);

        assert!(tracker.is_locked());
        let status = tracker.status();
        assert!(
            (status.frequency_offset_mean - 0.2).abs() < 0.05,
            "offset {}",
            status.frequency_offset_mean
        );

        // Residual offset of the last corrected frame
        let mut checker = PssCorrector::new(0, tracker.geometry()).unwrap();
        let last = output.samples.chunks(FRAME).last().unwrap();
        let residual = checker.estimate_offset(&last[SYMBOL_START..SYMBOL_END]);
        assert!(residual.abs() < 0.05, "residual {residual}");

        let power = tracker.channel_estimate().mean_power();
        assert!((0.8..1.2).contains(&power), "channel power {power}");
    }

    #[test]
    fn test_noise_never_locks() {
        let config = GeneratorConfig {
            fade: Some(0..10),
            ..Default::default()
        };
        let samples = generate(config, 10);
        let (output, tracker, aggregator) = track(TrackerConfig::new(0, 3.0, 3, 4), &samples);

        assert!(!tracker.is_locked());
        assert_eq!(output.frames, 0);
        assert!(output.tags.is_empty());
        assert_eq!(aggregator.summary().acquisitions, 0);
        assert_eq!(tracker.status().score, 0);
    }
}

#[cfg(test)]
mod fatal_tests {
    use contracts::{ContractError, PeakResult, Sample, SyncSearch, TrackerConfig};
    use ingestion::{IngestionError, StreamDriver};
    use sync_engine::{PssCorrector, PssTracker};

    /// Reports a peak far past the end of any window
    struct RunawaySearch;

    impl SyncSearch for RunawaySearch {
        fn search(&mut self, _samples: &[Sample]) -> PeakResult {
            PeakResult {
                position: 1_000_000,
                quality: 100.0,
            }
        }

        fn reset_averaging(&mut self) {}
    }

    #[test]
    fn test_alignment_violation_propagates_through_driver() {
        let config = TrackerConfig::new(0, 3.0, 3, 4);
        let correction = PssCorrector::new(0, config.geometry()).unwrap();
        let tracker = PssTracker::new(config, RunawaySearch, correction).unwrap();
        let mut driver = StreamDriver::new(tracker);
        driver.extend(&vec![Sample::new(0.0, 0.0); 2 * 9600]);

        let err = driver.step().unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            IngestionError::Processor(ContractError::AlignmentBounds { .. })
        ));
        assert!(driver.output().samples.is_empty());
    }
}
