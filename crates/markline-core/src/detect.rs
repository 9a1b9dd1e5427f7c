use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    config::ConfigError,
    model::{AUTO_MARKER_PREFIX, AudioSource, Marker},
};

pub const DETECTION_STRIDE: usize = 200;
pub const DEFAULT_THRESHOLD: f32 = 0.5;
pub const DEFAULT_MIN_DISTANCE_SECONDS: f64 = 0.3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DetectionSettings {
    threshold: f32,
    min_distance_seconds: f64,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_distance_seconds: DEFAULT_MIN_DISTANCE_SECONDS,
        }
    }
}

impl DetectionSettings {
    pub fn new(threshold: f32, min_distance_seconds: f64) -> Result<Self, ConfigError> {
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        if !(min_distance_seconds.is_finite() && min_distance_seconds > 0.0) {
            return Err(ConfigError::InvalidMinDistance(min_distance_seconds));
        }
        Ok(Self {
            threshold,
            min_distance_seconds,
        })
    }

    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    #[must_use]
    pub fn min_distance_seconds(&self) -> f64 {
        self.min_distance_seconds
    }
}

#[derive(Debug, Clone, Default)]
pub struct AutoDetector {
    settings: DetectionSettings,
}

impl AutoDetector {
    #[must_use]
    pub fn new(settings: DetectionSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> DetectionSettings {
        self.settings
    }

    #[must_use]
    pub fn detect_source(&self, source: &AudioSource, existing_marker_count: usize) -> Vec<Marker> {
        detect(
            source.primary_channel(),
            source.sample_rate(),
            self.settings.threshold,
            self.settings.min_distance_seconds,
            existing_marker_count,
        )
    }
}

/// Emits `Auto-<n>` markers where the amplitude exceeds `threshold`, at least
/// `min_distance_seconds` apart. The first qualifying stride point always
/// emits, including one at time zero. Numbering continues after
/// `existing_marker_count`.
#[instrument(skip(samples), fields(samples = samples.len()))]
#[must_use]
pub fn detect(
    samples: &[f32],
    sample_rate: u32,
    threshold: f32,
    min_distance_seconds: f64,
    existing_marker_count: usize,
) -> Vec<Marker> {
    if sample_rate == 0 {
        return Vec::new();
    }

    let rate = f64::from(sample_rate);
    let mut last_emitted: Option<f64> = None;
    let mut markers = Vec::new();

    for (index, sample) in samples.iter().enumerate().step_by(DETECTION_STRIDE) {
        let current_time = index as f64 / rate;
        let spaced = last_emitted.is_none_or(|last| current_time - last > min_distance_seconds);
        if sample.abs() > threshold && spaced {
            let ordinal = existing_marker_count + markers.len() + 1;
            markers.push(Marker::new(
                current_time,
                format!("{AUTO_MARKER_PREFIX}{ordinal}"),
            ));
            last_emitted = Some(current_time);
        }
    }

    debug!(emitted = markers.len(), "auto detection complete");
    markers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_reject_out_of_range_values() {
        assert!(DetectionSettings::new(0.0, 0.3).is_err());
        assert!(DetectionSettings::new(1.0, 0.3).is_err());
        assert!(DetectionSettings::new(f32::NAN, 0.3).is_err());
        assert!(DetectionSettings::new(0.4, 0.0).is_err());
        assert!(DetectionSettings::new(0.4, f64::INFINITY).is_err());
        assert!(DetectionSettings::new(0.4, 0.1).is_ok());
    }

    #[test]
    fn only_stride_points_are_inspected() {
        let mut samples = vec![0.0_f32; 1_000];
        samples[199] = 0.9;
        samples[201] = 0.9;
        assert!(detect(&samples, 1_000, 0.5, 0.1, 0).is_empty());

        samples[400] = 0.9;
        let markers = detect(&samples, 1_000, 0.5, 0.1, 0);
        assert_eq!(markers.len(), 1);
        assert!((markers[0].time - 0.4).abs() < 1e-9);
    }

    #[test]
    fn zero_sample_rate_yields_nothing() {
        assert!(detect(&[1.0; 400], 0, 0.5, 0.3, 0).is_empty());
    }
}
