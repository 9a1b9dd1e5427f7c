use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_MARKER_NAME: &str = "Untitled";
pub const AUTO_MARKER_PREFIX: &str = "Auto-";
pub const MANUAL_MARKER_PREFIX: &str = "Marker";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Marker {
    pub id: Uuid,
    pub time: f64,
    pub name: String,
}

impl Marker {
    #[must_use]
    pub fn new(time: f64, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            time,
            name: resolve_name(name.into(), DEFAULT_MARKER_NAME),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioSource {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
    duration: f64,
}

impl AudioSource {
    #[must_use]
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        let frames = channels.first().map_or(0, Vec::len);
        let duration = if sample_rate == 0 {
            0.0
        } else {
            frames as f64 / f64::from(sample_rate)
        };
        Self {
            sample_rate,
            channels,
            duration,
        }
    }

    #[must_use]
    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self::new(sample_rate, vec![samples])
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    #[must_use]
    pub fn primary_channel(&self) -> &[f32] {
        self.channel(0).unwrap_or(&[])
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.primary_channel().len()
    }
}

pub(crate) fn resolve_name(candidate: String, fallback: &str) -> String {
    if !candidate.trim().is_empty() {
        return candidate;
    }
    if fallback.trim().is_empty() {
        DEFAULT_MARKER_NAME.to_string()
    } else {
        fallback.to_string()
    }
}
