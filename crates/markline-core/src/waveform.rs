use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::model::AudioSource;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WaveformColumn {
    pub min: f32,
    pub max: f32,
}

impl WaveformColumn {
    pub const SILENT: Self = Self { min: 0.0, max: 0.0 };
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct WaveformBar {
    pub x: usize,
    pub y: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaveformImage {
    pub width: usize,
    pub height: usize,
    pub columns: Vec<WaveformColumn>,
}

impl WaveformImage {
    pub fn bars(&self) -> impl Iterator<Item = WaveformBar> + '_ {
        let half = self.height as f64 / 2.0;
        self.columns.iter().enumerate().map(move |(x, column)| {
            let min = f64::from(column.min);
            let max = f64::from(column.max);
            WaveformBar {
                x,
                y: (1.0 + min) * half,
                height: ((max - min) * half).max(1.0),
            }
        })
    }
}

#[must_use]
pub fn render_source(source: &AudioSource, width: usize, height: usize) -> WaveformImage {
    render(source.primary_channel(), width, height)
}

#[instrument(skip(samples), fields(samples = samples.len()))]
#[must_use]
pub fn render(samples: &[f32], width: usize, height: usize) -> WaveformImage {
    if width == 0 {
        return WaveformImage {
            width,
            height,
            columns: Vec::new(),
        };
    }

    let step = samples.len().div_ceil(width).max(1);
    let mut columns = Vec::with_capacity(width);
    for index in 0..width {
        let start = index.saturating_mul(step);
        let column = samples
            .get(start..samples.len().min(start.saturating_add(step)))
            .filter(|bucket| !bucket.is_empty())
            .map_or(WaveformColumn::SILENT, |bucket| {
                bucket.iter().fold(
                    WaveformColumn {
                        min: f32::INFINITY,
                        max: f32::NEG_INFINITY,
                    },
                    |acc, &sample| WaveformColumn {
                        min: acc.min.min(sample),
                        max: acc.max.max(sample),
                    },
                )
            });
        columns.push(column);
    }

    debug!(width, height, step, "waveform rendered");
    WaveformImage {
        width,
        height,
        columns,
    }
}
