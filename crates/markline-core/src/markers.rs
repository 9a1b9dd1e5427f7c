use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::model::{MANUAL_MARKER_PREFIX, Marker, resolve_name};

#[derive(Debug, Error, PartialEq)]
pub enum MarkerError {
    #[error("marker time {time} is outside [0, {duration}]")]
    OutOfRange { time: f64, duration: f64 },
    #[error("marker not found: {0}")]
    NotFound(Uuid),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MarkerExport {
    pub timestamps: Vec<String>,
    pub names: Vec<String>,
}

impl MarkerExport {
    #[must_use]
    pub fn timestamps_block(&self) -> String {
        self.timestamps.join("\n")
    }

    #[must_use]
    pub fn names_block(&self) -> String {
        self.names.join("\n")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Ordered marker collection for a single timeline.
///
/// `add` and `resort` leave the markers ascending by time. `move_marker` does
/// not reorder, so a marker being dragged keeps its slot until the gesture
/// finishes and the caller invokes `resort`.
#[derive(Debug, Clone, Default)]
pub struct MarkerStore {
    markers: Vec<Marker>,
    duration: f64,
    revision: u64,
}

impl MarkerStore {
    #[must_use]
    pub fn new(duration: f64) -> Self {
        Self {
            markers: Vec::new(),
            duration: duration.max(0.0),
            revision: 0,
        }
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[instrument(skip(self), fields(markers = self.markers.len()))]
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        let mut clamped = 0_usize;
        for marker in &mut self.markers {
            let bounded = marker.time.clamp(0.0, self.duration);
            if bounded != marker.time {
                marker.time = bounded;
                clamped += 1;
            }
        }
        if clamped > 0 {
            warn!(clamped, "markers clamped to new duration");
        }
        self.resort();
    }

    #[instrument(skip(self, name), fields(duration = self.duration))]
    pub fn add(&mut self, time: f64, name: impl Into<String>) -> Result<Marker, MarkerError> {
        if !self.contains_time(time) {
            debug!("marker add rejected");
            return Err(MarkerError::OutOfRange {
                time,
                duration: self.duration,
            });
        }

        let marker = Marker::new(time, name);
        self.markers.push(marker.clone());
        self.resort();
        info!(marker_id = %marker.id, name = %marker.name, "marker added");
        Ok(marker)
    }

    #[instrument(skip(self, detected), fields(candidates = detected.len()))]
    pub fn extend_detected(&mut self, detected: Vec<Marker>) -> usize {
        let before = self.markers.len();
        let duration = self.duration;
        self.markers.extend(
            detected
                .into_iter()
                .filter(|marker| (0.0..=duration).contains(&marker.time)),
        );
        let added = self.markers.len() - before;
        self.resort();
        info!(added, total = self.markers.len(), "detected markers merged");
        added
    }

    #[instrument(skip(self, new_name, fallback))]
    pub fn rename(&mut self, id: Uuid, new_name: &str, fallback: &str) -> Result<(), MarkerError> {
        let marker = self
            .markers
            .iter_mut()
            .find(|marker| marker.id == id)
            .ok_or(MarkerError::NotFound(id))?;
        marker.name = resolve_name(new_name.to_string(), fallback);
        debug!(name = %marker.name, "marker renamed");
        self.revision += 1;
        Ok(())
    }

    /// Updates the time in place without reordering. Call [`Self::resort`]
    /// once the batch of moves is done.
    pub fn move_marker(&mut self, id: Uuid, new_time: f64) -> Result<f64, MarkerError> {
        let duration = self.duration;
        let marker = self
            .markers
            .iter_mut()
            .find(|marker| marker.id == id)
            .ok_or(MarkerError::NotFound(id))?;
        let bounded = if new_time.is_finite() {
            new_time.clamp(0.0, duration)
        } else {
            marker.time
        };
        marker.time = bounded;
        debug!(marker_id = %id, time = bounded, "marker moved");
        self.revision += 1;
        Ok(bounded)
    }

    pub fn resort(&mut self) {
        // `sort_by` is stable, so coinciding markers keep insertion order.
        self.markers
            .sort_by(|left, right| left.time.total_cmp(&right.time));
        self.revision += 1;
    }

    #[instrument(skip(self), fields(markers = self.markers.len()))]
    pub fn clear(&mut self) {
        self.markers.clear();
        self.revision += 1;
        info!("markers cleared");
    }

    pub fn markers_between(&self, start: f64, end: f64) -> impl Iterator<Item = &Marker> {
        self.markers
            .iter()
            .filter(move |marker| marker.time > start && marker.time <= end)
    }

    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.markers
            .windows(2)
            .all(|pair| pair[0].time <= pair[1].time)
    }

    #[must_use]
    pub fn export_text(&self) -> MarkerExport {
        let (timestamps, names) = self
            .markers
            .iter()
            .map(|marker| (format!("{:.3}", marker.time), marker.name.clone()))
            .unzip();
        MarkerExport { timestamps, names }
    }

    #[must_use]
    pub fn next_manual_name(&self) -> String {
        format!("{MANUAL_MARKER_PREFIX} {}", self.markers.len() + 1)
    }

    fn contains_time(&self, time: f64) -> bool {
        time.is_finite() && (0.0..=self.duration).contains(&time)
    }
}
