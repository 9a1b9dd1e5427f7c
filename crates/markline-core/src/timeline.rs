use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    markers::MarkerStore,
    model::Marker,
    playback::{AudioOutput, ClockSource, PlaybackClock},
};

pub const DEFAULT_DRAG_TOLERANCE_PX: f64 = 5.0;
pub const DEFAULT_RENAME_TOLERANCE_PX: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelineView {
    pub left: f64,
    pub width: f64,
    pub duration: f64,
}

impl TimelineView {
    #[must_use]
    pub fn new(left: f64, width: f64, duration: f64) -> Self {
        Self {
            left,
            width,
            duration,
        }
    }

    fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.duration > 0.0)
    }

    #[must_use]
    pub fn time_at(&self, pointer_x: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        ((pointer_x - self.left) / self.width * self.duration).clamp(0.0, self.duration)
    }

    #[must_use]
    pub fn x_at(&self, time: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        time / self.duration * self.width
    }

    #[must_use]
    pub fn tolerance(&self, pixels: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        pixels / self.width * self.duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelineSettings {
    pub drag_tolerance_px: f64,
    pub rename_tolerance_px: f64,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            drag_tolerance_px: DEFAULT_DRAG_TOLERANCE_PX,
            rename_tolerance_px: DEFAULT_RENAME_TOLERANCE_PX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging { id: Uuid, origin_time: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PointerAction {
    Ignored,
    DragStarted(Uuid),
    DragMoved { id: Uuid, time: f64 },
    DragFinished(Uuid),
    Seeked(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Prompt {
    Create { default_name: String },
    Rename { id: Uuid, current_name: String },
}

impl Prompt {
    #[must_use]
    pub fn initial_text(&self) -> &str {
        match self {
            Self::Create { default_name } => default_name,
            Self::Rename { current_name, .. } => current_name,
        }
    }
}

/// Marker nearest to `pointer_x`, provided it lies strictly within
/// `tolerance_px` of the pointer. Ties resolve to the earlier marker.
#[must_use]
pub fn hit_test<'a>(
    store: &'a MarkerStore,
    view: &TimelineView,
    pointer_x: f64,
    tolerance_px: f64,
) -> Option<&'a Marker> {
    let pointer_time = view.time_at(pointer_x);
    let tolerance = view.tolerance(tolerance_px);
    store
        .markers()
        .iter()
        .map(|marker| (marker, (marker.time - pointer_time).abs()))
        .min_by(|left, right| left.1.total_cmp(&right.1))
        .filter(|(_, distance)| *distance < tolerance)
        .map(|(marker, _)| marker)
}

#[derive(Debug, Clone, Default)]
pub struct TimelineInteraction {
    settings: TimelineSettings,
    gesture: Gesture,
}

impl TimelineInteraction {
    #[must_use]
    pub fn new(settings: TimelineSettings) -> Self {
        Self {
            settings,
            gesture: Gesture::Idle,
        }
    }

    #[must_use]
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    #[must_use]
    pub fn settings(&self) -> TimelineSettings {
        self.settings
    }

    /// A press while still dragging (the release was lost) commits that drag
    /// before hit testing.
    #[instrument(skip(self, view, store, clock))]
    pub fn pointer_down<C: ClockSource, O: AudioOutput>(
        &mut self,
        pointer_x: f64,
        view: &TimelineView,
        store: &mut MarkerStore,
        clock: &mut PlaybackClock<C, O>,
    ) -> PointerAction {
        if let Gesture::Dragging { id, .. } = self.gesture {
            store.resort();
            self.gesture = Gesture::Idle;
            debug!(marker_id = %id, "unreleased drag committed");
        }

        if let Some(marker) = hit_test(store, view, pointer_x, self.settings.drag_tolerance_px) {
            self.gesture = Gesture::Dragging {
                id: marker.id,
                origin_time: marker.time,
            };
            debug!(marker_id = %marker.id, "drag started");
            return PointerAction::DragStarted(marker.id);
        }

        let time = view.time_at(pointer_x);
        clock.seek(time);
        PointerAction::Seeked(clock.position())
    }

    pub fn pointer_move(
        &mut self,
        pointer_x: f64,
        view: &TimelineView,
        store: &mut MarkerStore,
    ) -> PointerAction {
        let Gesture::Dragging { id, .. } = self.gesture else {
            return PointerAction::Ignored;
        };
        // `time_at` clamps, so dragging past either edge pins the marker there.
        match store.move_marker(id, view.time_at(pointer_x)) {
            Ok(time) => PointerAction::DragMoved { id, time },
            Err(error) => {
                debug!(%error, "dragged marker vanished, ending drag");
                self.gesture = Gesture::Idle;
                PointerAction::Ignored
            }
        }
    }

    pub fn pointer_up(&mut self, store: &mut MarkerStore) -> PointerAction {
        let action = match self.gesture {
            Gesture::Dragging { id, .. } => {
                store.resort();
                debug!(marker_id = %id, "drag finished");
                PointerAction::DragFinished(id)
            }
            Gesture::Idle => PointerAction::Ignored,
        };
        self.gesture = Gesture::Idle;
        action
    }

    pub fn cancel_drag(&mut self, store: &mut MarkerStore) -> bool {
        let Gesture::Dragging { id, origin_time } = self.gesture else {
            return false;
        };
        self.gesture = Gesture::Idle;
        if store.move_marker(id, origin_time).is_err() {
            return false;
        }
        store.resort();
        debug!(marker_id = %id, "drag cancelled");
        true
    }

    #[must_use]
    pub fn double_click(
        &self,
        pointer_x: f64,
        view: &TimelineView,
        store: &MarkerStore,
    ) -> Option<Prompt> {
        hit_test(store, view, pointer_x, self.settings.rename_tolerance_px).map(|marker| {
            Prompt::Rename {
                id: marker.id,
                current_name: marker.name.clone(),
            }
        })
    }

    pub fn reset(&mut self) {
        self.gesture = Gesture::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_maps_to_clamped_time() {
        let view = TimelineView::new(100.0, 500.0, 10.0);
        assert_eq!(view.time_at(100.0), 0.0);
        assert_eq!(view.time_at(350.0), 5.0);
        assert_eq!(view.time_at(50.0), 0.0);
        assert_eq!(view.time_at(900.0), 10.0);
        assert_eq!(view.x_at(5.0), 250.0);
        assert!((view.tolerance(5.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn degenerate_views_map_to_zero() {
        let view = TimelineView::new(0.0, 0.0, 10.0);
        assert_eq!(view.time_at(40.0), 0.0);
        assert_eq!(view.tolerance(8.0), 0.0);
        assert_eq!(TimelineView::new(0.0, 100.0, 0.0).x_at(3.0), 0.0);
    }

    #[test]
    fn nearest_marker_within_tolerance_wins() {
        let mut store = MarkerStore::new(10.0);
        store.add(2.00, "a").expect("in range");
        let near = store.add(2.06, "b").expect("in range");
        let view = TimelineView::new(0.0, 1_000.0, 10.0);

        let hit = hit_test(&store, &view, 206.0, 5.0).expect("pointer sits on b");
        assert_eq!(hit.id, near.id);
        assert!(hit_test(&store, &view, 260.0, 5.0).is_none());
    }
}
