use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::MarklineConfig,
    decode::{DecodeError, Decoder},
    detect::{AutoDetector, DetectionSettings},
    markers::{MarkerError, MarkerStore},
    model::{AudioSource, DEFAULT_MARKER_NAME, Marker},
    playback::{
        AudioOutput, ClockSource, MonotonicClock, NullOutput, PlaybackClock, PlaybackTick,
    },
    timeline::{PointerAction, Prompt, TimelineInteraction, TimelineSettings, TimelineView},
    waveform::{WaveformImage, render_source},
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no audio buffer loaded")]
    NoBufferLoaded,
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Marker(#[from] MarkerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionSettings {
    pub detection: DetectionSettings,
    pub timeline: TimelineSettings,
    pub waveform_width: usize,
    pub waveform_height: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            detection: DetectionSettings::default(),
            timeline: TimelineSettings::default(),
            waveform_width: 1_000,
            waveform_height: 150,
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &MarklineConfig) -> Result<Self, crate::config::ConfigError> {
        Ok(Self {
            detection: config.detection.settings()?,
            timeline: TimelineSettings {
                drag_tolerance_px: config.timeline.drag_tolerance_px,
                rename_tolerance_px: config.timeline.rename_tolerance_px,
            },
            waveform_width: config.waveform.width,
            waveform_height: config.waveform.height,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerLine {
    pub x: f64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub playhead_x: f64,
    pub lines: Vec<MarkerLine>,
}

struct LoadedAudio {
    source: Arc<AudioSource>,
    waveform: WaveformImage,
}

pub struct Session<C: ClockSource = MonotonicClock, O: AudioOutput = NullOutput> {
    settings: SessionSettings,
    audio: Option<LoadedAudio>,
    markers: MarkerStore,
    clock: PlaybackClock<C, O>,
    timeline: TimelineInteraction,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(
            SessionSettings::default(),
            MonotonicClock::default(),
            NullOutput::default(),
        )
    }
}

impl<C: ClockSource, O: AudioOutput> Session<C, O> {
    pub fn new(settings: SessionSettings, clock: C, output: O) -> Self {
        Self {
            settings,
            audio: None,
            markers: MarkerStore::new(0.0),
            clock: PlaybackClock::new(clock, output),
            timeline: TimelineInteraction::new(settings.timeline),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn set_detection(&mut self, detection: DetectionSettings) {
        self.settings.detection = detection;
    }

    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    pub fn clock(&self) -> &PlaybackClock<C, O> {
        &self.clock
    }

    pub fn timeline(&self) -> &TimelineInteraction {
        &self.timeline
    }

    pub fn source(&self) -> Option<&Arc<AudioSource>> {
        self.audio.as_ref().map(|audio| &audio.source)
    }

    pub fn waveform(&self) -> Option<&WaveformImage> {
        self.audio.as_ref().map(|audio| &audio.waveform)
    }

    pub fn duration(&self) -> f64 {
        self.source().map_or(0.0, |source| source.duration())
    }

    pub fn controls_enabled(&self) -> bool {
        self.audio.is_some()
    }

    /// Decodes and adopts a new file. On failure the current buffer, markers
    /// and playback position are left as they were.
    #[instrument(skip(self, decoder, bytes), fields(bytes = bytes.len(), hint))]
    pub fn import_bytes(
        &mut self,
        decoder: &dyn Decoder,
        bytes: &[u8],
        hint: Option<&str>,
    ) -> Result<Arc<AudioSource>, SessionError> {
        let source = decoder.decode(bytes, hint).map_err(|error| {
            warn!(%error, "import failed, keeping previous state");
            SessionError::from(error)
        })?;
        Ok(self.import_source(source))
    }

    #[instrument(
        skip(self, source),
        fields(sample_rate = source.sample_rate(), duration = source.duration())
    )]
    pub fn import_source(&mut self, source: AudioSource) -> Arc<AudioSource> {
        let waveform = render_source(
            &source,
            self.settings.waveform_width,
            self.settings.waveform_height,
        );
        let source = Arc::new(source);
        self.timeline.reset();
        self.clock.load(Arc::clone(&source));
        self.markers.set_duration(source.duration());
        self.audio = Some(LoadedAudio {
            source: Arc::clone(&source),
            waveform,
        });
        info!(markers = self.markers.len(), "audio imported");
        source
    }

    pub fn play(&mut self) {
        self.clock.play();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn stop(&mut self) {
        self.clock.stop();
    }

    pub fn toggle_playback(&mut self) {
        self.clock.toggle();
    }

    pub fn seek(&mut self, time: f64) {
        self.clock.seek(time);
    }

    pub fn tick(&mut self) -> PlaybackTick {
        self.clock.tick()
    }

    pub fn add_marker(&mut self, time: f64, name: &str) -> Result<Marker, SessionError> {
        self.require_audio()?;
        Ok(self.markers.add(time, name)?)
    }

    #[instrument(skip(self), fields(threshold = self.settings.detection.threshold()))]
    pub fn auto_place_markers(&mut self) -> Result<usize, SessionError> {
        let source = Arc::clone(self.require_audio()?);
        let detected =
            AutoDetector::new(self.settings.detection).detect_source(&source, self.markers.len());
        Ok(self.markers.extend_detected(detected))
    }

    pub fn clear_markers(&mut self) {
        self.markers.clear();
    }

    pub fn pointer_down(
        &mut self,
        pointer_x: f64,
        left: f64,
        width: f64,
    ) -> Result<PointerAction, SessionError> {
        let view = self.view(left, width)?;
        Ok(self
            .timeline
            .pointer_down(pointer_x, &view, &mut self.markers, &mut self.clock))
    }

    pub fn pointer_move(
        &mut self,
        pointer_x: f64,
        left: f64,
        width: f64,
    ) -> Result<PointerAction, SessionError> {
        let view = self.view(left, width)?;
        Ok(self.timeline.pointer_move(pointer_x, &view, &mut self.markers))
    }

    pub fn pointer_up(&mut self) -> PointerAction {
        self.timeline.pointer_up(&mut self.markers)
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.timeline.cancel_drag(&mut self.markers)
    }

    pub fn double_click(
        &self,
        pointer_x: f64,
        left: f64,
        width: f64,
    ) -> Result<Option<Prompt>, SessionError> {
        let view = self.view(left, width)?;
        Ok(self.timeline.double_click(pointer_x, &view, &self.markers))
    }

    pub fn request_new_marker(&self) -> Result<Prompt, SessionError> {
        self.require_audio()?;
        Ok(Prompt::Create {
            default_name: self.markers.next_manual_name(),
        })
    }

    /// Applies a confirmed prompt. New markers are stamped at the current
    /// playback position, not at a pointer location.
    #[instrument(skip(self, prompt, input))]
    pub fn confirm_prompt(&mut self, prompt: &Prompt, input: &str) -> Result<(), SessionError> {
        self.require_audio()?;
        match prompt {
            Prompt::Create { .. } => {
                let time = self.clock.current_position();
                self.markers.add(time, input)?;
            }
            Prompt::Rename { id, .. } => {
                self.markers.rename(*id, input, DEFAULT_MARKER_NAME)?;
            }
        }
        Ok(())
    }

    pub fn cancel_prompt(&self, prompt: &Prompt) {
        debug!(?prompt, "prompt cancelled");
    }

    pub fn text_blocks(&self) -> (String, String) {
        let export = self.markers.export_text();
        (export.timestamps_block(), export.names_block())
    }

    pub fn overlay(&self, width: f64) -> Overlay {
        let view = TimelineView::new(0.0, width, self.duration());
        Overlay {
            playhead_x: view.x_at(self.clock.position()),
            lines: self
                .markers
                .markers()
                .iter()
                .map(|marker| MarkerLine {
                    x: view.x_at(marker.time),
                    name: marker.name.clone(),
                })
                .collect(),
        }
    }

    fn require_audio(&self) -> Result<&Arc<AudioSource>, SessionError> {
        self.source().ok_or(SessionError::NoBufferLoaded)
    }

    fn view(&self, left: f64, width: f64) -> Result<TimelineView, SessionError> {
        let duration = self.require_audio()?.duration();
        Ok(TimelineView::new(left, width, duration))
    }
}
