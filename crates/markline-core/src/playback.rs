use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::model::AudioSource;

pub trait ClockSource {
    fn now(&self) -> f64;
}

/// Starts and stops audible output of a buffer. Output engines cannot
/// reposition a running stream, so a new offset always means stop then start.
pub trait AudioOutput {
    fn start(&mut self, source: &AudioSource, offset_seconds: f64) -> anyhow::Result<()>;
    fn stop(&mut self);
}

#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl ClockSource for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    seconds_bits: Arc<AtomicU64>,
}

impl ManualClock {
    #[must_use]
    pub fn new(seconds: f64) -> Self {
        let clock = Self::default();
        clock.set(seconds);
        clock
    }

    pub fn set(&self, seconds: f64) {
        self.seconds_bits.store(seconds.to_bits(), Ordering::Relaxed);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.seconds_bits.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Default)]
pub struct NullOutput {
    running: bool,
    last_offset: Option<f64>,
}

impl NullOutput {
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn last_offset(&self) -> Option<f64> {
        self.last_offset
    }
}

impl AudioOutput for NullOutput {
    fn start(&mut self, _source: &AudioSource, offset_seconds: f64) -> anyhow::Result<()> {
        self.running = true;
        self.last_offset = Some(offset_seconds);
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "Stopped"),
            Self::Playing => write!(f, "Playing"),
            Self::Paused => write!(f, "Paused"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackTick {
    pub position: f64,
    pub completed: bool,
}

pub struct PlaybackClock<C: ClockSource, O: AudioOutput> {
    clock: C,
    output: O,
    source: Option<Arc<AudioSource>>,
    state: PlaybackState,
    pause_offset: f64,
    clock_anchor: f64,
}

impl<C: ClockSource, O: AudioOutput> PlaybackClock<C, O> {
    pub fn new(clock: C, output: O) -> Self {
        Self {
            clock,
            output,
            source: None,
            state: PlaybackState::Stopped,
            pause_offset: 0.0,
            clock_anchor: 0.0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn needs_refresh(&self) -> bool {
        self.is_playing()
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn duration(&self) -> f64 {
        self.source.as_deref().map_or(0.0, AudioSource::duration)
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn load(&mut self, source: Arc<AudioSource>) {
        self.stop();
        info!(duration = source.duration(), "playback buffer loaded");
        self.source = Some(source);
    }

    pub fn unload(&mut self) {
        self.stop();
        self.source = None;
    }

    pub fn play(&mut self) {
        if self.is_playing() {
            return;
        }
        let Some(source) = self.source.clone() else {
            debug!("play ignored, no buffer loaded");
            return;
        };
        self.start_output(&source);
    }

    pub fn pause(&mut self) {
        if !self.is_playing() {
            return;
        }
        self.pause_offset = (self.clock.now() - self.clock_anchor).clamp(0.0, self.duration());
        self.output.stop();
        self.state = PlaybackState::Paused;
        debug!(offset = self.pause_offset, "playback paused");
    }

    pub fn stop(&mut self) {
        self.output.stop();
        self.pause_offset = 0.0;
        self.state = PlaybackState::Stopped;
        debug!("playback stopped");
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn seek(&mut self, time: f64) {
        let Some(source) = self.source.clone() else {
            debug!("seek ignored, no buffer loaded");
            return;
        };
        let target = if time.is_finite() {
            time.clamp(0.0, source.duration())
        } else {
            0.0
        };
        self.pause_offset = target;
        if self.is_playing() {
            self.output.stop();
            self.state = PlaybackState::Paused;
            self.start_output(&source);
        }
        debug!(offset = target, "playback seek");
    }

    pub fn position(&self) -> f64 {
        if self.is_playing() {
            (self.clock.now() - self.clock_anchor).clamp(0.0, self.duration())
        } else {
            self.pause_offset
        }
    }

    pub fn tick(&mut self) -> PlaybackTick {
        if !self.is_playing() {
            return PlaybackTick {
                position: self.pause_offset,
                completed: false,
            };
        }

        let duration = self.duration();
        let elapsed = self.clock.now() - self.clock_anchor;
        if elapsed > duration {
            self.stop();
            info!(duration, "playback reached end");
            return PlaybackTick {
                position: duration,
                completed: true,
            };
        }

        PlaybackTick {
            position: elapsed.max(0.0),
            completed: false,
        }
    }

    pub fn current_position(&mut self) -> f64 {
        self.tick().position
    }

    fn start_output(&mut self, source: &AudioSource) {
        if let Err(error) = self.output.start(source, self.pause_offset) {
            warn!(?error, offset = self.pause_offset, "audio output failed to start");
            return;
        }
        self.clock_anchor = self.clock.now() - self.pause_offset;
        self.state = PlaybackState::Playing;
        debug!(offset = self.pause_offset, "playback started");
    }
}

impl<C: ClockSource + Default, O: AudioOutput + Default> Default for PlaybackClock<C, O> {
    fn default() -> Self {
        Self::new(C::default(), O::default())
    }
}
