pub mod config;
pub mod decode;
pub mod detect;
pub mod diagnostics;
pub mod fixtures;
pub mod markers;
pub mod model;
pub mod playback;
pub mod session;
pub mod timeline;
pub mod waveform;

pub use config::{ConfigError, MarklineConfig};
pub use decode::{DecodeError, Decoder, SymphoniaDecoder, decode_file, scan_audio_files};
pub use detect::{AutoDetector, DETECTION_STRIDE, DetectionSettings, detect};
pub use diagnostics::{TelemetryGuard, init_from_config, init_tracing_with_options};
pub use markers::{MarkerError, MarkerExport, MarkerStore};
pub use model::{AudioSource, DEFAULT_MARKER_NAME, Marker};
pub use playback::{
    AudioOutput, ClockSource, ManualClock, MonotonicClock, NullOutput, PlaybackClock,
    PlaybackState, PlaybackTick,
};
pub use session::{MarkerLine, Overlay, Session, SessionError, SessionSettings};
pub use timeline::{
    Gesture, PointerAction, Prompt, TimelineInteraction, TimelineSettings, TimelineView, hit_test,
};
pub use waveform::{WaveformBar, WaveformColumn, WaveformImage};
