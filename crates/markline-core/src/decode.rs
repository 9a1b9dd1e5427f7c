use std::{
    collections::BTreeSet,
    fs,
    io::{Cursor, ErrorKind},
    path::{Path, PathBuf},
};

use symphonia::core::{
    audio::{AudioBufferRef, SampleBuffer},
    codecs::DecoderOptions,
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::model::AudioSource;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported audio input: {0}")]
    Unsupported(String),
    #[error("malformed audio stream: {0}")]
    Malformed(String),
    #[error("no default audio track found")]
    NoTrack,
    #[error("decoded zero samples")]
    Empty,
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub trait Decoder {
    fn decode(&self, bytes: &[u8], hint: Option<&str>) -> Result<AudioSource, DecodeError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl Decoder for SymphoniaDecoder {
    #[instrument(skip(self, bytes), fields(bytes = bytes.len(), hint))]
    fn decode(&self, bytes: &[u8], hint: Option<&str>) -> Result<AudioSource, DecodeError> {
        let source =
            MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        let mut probe_hint = Hint::new();
        if let Some(extension) = hint {
            probe_hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &probe_hint,
                source,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|error| DecodeError::Unsupported(error.to_string()))?;
        let mut format = probed.format;
        let track = format.default_track().ok_or(DecodeError::NoTrack)?;
        let track_id = track.id;
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|error| DecodeError::Unsupported(error.to_string()))?;

        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(48_000);
        let mut channels: Vec<Vec<f32>> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(error)) if error.kind() == ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    return Err(DecodeError::Malformed(
                        "audio stream reset required".to_string(),
                    ));
                }
                Err(error) => return Err(DecodeError::Malformed(error.to_string())),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(reason)) => {
                    debug!(reason, "skipping undecodable packet");
                    continue;
                }
                Err(error) => return Err(DecodeError::Malformed(error.to_string())),
            };

            sample_rate = decoded.spec().rate;
            push_planar_samples(decoded, &mut channels);
        }

        if channels.first().is_none_or(Vec::is_empty) {
            return Err(DecodeError::Empty);
        }

        debug!(
            sample_rate,
            channels = channels.len(),
            frames = channels[0].len(),
            "audio decode complete"
        );
        Ok(AudioSource::new(sample_rate, channels))
    }
}

#[instrument(skip(decoder), fields(path = %path.display()))]
pub fn decode_file(decoder: &dyn Decoder, path: &Path) -> Result<AudioSource, DecodeError> {
    let bytes = fs::read(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decoder.decode(&bytes, path.extension().and_then(|value| value.to_str()))
}

#[instrument(fields(directory = %directory.display()))]
pub fn scan_audio_files(directory: &Path) -> Vec<PathBuf> {
    let extensions = supported_audio_extensions();
    let mut files = Vec::new();

    for entry in WalkDir::new(directory).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!(?error, "ignoring unreadable entry while scanning audio files");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let extension = entry
            .path()
            .extension()
            .and_then(|value| value.to_str())
            .map(str::to_ascii_lowercase);
        if extension.is_some_and(|extension| extensions.contains(extension.as_str())) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!(count = files.len(), "audio scan complete");
    files
}

fn push_planar_samples(decoded: AudioBufferRef<'_>, channels: &mut Vec<Vec<f32>>) {
    let spec = *decoded.spec();
    let channel_count = spec.channels.count().max(1);
    if channels.len() < channel_count {
        let frames = channels.first().map_or(0, Vec::len);
        channels.resize_with(channel_count, || vec![0.0; frames]);
    }

    let mut sample_buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
    sample_buffer.copy_interleaved_ref(decoded);
    for frame in sample_buffer.samples().chunks(channel_count) {
        for (channel, samples) in channels.iter_mut().enumerate() {
            samples.push(frame.get(channel).copied().unwrap_or(0.0));
        }
    }
}

fn supported_audio_extensions() -> BTreeSet<&'static str> {
    [
        "wav", "flac", "mp3", "ogg", "m4a", "aiff", "aif", "caf", "mkv",
    ]
    .into_iter()
    .collect()
}
