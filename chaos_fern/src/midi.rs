// MIDI output from generated note sequences.
//
// Converts an ordered `NoteEvent` slice into a Standard MIDI File: format 1
// (multi-track capable, one track used), metrical timing at the configured
// PPQ (960 by default). The track opens with a tempo meta event at tick 0
// (500 000 us per quarter at 120 BPM), then one note-on/note-off pair per
// note, back to back: note i ends exactly where note i+1 starts. An
// End-of-Track meta event closes the track at the final tick.
//
// Encoding is split in two so the timing can be inspected without parsing
// bytes: `Encoder::build_track` produces absolute-tick `TimedEvent`s, and
// `Encoder::encode` turns those into delta-timed `midly` events and bytes.
// Persistence (`write_midi_file`) is a separate step; a failed write leaves
// the encoded bytes with the caller for a retry.
//
// `decode` reads a file back into (pitch, tick, duration) triples. It exists
// to check that what we wrote is what a conformant reader sees.
//
// Uses the `midly` crate for MIDI reading and writing.

use crate::error::{ConfigError, DecodeError, EncodingError, Error, Result};
use crate::note::{
    DURATION_MAX, DURATION_MIN, DURATION_RANGE, NoteEvent, PITCH_MAX, PITCH_MIN, PITCH_RANGE,
};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Slowest tempo whose microseconds-per-quarter still fits in 24 bits.
pub const MIN_TEMPO_BPM: u16 = 4;
pub const MAX_TEMPO_BPM: u16 = 1000;

const MICROS_PER_MINUTE: u32 = 60_000_000;

/// Fixed properties of the output track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub tempo_bpm: u16,
    pub ticks_per_quarter: u16,
    pub velocity: u8,
    pub channel: u8,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        EncoderSettings {
            tempo_bpm: 120,
            ticks_per_quarter: 960,
            velocity: 64,
            channel: 0,
        }
    }
}

impl EncoderSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TEMPO_BPM..=MAX_TEMPO_BPM).contains(&self.tempo_bpm) {
            return Err(ConfigError::TempoOutOfRange {
                bpm: self.tempo_bpm,
                min: MIN_TEMPO_BPM,
                max: MAX_TEMPO_BPM,
            });
        }
        if self.ticks_per_quarter == 0 || self.ticks_per_quarter > 0x7FFF {
            return Err(ConfigError::InvalidTicksPerQuarter(self.ticks_per_quarter));
        }
        if self.velocity > 127 {
            return Err(ConfigError::InvalidVelocity(self.velocity));
        }
        if self.channel > 15 {
            return Err(ConfigError::InvalidChannel(self.channel));
        }
        Ok(())
    }

    pub fn micros_per_quarter(&self) -> u32 {
        MICROS_PER_MINUTE / u32::from(self.tempo_bpm)
    }
}

/// Message carried by a `TimedEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackMessage {
    Tempo { micros_per_quarter: u32 },
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8 },
}

/// A track event at an absolute tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub tick: u64,
    pub message: TrackMessage,
}

/// Serializes note sequences with a fixed, pre-validated set of settings.
#[derive(Debug, Clone)]
pub struct Encoder {
    settings: EncoderSettings,
}

impl Encoder {
    pub fn new(settings: EncoderSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Encoder { settings })
    }

    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    /// Lay the notes out on an absolute tick timeline.
    ///
    /// Every note is range-checked before anything is built, so an error
    /// never comes with a partial track.
    pub fn build_track(&self, notes: &[NoteEvent]) -> Result<Vec<TimedEvent>, EncodingError> {
        for (index, note) in notes.iter().enumerate() {
            check_note(index, note)?;
        }

        let EncoderSettings {
            channel, velocity, ..
        } = self.settings;
        let mut track = Vec::with_capacity(1 + notes.len() * 2);
        track.push(TimedEvent {
            tick: 0,
            message: TrackMessage::Tempo {
                micros_per_quarter: self.settings.micros_per_quarter(),
            },
        });

        let mut cursor: u64 = 0;
        for note in notes {
            let key = note.pitch_key;
            track.push(TimedEvent {
                tick: cursor,
                message: TrackMessage::NoteOn {
                    channel,
                    key,
                    velocity,
                },
            });
            cursor += u64::from(note.duration_ticks);
            track.push(TimedEvent {
                tick: cursor,
                message: TrackMessage::NoteOff { channel, key },
            });
        }

        Ok(track)
    }

    /// Encode the notes as SMF bytes.
    pub fn encode(&self, notes: &[NoteEvent]) -> Result<Vec<u8>, EncodingError> {
        let track = self.build_track(notes)?;
        let smf = self.track_to_smf(&track);
        let mut buf = Vec::new();
        smf.write_std(&mut buf).map_err(EncodingError::Serialize)?;
        Ok(buf)
    }

    /// Convert an absolute-tick track into a one-track `Smf`.
    fn track_to_smf(&self, events: &[TimedEvent]) -> Smf<'static> {
        let mut smf = Smf::new(Header::new(
            Format::Parallel,
            Timing::Metrical(u15::new(self.settings.ticks_per_quarter)),
        ));

        let mut track: Track<'static> = Vec::with_capacity(events.len() + 1);
        let mut last_tick: u64 = 0;
        for event in events {
            // Deltas are bounded by the longest note, well inside 28 bits.
            let delta = (event.tick - last_tick) as u32;
            last_tick = event.tick;
            let kind = match event.message {
                TrackMessage::Tempo { micros_per_quarter } => {
                    TrackEventKind::Meta(MetaMessage::Tempo(u24::new(micros_per_quarter)))
                }
                TrackMessage::NoteOn {
                    channel,
                    key,
                    velocity,
                } => TrackEventKind::Midi {
                    channel: u4::new(channel),
                    message: MidiMessage::NoteOn {
                        key: u7::new(key),
                        vel: u7::new(velocity),
                    },
                },
                TrackMessage::NoteOff { channel, key } => TrackEventKind::Midi {
                    channel: u4::new(channel),
                    message: MidiMessage::NoteOff {
                        key: u7::new(key),
                        vel: u7::new(0),
                    },
                },
            };
            track.push(TrackEvent {
                delta: u28::new(delta),
                kind,
            });
        }

        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
        smf.tracks.push(track);

        smf
    }
}

fn check_note(index: usize, note: &NoteEvent) -> Result<(), EncodingError> {
    if !PITCH_RANGE.contains(&note.pitch_key) {
        return Err(EncodingError::PitchOutOfRange {
            index,
            pitch: note.pitch_key,
            min: PITCH_MIN,
            max: PITCH_MAX,
        });
    }
    if !DURATION_RANGE.contains(&note.duration_ticks) {
        return Err(EncodingError::DurationOutOfRange {
            index,
            duration: note.duration_ticks,
            min: DURATION_MIN,
            max: DURATION_MAX,
        });
    }
    Ok(())
}

/// Write encoded bytes to `path`.
///
/// The file handle is closed on every return path. The caller keeps `bytes`,
/// so a failed write can simply be retried.
pub fn write_midi_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote MIDI file");
    Ok(())
}

/// A note recovered from an encoded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedNote {
    pub pitch_key: u8,
    pub on_tick: u64,
    pub duration_ticks: u64,
}

/// Contents of a decoded single-track file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSong {
    pub format: Format,
    pub ticks_per_quarter: u16,
    pub micros_per_quarter: Option<u32>,
    pub notes: Vec<DecodedNote>,
}

/// Parse SMF bytes back into notes ordered by start tick.
///
/// A note-on with velocity 0 counts as a note-off, per the MIDI convention.
pub fn decode(bytes: &[u8]) -> Result<DecodedSong, DecodeError> {
    let smf = Smf::parse(bytes)?;
    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(ppq) => ppq.as_int(),
        Timing::Timecode(..) => return Err(DecodeError::UnsupportedTiming),
    };
    if smf.tracks.len() != 1 {
        return Err(DecodeError::TrackCount(smf.tracks.len()));
    }

    let mut micros_per_quarter = None;
    let mut open: BTreeMap<u8, u64> = BTreeMap::new();
    let mut notes = Vec::new();
    let mut tick: u64 = 0;

    for event in &smf.tracks[0] {
        tick += u64::from(event.delta.as_int());
        match event.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) if micros_per_quarter.is_none() => {
                micros_per_quarter = Some(t.as_int());
            }
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, vel },
                ..
            } if vel.as_int() > 0 => {
                open.insert(key.as_int(), tick);
            }
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. },
                ..
            } => {
                let key = key.as_int();
                let on_tick = open
                    .remove(&key)
                    .ok_or(DecodeError::UnmatchedNoteOff { key, tick })?;
                notes.push(DecodedNote {
                    pitch_key: key,
                    on_tick,
                    duration_ticks: tick - on_tick,
                });
            }
            _ => {}
        }
    }

    if let Some((&key, &tick)) = open.iter().next() {
        return Err(DecodeError::DanglingNoteOn { key, tick });
    }

    notes.sort_by_key(|n| n.on_tick);
    Ok(DecodedSong {
        format: smf.header.format,
        ticks_per_quarter,
        micros_per_quarter,
        notes,
    })
}
