// Typed failures for generation, encoding, decoding and persistence.
//
// Numeric instability (NaN mid-iteration) is deliberately absent: the
// generator repairs it in place and only logs it. Everything here reaches the
// caller. `Error` keeps "bad data" (`Config`, `Encoding`) apart from "bad
// storage" (`Io`, `ConfigFile`) so a failed write can be retried with the
// artifact that is already in memory.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid construction parameters. Nothing is produced when one of these is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("iterations must be positive")]
    ZeroIterations,
    #[error("index sequence must not be empty")]
    EmptyIndexSequence,
    #[error("branch index {index} at position {position} is out of range (0..4)")]
    InvalidBranch { position: usize, index: u8 },
    #[error("degenerate mapping domain: from_low == from_high == {bound}")]
    DegenerateDomain { bound: i64 },
    #[error("unknown coefficient preset '{0}'")]
    UnknownPreset(String),
    #[error("tempo {bpm} BPM is outside the encodable range {min}..={max}")]
    TempoOutOfRange { bpm: u16, min: u16, max: u16 },
    #[error("ticks per quarter {0} must be in 1..=32767")]
    InvalidTicksPerQuarter(u16),
    #[error("velocity {0} exceeds 127")]
    InvalidVelocity(u8),
    #[error("channel {0} exceeds 15")]
    InvalidChannel(u8),
}

/// A note that cannot be written, or a serialization failure. No partial
/// artifact accompanies this error.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("note {index}: pitch key {pitch} outside {min}..={max}")]
    PitchOutOfRange { index: usize, pitch: u8, min: u8, max: u8 },
    #[error("note {index}: duration {duration} ticks outside {min}..={max}")]
    DurationOutOfRange {
        index: usize,
        duration: u32,
        min: u32,
        max: u32,
    },
    #[error("failed to serialize MIDI data: {0}")]
    Serialize(#[source] std::io::Error),
}

/// Failures while reading back an encoded artifact.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed MIDI data: {0}")]
    Parse(#[from] midly::Error),
    #[error("expected metrical timing, found timecode")]
    UnsupportedTiming,
    #[error("expected exactly one track, found {0}")]
    TrackCount(usize),
    #[error("note-off for key {key} at tick {tick} has no matching note-on")]
    UnmatchedNoteOff { key: u8, tick: u64 },
    #[error("note-on for key {key} at tick {tick} was never released")]
    DanglingNoteOn { key: u8, tick: u64 },
}

/// Crate-level error for the compose pipeline and the CLI.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("failed to read config {}: {source}", .path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
