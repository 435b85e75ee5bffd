// Chaos Fern
//
// Composes a monophonic melody by running the chaos game over an iterated
// function system (four affine maps), then writes it out as a Standard MIDI
// File. The x coordinate of each visited point becomes a pitch, the y
// coordinate a duration.
//
// Architecture:
// - affine.rs: Affine coefficient sets (fern default, Barnsley, explicit)
// - branch.rs: Weighted branch draw and the cached index sequence
// - mapping.rs: Integer linear maps from (x, y) to piano key and ticks
// - generator.rs: Chaos-game iteration, NaN recovery, replayable cursor
// - note.rs: `NoteEvent`, legal ranges, key-to-frequency table
// - midi.rs: SMF encoding via `midly`, decoding for verification, file write
// - config.rs: JSON-loadable run configuration
// - compose.rs: Config-to-bytes pipeline used by the CLI
// - error.rs: Typed errors (config, encoding, decoding, I/O)
//
// Randomness is used once, to draw the branch sequence, and comes from a
// seedable `chaos_fern_prng::ChaosRng`. Given a seed the output is
// reproducible byte for byte.

pub mod affine;
pub mod branch;
pub mod compose;
pub mod config;
pub mod error;
pub mod generator;
pub mod mapping;
pub mod midi;
pub mod note;

pub use error::{ConfigError, DecodeError, EncodingError, Error, Result};
