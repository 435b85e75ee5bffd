// End-to-end composition: config in, encoded MIDI bytes out.
//
// `compose` validates the config, seeds the branch draw, runs the generator
// once and encodes the result. Without a configured seed, one is drawn from
// the OS and reported back so the piece can be regenerated. Writing to disk
// is left to `Composition::write` so that an I/O failure never costs the
// generated material.

use crate::config::ComposerConfig;
use crate::error::Result;
use crate::generator::{Generator, GeneratorStats};
use crate::midi::{Encoder, EncoderSettings, write_midi_file};
use crate::note::NoteEvent;
use chaos_fern_prng::ChaosRng;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::path::Path;

/// A finished piece, ready to be written.
#[derive(Debug, Clone)]
pub struct Composition {
    /// Seed the branch sequence was drawn with (generated if not configured).
    pub seed: u64,
    pub notes: Vec<NoteEvent>,
    pub stats: GeneratorStats,
    pub settings: EncoderSettings,
    pub bytes: Vec<u8>,
}

impl Composition {
    /// Length of the piece in ticks.
    pub fn total_ticks(&self) -> u64 {
        self.notes.iter().map(|n| u64::from(n.duration_ticks)).sum()
    }

    /// Length of the piece in seconds at the encoded tempo.
    pub fn duration_seconds(&self) -> f64 {
        let quarters = self.total_ticks() as f64 / f64::from(self.settings.ticks_per_quarter);
        quarters * f64::from(self.settings.micros_per_quarter()) / 1_000_000.0
    }

    /// Persist the encoded bytes. Safe to call again after a failure.
    pub fn write(&self, path: &Path) -> Result<()> {
        write_midi_file(path, &self.bytes)
    }
}

/// A fresh seed from the operating system's entropy source.
pub fn entropy_seed() -> u64 {
    StdRng::from_os_rng().next_u64()
}

pub fn compose(config: &ComposerConfig) -> Result<Composition> {
    config.validate()?;
    let maps = config.preset.resolve()?;
    let encoder = Encoder::new(config.encoder)?;

    let seed = config.seed.unwrap_or_else(entropy_seed);
    let mut rng = ChaosRng::new(seed);
    tracing::debug!(
        seed,
        iterations = config.iterations,
        preset = config.preset.label(),
        "composing"
    );

    let mut generator = Generator::new(config.iterations, maps, &mut rng)?;
    let notes = generator.generate();
    let bytes = encoder.encode(&notes)?;

    Ok(Composition {
        seed,
        notes,
        stats: generator.stats(),
        settings: config.encoder,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PresetSpec;
    use crate::error::{ConfigError, Error};

    fn seeded(seed: u64, iterations: usize) -> ComposerConfig {
        ComposerConfig {
            iterations,
            seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn seeded_compositions_repeat() {
        let a = compose(&seeded(17, 150)).unwrap();
        let b = compose(&seeded(17, 150)).unwrap();
        assert_eq!(a.notes, b.notes);
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(a.seed, 17);
    }

    #[test]
    fn produces_requested_note_count() {
        let piece = compose(&seeded(1, 200)).unwrap();
        assert_eq!(piece.notes.len(), 200);
        assert_eq!(piece.stats.steps, 200);
        assert!(piece.notes.iter().all(NoteEvent::is_in_range));
    }

    #[test]
    fn duration_follows_tempo() {
        let piece = compose(&seeded(4, 10)).unwrap();
        // 960 ticks per quarter at 0.5 s per quarter.
        let expected = piece.total_ticks() as f64 / 960.0 * 0.5;
        assert!((piece.duration_seconds() - expected).abs() < 1e-9);
    }

    #[test]
    fn invalid_config_produces_nothing() {
        let config = ComposerConfig {
            preset: PresetSpec::Named("nope".to_string()),
            ..seeded(1, 10)
        };
        assert!(matches!(
            compose(&config),
            Err(Error::Config(ConfigError::UnknownPreset(_)))
        ));
    }

    #[test]
    fn entropy_seeds_differ() {
        assert_ne!(entropy_seed(), entropy_seed());
    }

    #[test]
    fn unseeded_reports_its_seed() {
        let config = ComposerConfig {
            iterations: 40,
            ..Default::default()
        };
        let piece = compose(&config).unwrap();
        let replay = compose(&seeded(piece.seed, 40)).unwrap();
        assert_eq!(piece.notes, replay.notes);
    }
}
