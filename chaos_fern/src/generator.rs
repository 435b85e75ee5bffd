// Chaos-game note generator.
//
// A `Generator` owns an affine map set, a cached branch index sequence, a
// wrapping cursor into that sequence, and the current chaos-game point. Each
// `step()` reads the next branch, applies its transform to the point, repairs
// NaN components, and turns the point into a `NoteEvent` via `mapping.rs`.
//
// After construction nothing here consumes randomness, so output is a pure
// function of (maps, index sequence, state). `generate()` always starts from
// the origin with the cursor at 0; `step()` and `reset()` are there for
// callers that want to drive the iteration one note at a time.
//
// Divergence: not every branch is contractive, so a point can run off to
// infinity and the next transform can produce `inf - inf = NaN`. A NaN x is
// replaced by 0.1 and a NaN y by 0.3. This is logged and counted, never
// returned as an error.
//
// The y component is stored as its magnitude after each step (the duration
// mapping only reads |y|, and the next step continues from that reflected
// point). x keeps its sign.

use crate::affine::AffineMapSet;
use crate::branch::{IndexSequence, UniformSource};
use crate::error::ConfigError;
use crate::mapping::{duration_from_y, pitch_from_x};
use crate::note::NoteEvent;

/// Replacement for a NaN x component.
pub const FALLBACK_X: f32 = 0.1;
/// Replacement for a NaN y component.
pub const FALLBACK_Y: f32 = 0.3;

/// The current chaos-game point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChaosState {
    pub x: f32,
    pub y: f32,
}

impl ChaosState {
    pub const ORIGIN: ChaosState = ChaosState { x: 0.0, y: 0.0 };
}

/// Counters accumulated since the last reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeneratorStats {
    pub steps: u64,
    pub nan_recoveries: u64,
}

#[derive(Debug, Clone)]
pub struct Generator {
    maps: AffineMapSet,
    indices: IndexSequence,
    cursor: usize,
    state: ChaosState,
    stats: GeneratorStats,
}

impl Generator {
    /// Build a generator that produces `iterations` notes per `generate()`,
    /// drawing its branch sequence from `source`.
    pub fn new<S: UniformSource + ?Sized>(
        iterations: usize,
        maps: AffineMapSet,
        source: &mut S,
    ) -> Result<Self, ConfigError> {
        let indices = IndexSequence::draw(iterations, source)?;
        Ok(Self::from_indices(maps, indices))
    }

    /// Build a generator around an existing branch sequence. The sequence
    /// length sets the number of notes per `generate()`.
    pub fn from_indices(maps: AffineMapSet, indices: IndexSequence) -> Self {
        Generator {
            maps,
            indices,
            cursor: 0,
            state: ChaosState::ORIGIN,
            stats: GeneratorStats::default(),
        }
    }

    pub fn iterations(&self) -> usize {
        self.indices.len()
    }

    pub fn maps(&self) -> &AffineMapSet {
        &self.maps
    }

    pub fn indices(&self) -> &IndexSequence {
        &self.indices
    }

    pub fn state(&self) -> ChaosState {
        self.state
    }

    pub fn stats(&self) -> GeneratorStats {
        self.stats
    }

    /// Return to the origin with the cursor at the start of the sequence.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.state = ChaosState::ORIGIN;
        self.stats = GeneratorStats::default();
    }

    /// Produce exactly `iterations()` notes, starting from a reset state.
    pub fn generate(&mut self) -> Vec<NoteEvent> {
        self.reset();
        let notes: Vec<NoteEvent> = (0..self.iterations()).map(|_| self.step()).collect();
        tracing::debug!(
            notes = notes.len(),
            nan_recoveries = self.stats.nan_recoveries,
            "generated note sequence"
        );
        notes
    }

    /// Advance the chaos game by one branch and emit the resulting note.
    pub fn step(&mut self) -> NoteEvent {
        let k = self.next_branch();
        let (mut x, mut y) = self.maps.apply(k, self.state.x, self.state.y);

        if x.is_nan() {
            self.stats.nan_recoveries += 1;
            tracing::debug!(step = self.stats.steps, branch = k, "x diverged to NaN");
            x = FALLBACK_X;
        }
        if y.is_nan() {
            self.stats.nan_recoveries += 1;
            tracing::debug!(step = self.stats.steps, branch = k, "y diverged to NaN");
            y = FALLBACK_Y;
        }

        let y = y.abs();
        self.state = ChaosState { x, y };
        self.stats.steps += 1;

        NoteEvent::new(pitch_from_x(x), duration_from_y(y))
    }

    /// Read the branch under the cursor, wrapping at the end of the sequence.
    fn next_branch(&mut self) -> usize {
        if self.cursor == self.indices.len() {
            self.cursor = 0;
        }
        let k = self.indices.get(self.cursor);
        self.cursor += 1;
        k as usize
    }
}
