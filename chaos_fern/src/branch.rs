// Branch selection for the chaos game.
//
// Each generated note applies one of the four affine branches. The choice is
// not made on the fly: an `IndexSequence` is drawn once, up front, from a
// fixed distribution (10% / 10% / 20% / 60% for branches 0..4), and the
// generator replays it through a wrapping cursor. Keeping the draw separate
// means a generator can be reset and replayed without touching randomness,
// and tests can hand in an explicit sequence.
//
// Randomness comes in through the `UniformSource` trait so callers can inject
// a seeded `ChaosRng` or any other [0, 1) source.

use crate::affine::BRANCH_COUNT;
use crate::error::ConfigError;
use chaos_fern_prng::ChaosRng;

/// Cumulative upper bounds (inclusive) for branches 0, 1 and 2. Anything
/// above the last bound selects branch 3.
pub const BRANCH_THRESHOLDS: [f32; 3] = [0.10, 0.20, 0.40];

/// A source of uniform samples in [0, 1).
pub trait UniformSource {
    fn next_unit(&mut self) -> f32;
}

impl UniformSource for ChaosRng {
    fn next_unit(&mut self) -> f32 {
        self.next_f32()
    }
}

/// Map a uniform sample to a branch index.
pub fn branch_for_sample(r: f32) -> u8 {
    BRANCH_THRESHOLDS
        .iter()
        .position(|&bound| r <= bound)
        .map_or(3, |i| i as u8)
}

/// The cached branch pattern a generator replays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSequence {
    indices: Vec<u8>,
}

impl IndexSequence {
    /// Draw `len` branch indices from `source`.
    pub fn draw<S: UniformSource + ?Sized>(
        len: usize,
        source: &mut S,
    ) -> Result<Self, ConfigError> {
        if len == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        let indices: Vec<u8> = (0..len)
            .map(|_| branch_for_sample(source.next_unit()))
            .collect();
        tracing::debug!(len, "drew branch index sequence");
        Ok(IndexSequence { indices })
    }

    /// Wrap an explicit sequence, rejecting empty input and indices >= 4.
    pub fn from_indices(indices: Vec<u8>) -> Result<Self, ConfigError> {
        if indices.is_empty() {
            return Err(ConfigError::EmptyIndexSequence);
        }
        if let Some((position, &index)) = indices
            .iter()
            .enumerate()
            .find(|&(_, &k)| k as usize >= BRANCH_COUNT)
        {
            return Err(ConfigError::InvalidBranch { position, index });
        }
        Ok(IndexSequence { indices })
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Branch at `position`. The generator keeps `position < len()`.
    pub(crate) fn get(&self, position: usize) -> u8 {
        self.indices[position]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.indices
    }

    /// Occurrences of each branch, indexed by branch.
    pub fn histogram(&self) -> [usize; BRANCH_COUNT] {
        let mut counts = [0usize; BRANCH_COUNT];
        for &k in &self.indices {
            counts[k as usize] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed list of samples.
    struct Scripted(Vec<f32>, usize);

    impl UniformSource for Scripted {
        fn next_unit(&mut self) -> f32 {
            let v = self.0[self.1 % self.0.len()];
            self.1 += 1;
            v
        }
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(branch_for_sample(0.0), 0);
        assert_eq!(branch_for_sample(0.10), 0);
        assert_eq!(branch_for_sample(0.1001), 1);
        assert_eq!(branch_for_sample(0.20), 1);
        assert_eq!(branch_for_sample(0.30), 2);
        assert_eq!(branch_for_sample(0.40), 2);
        assert_eq!(branch_for_sample(0.41), 3);
        assert_eq!(branch_for_sample(0.999), 3);
    }

    #[test]
    fn draw_maps_each_sample() {
        let mut source = Scripted(vec![0.05, 0.15, 0.35, 0.9], 0);
        let seq = IndexSequence::draw(6, &mut source).unwrap();
        assert_eq!(seq.as_slice(), &[0, 1, 2, 3, 0, 1]);
    }

    #[test]
    fn draw_rejects_zero_length() {
        let mut rng = ChaosRng::new(1);
        assert_eq!(
            IndexSequence::draw(0, &mut rng),
            Err(ConfigError::ZeroIterations)
        );
    }

    #[test]
    fn explicit_indices_are_validated() {
        assert_eq!(
            IndexSequence::from_indices(vec![]),
            Err(ConfigError::EmptyIndexSequence)
        );
        assert_eq!(
            IndexSequence::from_indices(vec![0, 3, 4, 1]),
            Err(ConfigError::InvalidBranch {
                position: 2,
                index: 4
            })
        );
        let seq = IndexSequence::from_indices(vec![2, 2, 3]).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.get(2), 3);
    }

    #[test]
    fn branch_distribution_matches_weights() {
        let mut rng = ChaosRng::new(2024);
        let n = 100_000;
        let seq = IndexSequence::draw(n, &mut rng).unwrap();
        let counts = seq.histogram();
        let expected = [0.1, 0.1, 0.2, 0.6];
        for (k, (&count, &p)) in counts.iter().zip(expected.iter()).enumerate() {
            let freq = count as f64 / n as f64;
            assert!(
                (freq - p).abs() < 0.01,
                "branch {k}: expected ~{p}, got {freq:.4}"
            );
        }
        assert!(counts[3] > 2 * counts[0]);
        assert!(counts[3] > 2 * counts[1]);
    }
}
