// Affine coefficient sets for the chaos game.
//
// An `AffineMapSet` holds four affine transforms as six parallel coefficient
// arrays. Branch `k` maps `(x, y)` to
// `(a[k]x + b[k]y + e[k], c[k]x + d[k]y + f[k])`. The generator picks a
// branch per step from its index sequence (see `branch.rs`) and feeds the
// resulting point into pitch/duration mapping (see `mapping.rs`).
//
// Not every branch is contractive, so repeated application can diverge to
// infinity and then to NaN. Recovery lives in the generator, not here.
//
// Named presets cover the built-in sets; explicit sets can be supplied
// through the JSON config, which is why the struct is serde-friendly.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Number of branches in every map set.
pub const BRANCH_COUNT: usize = 4;

/// Four affine transforms stored column-wise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffineMapSet {
    pub a: [f32; BRANCH_COUNT],
    pub b: [f32; BRANCH_COUNT],
    pub c: [f32; BRANCH_COUNT],
    pub d: [f32; BRANCH_COUNT],
    pub e: [f32; BRANCH_COUNT],
    pub f: [f32; BRANCH_COUNT],
}

impl AffineMapSet {
    /// Names accepted by `by_name`.
    pub const PRESET_NAMES: [&'static str; 2] = ["fern", "barnsley"];

    /// The default fern-like set.
    ///
    /// The `e` offsets are non-zero; with the textbook zeros, x collapses
    /// towards zero and the melody sits on the lowest key.
    pub fn fern() -> Self {
        AffineMapSet {
            a: [0.0, 0.85, 0.2, -0.15],
            b: [0.0, 0.04, -0.26, 0.28],
            c: [0.0, -0.04, 0.23, 0.26],
            d: [0.16, 0.85, 0.22, 0.44],
            e: [0.1, 0.2, 0.05, 0.3],
            f: [0.0, 1.6, 1.6, 0.44],
        }
    }

    /// The textbook Barnsley fern (stem, successive leaflets, left, right).
    pub fn barnsley() -> Self {
        AffineMapSet {
            a: [0.0, 0.85, 0.2, -0.15],
            b: [0.0, 0.04, -0.26, 0.28],
            c: [0.0, -0.04, 0.23, 0.26],
            d: [0.16, 0.85, 0.22, 0.24],
            e: [0.0, 0.0, 0.0, 0.0],
            f: [0.0, 1.6, 1.6, 0.44],
        }
    }

    /// Look up a built-in preset by (case-insensitive) name.
    pub fn by_name(name: &str) -> Result<Self, ConfigError> {
        match name.to_lowercase().as_str() {
            "fern" => Ok(Self::fern()),
            "barnsley" => Ok(Self::barnsley()),
            _ => Err(ConfigError::UnknownPreset(name.to_string())),
        }
    }

    /// Apply branch `k` to `(x, y)`.
    ///
    /// Panics if `k >= BRANCH_COUNT`; index sequences are validated on
    /// construction so the generator never passes an out-of-range branch.
    pub fn apply(&self, k: usize, x: f32, y: f32) -> (f32, f32) {
        let next_x = self.a[k] * x + self.b[k] * y + self.e[k];
        let next_y = self.c[k] * x + self.d[k] * y + self.f[k];
        (next_x, next_y)
    }
}

impl Default for AffineMapSet {
    fn default() -> Self {
        Self::fern()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_fern() {
        assert_eq!(AffineMapSet::default(), AffineMapSet::fern());
    }

    #[test]
    fn apply_from_origin_yields_offsets() {
        let maps = AffineMapSet::fern();
        for k in 0..BRANCH_COUNT {
            assert_eq!(maps.apply(k, 0.0, 0.0), (maps.e[k], maps.f[k]));
        }
    }

    #[test]
    fn apply_uses_all_coefficients() {
        let maps = AffineMapSet {
            a: [1.0; 4],
            b: [2.0; 4],
            c: [3.0; 4],
            d: [4.0; 4],
            e: [5.0; 4],
            f: [6.0; 4],
        };
        // (1*1 + 2*1 + 5, 3*1 + 4*1 + 6)
        assert_eq!(maps.apply(2, 1.0, 1.0), (8.0, 13.0));
    }

    #[test]
    fn preset_lookup() {
        for name in AffineMapSet::PRESET_NAMES {
            assert!(AffineMapSet::by_name(name).is_ok(), "{name} should resolve");
        }
        assert_eq!(AffineMapSet::by_name("FERN"), Ok(AffineMapSet::fern()));
        assert_eq!(
            AffineMapSet::by_name("sierpinski"),
            Err(ConfigError::UnknownPreset("sierpinski".to_string()))
        );
    }

    #[test]
    fn explicit_set_from_json() {
        let json = r#"{
            "a": [0.0, 0.5, 0.5, 0.5],
            "b": [0.0, 0.0, 0.0, 0.0],
            "c": [0.0, 0.0, 0.0, 0.0],
            "d": [0.5, 0.5, 0.5, 0.5],
            "e": [0.0, 0.5, 0.0, 0.25],
            "f": [0.0, 0.0, 0.5, 0.5]
        }"#;
        let maps: AffineMapSet = serde_json::from_str(json).unwrap();
        assert_eq!(maps.apply(1, 1.0, 1.0), (1.0, 0.5));
    }
}
