// Run configuration for a composition.
//
// Everything that used to be a literal in the generate/encode path lives in
// `ComposerConfig`: note count, coefficient preset, output path, seed and
// encoder settings. It loads from JSON; every field has a default, so an
// empty object `{}` is a valid config. The CLI applies its flags on top of a
// loaded (or default) config.
//
// The preset is either a built-in name (`"fern"`, `"barnsley"`) or an
// explicit coefficient object with the six `a`..`f` arrays.

use crate::affine::AffineMapSet;
use crate::error::{ConfigError, Error, Result};
use crate::midi::EncoderSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ITERATIONS: usize = 200;
pub const DEFAULT_OUTPUT_PATH: &str = "sample.mid";

/// Coefficient preset: a built-in name or explicit coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PresetSpec {
    Named(String),
    Explicit(AffineMapSet),
}

impl Default for PresetSpec {
    fn default() -> Self {
        PresetSpec::Named("fern".to_string())
    }
}

impl PresetSpec {
    pub fn resolve(&self) -> Result<AffineMapSet, ConfigError> {
        match self {
            PresetSpec::Named(name) => AffineMapSet::by_name(name),
            PresetSpec::Explicit(maps) => Ok(maps.clone()),
        }
    }

    /// Short label for logs and the CLI summary.
    pub fn label(&self) -> &str {
        match self {
            PresetSpec::Named(name) => name,
            PresetSpec::Explicit(_) => "explicit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Number of notes to generate.
    pub iterations: usize,
    pub preset: PresetSpec,
    pub output_path: PathBuf,
    /// Seed for the branch draw. `None` seeds from entropy.
    pub seed: Option<u64>,
    pub encoder: EncoderSettings,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        ComposerConfig {
            iterations: DEFAULT_ITERATIONS,
            preset: PresetSpec::default(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            seed: None,
            encoder: EncoderSettings::default(),
        }
    }
}

impl ComposerConfig {
    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let file_err = |source: Box<dyn std::error::Error + Send + Sync>| Error::ConfigFile {
            path: path.to_path_buf(),
            source,
        };
        let data = std::fs::read_to_string(path).map_err(|e| file_err(e.into()))?;
        serde_json::from_str(&data).map_err(|e| file_err(e.into()))
    }

    /// Check every field without generating anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        self.preset.resolve()?;
        self.encoder.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_is_default() {
        let config: ComposerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ComposerConfig::default());
        assert_eq!(config.iterations, 200);
        assert_eq!(config.encoder.tempo_bpm, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn named_and_explicit_presets() {
        let config: ComposerConfig =
            serde_json::from_str(r#"{"preset": "barnsley", "iterations": 12}"#).unwrap();
        assert_eq!(config.preset.resolve(), Ok(AffineMapSet::barnsley()));
        assert_eq!(config.iterations, 12);

        let explicit = serde_json::json!({
            "preset": serde_json::to_value(AffineMapSet::fern()).unwrap(),
            "encoder": { "tempo_bpm": 90 }
        });
        let config: ComposerConfig = serde_json::from_value(explicit).unwrap();
        assert_eq!(config.preset.label(), "explicit");
        assert_eq!(config.preset.resolve(), Ok(AffineMapSet::fern()));
        assert_eq!(config.encoder.tempo_bpm, 90);
        assert_eq!(config.encoder.ticks_per_quarter, 960);
    }

    #[test]
    fn validation_errors() {
        let config = ComposerConfig {
            iterations: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroIterations));

        let config = ComposerConfig {
            preset: PresetSpec::Named("julia".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownPreset("julia".to_string()))
        );
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"iterations": 64, "seed": 9, "output_path": "out.mid"}}"#).unwrap();
        let config = ComposerConfig::load(file.path()).unwrap();
        assert_eq!(config.iterations, 64);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.output_path, PathBuf::from("out.mid"));
    }

    #[test]
    fn load_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = ComposerConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigFile { .. }), "{err}");
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ComposerConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigFile { .. }));
    }
}
