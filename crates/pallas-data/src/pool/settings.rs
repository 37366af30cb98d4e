// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration for the constant-buffer pool.

use pallas_core::renderer::MAX_FRAMES_IN_FLIGHT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating [`PoolSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read pool settings from '{}': {source}", .path.display())]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The settings text is not valid RON for [`PoolSettings`].
    #[error("failed to parse pool settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The settings could not be written out as RON.
    #[error("failed to serialize pool settings: {0}")]
    Serialize(#[from] ron::Error),
    /// The settings parsed but describe an unusable pool.
    #[error("invalid pool settings: {0}")]
    Invalid(String),
}

/// Tunables for a [`ConstantBufferPool`](super::ConstantBufferPool).
///
/// Missing fields take their default value when loaded from RON, so a settings
/// file only needs to name what it overrides:
///
/// ```text
/// (frames_in_flight: 3, label_prefix: "Materials")
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// The number of frame slots, i.e. how many frames the GPU may lag behind.
    pub frames_in_flight: usize,
    /// Prefix of every pooled buffer's debug label.
    pub label_prefix: String,
    /// Runs [`check_consistency`](super::ConstantBufferPool::check_consistency)
    /// every time a slot becomes active.
    pub check_on_advance: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            frames_in_flight: MAX_FRAMES_IN_FLIGHT,
            label_prefix: "ConstantBufferPool".to_string(),
            check_on_advance: cfg!(debug_assertions),
        }
    }
}

impl PoolSettings {
    /// Parses and validates settings from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = ron::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses and validates a RON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_ron_str(&text)?;
        log::info!("Loaded pool settings from '{}'", path.display());
        Ok(settings)
    }

    /// Renders the settings as pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, SettingsError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Checks that the settings describe a usable pool.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.frames_in_flight == 0 {
            return Err(SettingsError::Invalid(
                "frames_in_flight must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_frames_in_flight() {
        let settings = PoolSettings::default();
        assert_eq!(settings.frames_in_flight, MAX_FRAMES_IN_FLIGHT);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn partial_ron_keeps_defaults() {
        let settings = PoolSettings::from_ron_str("(frames_in_flight: 3)").unwrap();
        assert_eq!(settings.frames_in_flight, 3);
        assert_eq!(settings.label_prefix, PoolSettings::default().label_prefix);
    }

    #[test]
    fn zero_frames_is_rejected() {
        let err = PoolSettings::from_ron_str("(frames_in_flight: 0)").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
        assert_eq!(
            err.to_string(),
            "invalid pool settings: frames_in_flight must be at least 1"
        );
    }

    #[test]
    fn malformed_ron_is_a_parse_error() {
        let err = PoolSettings::from_ron_str("(frames_in_flight: \"two\")").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn ron_text_round_trips() {
        let settings = PoolSettings {
            frames_in_flight: 4,
            label_prefix: "Shadows".to_string(),
            check_on_advance: false,
        };
        let text = settings.to_ron_string().unwrap();
        assert_eq!(PoolSettings::from_ron_str(&text).unwrap(), settings);
    }

    #[test]
    fn load_reads_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.ron");
        std::fs::write(&path, "(label_prefix: \"Sandbox\", check_on_advance: true)").unwrap();

        let settings = PoolSettings::load(&path).unwrap();
        assert_eq!(settings.label_prefix, "Sandbox");
        assert!(settings.check_on_advance);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PoolSettings::load(dir.path().join("missing.ron")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
        assert!(err.to_string().contains("missing.ron"));
    }
}
