use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::counting::LineConfig;
use crate::error::{ConfigError, Error};
use crate::tracker::TrackerConfig;

/// Everything needed to construct a `CountingPipeline`.
///
/// Deserializes from JSON; missing fields take their defaults:
///
/// ```json
/// {"line": {"line_position": 0.6, "invert_directions": true},
///  "tracker": {"max_age": 15},
///  "min_confidence": 0.3}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub tracker: TrackerConfig,
    pub line: LineConfig,
    /// Detections below this confidence never reach the tracker
    pub min_confidence: f64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            line: LineConfig::default(),
            min_confidence: 0.25,
        }
    }
}

impl CounterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracker.validate()?;
        self.line.validate()?;
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::MinConfidence(self.min_confidence));
        }
        Ok(())
    }

    /// Load and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: CounterConfig =
            serde_json::from_str(&text).map_err(|source| Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }
}
