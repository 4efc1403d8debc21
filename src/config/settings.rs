// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::path::Path;

use config::{Config, File};
use serde::{Deserialize, Serialize};

use super::engine::EngineSettings;
use super::error::ConfigError;
use super::layout::Layout;

/// The configuration for the synthesizer: which engine to run and what to load into it.
#[derive(Deserialize, Clone, Serialize, Debug, Default, PartialEq)]
pub struct Settings {
    /// The engine configuration.
    #[serde(default)]
    engine: EngineSettings,

    /// The layout to load after the synthesizer is open.
    #[serde(default)]
    layout: Layout,
}

impl Settings {
    /// Creates new settings.
    pub fn new(engine: EngineSettings, layout: Layout) -> Settings {
        Settings { engine, layout }
    }

    /// Parse settings from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Settings, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// Gets the engine settings.
    pub fn engine(&self) -> &EngineSettings {
        &self.engine
    }

    /// Gets the layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::router::OverlapPolicy;

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramsynth.yaml");
        fs::write(&path, "layout:\n  soundfonts: [piano.sf2]\n").unwrap();

        let settings = Settings::deserialize(&path).unwrap();
        assert_eq!(settings.engine(), &EngineSettings::default());
        assert_eq!(settings.engine().max_samples(), 1024);
        assert_eq!(settings.engine().sample_rate(), 44100);
        assert_eq!(settings.engine().overlap(), OverlapPolicy::Reject);
        assert_eq!(settings.layout().soundfonts(), &["piano.sf2".to_string()]);
        assert!(settings.layout().samples().is_empty());
    }

    #[test]
    fn test_engine_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramsynth.yaml");
        fs::write(
            &path,
            r#"
engine:
  name: mock-test
  max_samples: 16
  sample_rate: 48000
  overlap: last_wins
layout:
  samples:
    - file: a.wav
      root_key: 60
      keys: [0, 127]
"#,
        )
        .unwrap();

        let settings = Settings::deserialize(&path).unwrap();
        assert_eq!(settings.engine().engine(), "mock-test");
        assert_eq!(settings.engine().max_samples(), 16);
        assert_eq!(settings.engine().sample_rate(), 48000);
        assert_eq!(settings.engine().overlap(), OverlapPolicy::LastWins);
        assert_eq!(settings.layout().samples()[0].keys(), [0, 127]);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramsynth.yaml");
        fs::write(&path, "engine:\n  max_samples: lots\n").unwrap();
        assert!(Settings::deserialize(&path).is_err());

        assert!(Settings::deserialize(&dir.path().join("missing.yaml")).is_err());
    }
}
