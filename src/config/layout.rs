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

//! Sample layouts: which files to load and which keys of which program they play on.

use std::fs;
use std::path::Path;

use config::{Config, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ConfigError;
use crate::error::Error;
use crate::samples::Sample;
use crate::synth::Synthesizer;
use crate::util::resolve_path;

/// A YAML representation of one sample and the key range it plays on.
#[derive(Deserialize, Clone, Serialize, Debug, PartialEq)]
pub struct SampleBinding {
    /// The audio file to load.
    file: String,

    /// The key at which the sample plays at its recorded rate.
    root_key: u8,

    /// The MIDI bank.
    #[serde(default)]
    bank: u16,

    /// The MIDI preset.
    #[serde(default)]
    preset: u8,

    /// The key range [low, high] inclusive.
    keys: [u8; 2],
}

impl SampleBinding {
    /// Creates a new sample binding.
    pub fn new(file: &str, root_key: u8, bank: u16, preset: u8, keys: [u8; 2]) -> SampleBinding {
        SampleBinding {
            file: file.to_string(),
            root_key,
            bank,
            preset,
            keys,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn root_key(&self) -> u8 {
        self.root_key
    }

    pub fn bank(&self) -> u16 {
        self.bank
    }

    pub fn preset(&self) -> u8 {
        self.preset
    }

    pub fn keys(&self) -> [u8; 2] {
        self.keys
    }

    /// Loads the sample and binds it. If the bind fails, the sample is released again.
    pub fn apply(&self, synth: &Synthesizer, base_path: &Path) -> Result<Sample, Error> {
        let sample = synth.load_sample(resolve_path(base_path, &self.file), self.root_key)?;
        if let Err(e) = synth.bind(
            self.bank,
            self.preset,
            self.keys[0],
            self.keys[1],
            sample.handle(),
        ) {
            synth.release_sample(sample.handle())?;
            return Err(e);
        }
        Ok(sample)
    }
}

/// A set of SoundFonts and sample bindings to load into a synthesizer.
#[derive(Deserialize, Clone, Serialize, Debug, Default, PartialEq)]
pub struct Layout {
    /// SoundFont files to load before any sample.
    #[serde(default)]
    soundfonts: Vec<String>,

    /// Samples and their key ranges.
    #[serde(default)]
    samples: Vec<SampleBinding>,
}

impl Layout {
    /// Creates a new layout.
    pub fn new(soundfonts: Vec<String>, samples: Vec<SampleBinding>) -> Layout {
        Layout {
            soundfonts,
            samples,
        }
    }

    /// The guitar layout used by the smoke test when no configuration is given.
    pub fn demo() -> Layout {
        let guitar = |file: &str, root_key: u8, lokey: u8, hikey: u8| {
            SampleBinding::new(file, root_key, 0, 0, [lokey, hikey])
        };
        Layout::new(
            Vec::new(),
            vec![
                guitar("[accord guitar].wav", 55, 50, 58),
                guitar("cabrel.wav_14.wav", 60, 59, 59),
                guitar("cabrel.wav_16.wav", 60, 60, 60),
                guitar("cabrel.wav_15.wav", 62, 61, 61),
                guitar("cabrel.wav_17.wav", 62, 62, 62),
                guitar("[TIR].wav", 64, 63, 63),
                guitar("cabrel.wav_18.wav", 64, 64, 64),
                guitar("cabrel.wav_5.wav", 64, 65, 65),
                guitar("cabrel.wav_7.wav", 64, 66, 66),
                guitar("cabrel.wav_8.wav", 64, 67, 67),
                guitar("cabrel.wav_19.wav", 64, 68, 68),
                guitar("cabrel.wav_9.wav", 65, 69, 69),
                guitar("cabrel.wav_10.wav", 67, 70, 70),
                guitar("cabrel.wav_11.wav", 69, 71, 71),
            ],
        )
    }

    /// Parse a layout from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Layout, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Layout>()?)
    }

    /// Serialize and save the layout to a YAML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let serialized = serde_yml::to_string(self)?;
        fs::write(path, serialized)?;
        info!(path = ?path, samples = self.samples.len(), "Saved layout");
        Ok(())
    }

    pub fn soundfonts(&self) -> &[String] {
        &self.soundfonts
    }

    pub fn samples(&self) -> &[SampleBinding] {
        &self.samples
    }

    /// Loads every SoundFont, then every sample, stopping at the first failure.
    pub fn apply(&self, synth: &Synthesizer, base_path: &Path) -> Result<Vec<Sample>, Error> {
        for soundfont in &self.soundfonts {
            synth.load_soundfont(resolve_path(base_path, soundfont))?;
        }

        let samples = self
            .samples
            .iter()
            .map(|binding| binding.apply(synth, base_path))
            .collect::<Result<Vec<Sample>, Error>>()?;
        info!(
            soundfonts = self.soundfonts.len(),
            samples = samples.len(),
            "Layout applied"
        );
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::engine::{mock, ram};
    use crate::error::ErrorKind;
    use crate::router::OverlapPolicy;
    use crate::testutil::{write_mono_wav, write_soundfont};

    #[test]
    fn test_deserialize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.yaml");
        fs::write(
            &path,
            r#"
soundfonts:
  - piano.sf2
samples:
  - file: a.wav
    root_key: 55
    keys: [50, 58]
  - file: b.wav
    root_key: 60
    bank: 1
    preset: 4
    keys: [59, 59]
"#,
        )
        .unwrap();

        let layout = Layout::deserialize(&path).unwrap();
        assert_eq!(layout.soundfonts(), &["piano.sf2".to_string()]);
        assert_eq!(layout.samples().len(), 2);
        assert_eq!(
            layout.samples()[0],
            SampleBinding::new("a.wav", 55, 0, 0, [50, 58])
        );
        assert_eq!(layout.samples()[1].bank(), 1);
        assert_eq!(layout.samples()[1].preset(), 4);
        assert_eq!(layout.samples()[1].keys(), [59, 59]);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.yaml");
        Layout::demo().save(&path).unwrap();

        assert_eq!(Layout::deserialize(&path).unwrap(), Layout::demo());
    }

    #[test]
    fn test_demo_layout_has_no_overlaps() {
        let engine = Arc::new(mock::Engine::new("mock"));
        let synth = Synthesizer::open_with(engine, OverlapPolicy::Reject).unwrap();
        let samples = Layout::demo().apply(&synth, Path::new(".")).unwrap();
        assert_eq!(samples.len(), 14);

        let guitar = synth.resolve(0, 0, 54).unwrap().unwrap();
        assert_eq!(guitar.root_key(), 55);
        assert_eq!(synth.resolve(0, 0, 71).unwrap().unwrap().root_key(), 69);
        assert!(synth.resolve(0, 0, 72).unwrap().is_none());
    }

    #[test]
    fn test_apply_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        write_mono_wav(dir.path(), "a.wav", 64).unwrap();
        write_soundfont(&dir.path().join("piano.sf2")).unwrap();

        let engine = Arc::new(ram::Engine::new(8, ram::DEFAULT_SAMPLE_RATE));
        let synth = Synthesizer::open_with(engine, OverlapPolicy::Reject).unwrap();
        let layout = Layout::new(
            vec!["piano.sf2".to_string()],
            vec![SampleBinding::new("a.wav", 55, 0, 0, [50, 58])],
        );

        let samples = layout.apply(&synth, dir.path()).unwrap();
        assert_eq!(samples[0].filename(), dir.path().join("a.wav"));
        assert_eq!(synth.soundfonts().unwrap().len(), 1);
        assert_eq!(synth.resolve(0, 0, 50).unwrap(), Some(samples[0].clone()));
    }

    #[test]
    fn test_apply_releases_sample_on_bind_failure() {
        let engine = Arc::new(mock::Engine::new("mock"));
        let synth = Synthesizer::open_with(engine.clone(), OverlapPolicy::Reject).unwrap();
        let layout = Layout::new(
            Vec::new(),
            vec![
                SampleBinding::new("a.wav", 55, 0, 0, [50, 58]),
                SampleBinding::new("b.wav", 60, 0, 0, [58, 60]),
            ],
        );

        let err = layout.apply(&synth, Path::new(".")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bind);
        assert_eq!(engine.live_samples(), 1);
        assert_eq!(synth.samples().unwrap().len(), 1);
    }
}
