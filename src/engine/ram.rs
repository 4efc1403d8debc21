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

//! An in-process engine that keeps samples in memory as 16-bit PCM and
//! attaches them to a RAM font with one instrument zone per key range.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, span, Level};

use super::decode::decode_file;
use super::{soundfont, EngineError, SampleHandle, SynthHandle};

/// Default number of sample slots.
pub const DEFAULT_MAX_SAMPLES: usize = 1024;

/// Default (and required) sample rate of loaded samples.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Name of the RAM font samples are attached to.
const FONT_NAME: &str = "Tada";

/// A sample held in a slot.
struct RamSample {
    path: PathBuf,
    root_key: u8,
    data: Arc<[i16]>,
}

/// An instrument zone: a sample played over an inclusive key range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    pub sample: SampleHandle,
    pub lokey: u8,
    pub hikey: u8,
}

struct RamSynth {
    handle: SynthHandle,
    /// Zones per (bank, preset) of the RAM font.
    zones: HashMap<(u16, u8), Vec<Zone>>,
    /// Program selected on channel 0.
    program: Option<(u16, u8)>,
    /// SoundFonts loaded on top of the RAM font, by font id.
    fonts: Vec<(u32, PathBuf)>,
}

impl RamSynth {
    fn new(handle: SynthHandle) -> Self {
        Self {
            handle,
            zones: HashMap::new(),
            program: None,
            fonts: Vec::new(),
        }
    }
}

struct State {
    synth: Option<RamSynth>,
    next_synth_id: u32,
    slots: Vec<Option<RamSample>>,
}

impl State {
    fn free_slot(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.is_none())
    }

    fn synth_mut(&mut self, handle: SynthHandle) -> Result<&mut RamSynth, EngineError> {
        match self.synth.as_mut() {
            Some(synth) if synth.handle == handle => Ok(synth),
            _ => Err(EngineError::UnknownSynth(handle)),
        }
    }

    fn synth(&self, handle: SynthHandle) -> Option<&RamSynth> {
        self.synth.as_ref().filter(|synth| synth.handle == handle)
    }

    fn sample(&self, handle: SampleHandle) -> Option<&RamSample> {
        self.slots
            .get(handle.0 as usize)
            .and_then(|slot| slot.as_ref())
    }
}

/// The RAM engine. Only one synth may exist at a time.
pub struct Engine {
    max_samples: usize,
    sample_rate: u32,
    state: Mutex<State>,
}

impl Engine {
    /// Creates an engine with `max_samples` slots that accepts samples recorded at `sample_rate`.
    pub fn new(max_samples: usize, sample_rate: u32) -> Engine {
        Engine {
            max_samples,
            sample_rate,
            state: Mutex::new(State {
                synth: None,
                next_synth_id: 0,
                slots: (0..max_samples).map(|_| None).collect(),
            }),
        }
    }

    /// The name of the RAM font.
    pub fn font_name(&self) -> &'static str {
        FONT_NAME
    }

    /// The number of loaded samples.
    pub fn live_samples(&self) -> usize {
        self.state
            .lock()
            .slots
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    /// The number of frames of a loaded sample.
    pub fn sample_frames(&self, sample: SampleHandle) -> Option<usize> {
        self.state.lock().sample(sample).map(|s| s.data.len())
    }

    /// The root key a sample was loaded with.
    pub fn sample_root_key(&self, sample: SampleHandle) -> Option<u8> {
        self.state.lock().sample(sample).map(|s| s.root_key)
    }

    /// The zones of a bank and preset, in the order they were added.
    pub fn zones(&self, synth: SynthHandle, bank: u16, preset: u8) -> Vec<Zone> {
        self.state
            .lock()
            .synth(synth)
            .and_then(|s| s.zones.get(&(bank, preset)).cloned())
            .unwrap_or_default()
    }

    /// The bank and preset selected on channel 0.
    pub fn selected_program(&self, synth: SynthHandle) -> Option<(u16, u8)> {
        self.state.lock().synth(synth).and_then(|s| s.program)
    }

    /// The SoundFont files loaded into a synth.
    pub fn soundfonts(&self, synth: SynthHandle) -> Vec<PathBuf> {
        self.state
            .lock()
            .synth(synth)
            .map(|s| s.fonts.iter().map(|(_, path)| path.clone()).collect())
            .unwrap_or_default()
    }
}

impl super::Engine for Engine {
    fn create_synth(&self) -> Result<SynthHandle, EngineError> {
        let mut state = self.state.lock();
        if state.synth.is_some() {
            return Err(EngineError::SynthActive);
        }

        let handle = SynthHandle(state.next_synth_id);
        state.next_synth_id += 1;
        state.synth = Some(RamSynth::new(handle));
        info!(synth = %handle, font = FONT_NAME, "Created synth");
        Ok(handle)
    }

    fn destroy_synth(&self, synth: SynthHandle) {
        let mut state = self.state.lock();
        if state.synth(synth).is_some() {
            state.synth = None;
            info!(synth = %synth, "Destroyed synth");
        } else {
            debug!(synth = %synth, "Ignoring destroy of unknown synth");
        }
    }

    fn load_sample(&self, path: &Path, root_key: u8) -> Result<SampleHandle, EngineError> {
        let span = span!(Level::INFO, "load sample (ram)");
        let _enter = span.enter();

        // Fail before decoding if the table is already full.
        if self.state.lock().free_slot().is_none() {
            return Err(EngineError::NoFreeSlot {
                max: self.max_samples,
            });
        }

        let decoded = decode_file(path)?;
        if decoded.channels != 1 {
            return Err(EngineError::NotMono {
                channels: decoded.channels,
            });
        }
        if decoded.sample_rate != self.sample_rate {
            return Err(EngineError::SampleRate {
                expected: self.sample_rate,
                actual: decoded.sample_rate,
            });
        }
        if decoded.data.is_empty() {
            return Err(EngineError::EmptySample);
        }

        let mut state = self.state.lock();
        let slot = state.free_slot().ok_or(EngineError::NoFreeSlot {
            max: self.max_samples,
        })?;
        let frames = decoded.data.len();
        state.slots[slot] = Some(RamSample {
            path: path.to_path_buf(),
            root_key,
            data: decoded.data.into(),
        });

        let handle = SampleHandle(slot as u32);
        info!(sample = %handle, path = ?path, root_key, frames, "Loaded sample");
        Ok(handle)
    }

    fn delete_sample(&self, sample: SampleHandle) {
        let mut state = self.state.lock();
        let removed = state
            .slots
            .get_mut(sample.0 as usize)
            .and_then(|slot| slot.take());

        let Some(removed) = removed else {
            debug!(sample = %sample, "Ignoring delete of unknown sample");
            return;
        };

        // Zones must never point at a freed slot.
        if let Some(synth) = state.synth.as_mut() {
            for zones in synth.zones.values_mut() {
                zones.retain(|zone| zone.sample != sample);
            }
            synth.zones.retain(|_, zones| !zones.is_empty());
        }
        info!(sample = %sample, path = ?removed.path, "Deleted sample");
    }

    fn bind(
        &self,
        synth: SynthHandle,
        sample: SampleHandle,
        bank: u16,
        preset: u8,
        lokey: u8,
        hikey: u8,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        if state.sample(sample).is_none() {
            return Err(EngineError::UnknownSample(sample));
        }
        if lokey > hikey {
            return Err(EngineError::Rejected(format!(
                "key range {}-{} is reversed",
                lokey, hikey
            )));
        }

        let ram_synth = state.synth_mut(synth)?;
        ram_synth
            .zones
            .entry((bank, preset))
            .or_default()
            .push(Zone {
                sample,
                lokey,
                hikey,
            });
        ram_synth.program = Some((bank, preset));
        debug!(
            synth = %synth,
            sample = %sample,
            bank,
            preset,
            lokey,
            hikey,
            "Added zone and selected program on channel 0"
        );
        Ok(())
    }

    fn unbind(
        &self,
        synth: SynthHandle,
        sample: SampleHandle,
        bank: u16,
        preset: u8,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        if state.sample(sample).is_none() {
            return Err(EngineError::UnknownSample(sample));
        }

        let ram_synth = state.synth_mut(synth)?;
        let zones = ram_synth
            .zones
            .get_mut(&(bank, preset))
            .ok_or(EngineError::NoZone)?;
        let before = zones.len();
        zones.retain(|zone| zone.sample != sample);
        if zones.len() == before {
            return Err(EngineError::NoZone);
        }
        if zones.is_empty() {
            ram_synth.zones.remove(&(bank, preset));
        }
        debug!(synth = %synth, sample = %sample, bank, preset, "Removed zones");
        Ok(())
    }

    fn load_soundfont(&self, synth: SynthHandle, path: &Path) -> Result<u32, EngineError> {
        // Make sure the synth exists before touching the file.
        self.state.lock().synth_mut(synth)?;
        soundfont::check_header(path)?;

        let mut state = self.state.lock();
        let ram_synth = state.synth_mut(synth)?;
        // The RAM font is font 0.
        let font_id = ram_synth.fonts.len() as u32 + 1;
        ram_synth.fonts.push((font_id, path.to_path_buf()));
        info!(synth = %synth, font_id, path = ?path, "Loaded SoundFont");
        Ok(font_id)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RAM engine ({} slots, {}Hz)",
            self.max_samples, self.sample_rate
        )
    }
}
