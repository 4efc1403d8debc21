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
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::info;

use super::{EngineError, SampleHandle, SynthHandle};

#[derive(Default)]
struct State {
    synths: HashSet<SynthHandle>,
    samples: HashMap<SampleHandle, (PathBuf, u8)>,
    /// (synth, sample, bank, preset, lokey, hikey)
    zones: Vec<(SynthHandle, SampleHandle, u16, u8, u8, u8)>,
    fonts: Vec<PathBuf>,
    next_synth: u32,
    next_sample: u32,
}

/// A mock engine. Doesn't read any files and can be told to fail.
pub struct Engine {
    name: String,
    fail_create: AtomicBool,
    fail_load: AtomicBool,
    fail_bind: AtomicBool,
    fail_soundfont: AtomicBool,
    fail_unbind: AtomicBool,
    state: Mutex<State>,
}

impl Engine {
    /// Creates a new mock engine.
    pub fn new(name: &str) -> Engine {
        Engine {
            name: name.to_string(),
            fail_create: AtomicBool::new(false),
            fail_load: AtomicBool::new(false),
            fail_bind: AtomicBool::new(false),
            fail_soundfont: AtomicBool::new(false),
            fail_unbind: AtomicBool::new(false),
            state: Mutex::new(State::default()),
        }
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_bind(&self, fail: bool) {
        self.fail_bind.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_soundfont(&self, fail: bool) {
        self.fail_soundfont.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_unbind(&self, fail: bool) {
        self.fail_unbind.store(fail, Ordering::Relaxed);
    }

    /// The number of synths that have been created and not destroyed.
    pub fn live_synths(&self) -> usize {
        self.state.lock().synths.len()
    }

    /// The number of samples that have been loaded and not deleted.
    pub fn live_samples(&self) -> usize {
        self.state.lock().samples.len()
    }

    /// The number of key ranges currently attached.
    pub fn live_zones(&self) -> usize {
        self.state.lock().zones.len()
    }
}

impl super::Engine for Engine {
    fn create_synth(&self) -> Result<SynthHandle, EngineError> {
        if self.fail_create.load(Ordering::Relaxed) {
            return Err(EngineError::Rejected("audio device unavailable".to_string()));
        }

        let mut state = self.state.lock();
        let handle = SynthHandle(state.next_synth);
        state.next_synth += 1;
        state.synths.insert(handle);
        info!(engine = self.name, synth = %handle, "Created synth (mock)");
        Ok(handle)
    }

    fn destroy_synth(&self, synth: SynthHandle) {
        let mut state = self.state.lock();
        if state.synths.remove(&synth) {
            state.zones.retain(|zone| zone.0 != synth);
            info!(engine = self.name, synth = %synth, "Destroyed synth (mock)");
        }
    }

    fn load_sample(&self, path: &Path, root_key: u8) -> Result<SampleHandle, EngineError> {
        if self.fail_load.load(Ordering::Relaxed) {
            return Err(EngineError::Rejected(format!(
                "unable to load {}",
                path.display()
            )));
        }

        let mut state = self.state.lock();
        let handle = SampleHandle(state.next_sample);
        state.next_sample += 1;
        state
            .samples
            .insert(handle, (path.to_path_buf(), root_key));
        Ok(handle)
    }

    fn delete_sample(&self, sample: SampleHandle) {
        let mut state = self.state.lock();
        if state.samples.remove(&sample).is_some() {
            state.zones.retain(|zone| zone.1 != sample);
        }
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
        if self.fail_bind.load(Ordering::Relaxed) {
            return Err(EngineError::Rejected("zone not accepted".to_string()));
        }

        let mut state = self.state.lock();
        if !state.synths.contains(&synth) {
            return Err(EngineError::UnknownSynth(synth));
        }
        if !state.samples.contains_key(&sample) {
            return Err(EngineError::UnknownSample(sample));
        }
        state
            .zones
            .push((synth, sample, bank, preset, lokey, hikey));
        Ok(())
    }

    fn unbind(
        &self,
        synth: SynthHandle,
        sample: SampleHandle,
        bank: u16,
        preset: u8,
    ) -> Result<(), EngineError> {
        if self.fail_unbind.load(Ordering::Relaxed) {
            return Err(EngineError::Rejected("zone is busy".to_string()));
        }

        let mut state = self.state.lock();
        let before = state.zones.len();
        state.zones.retain(|zone| {
            !(zone.0 == synth && zone.1 == sample && zone.2 == bank && zone.3 == preset)
        });
        if state.zones.len() == before {
            return Err(EngineError::NoZone);
        }
        Ok(())
    }

    fn load_soundfont(&self, synth: SynthHandle, path: &Path) -> Result<u32, EngineError> {
        if self.fail_soundfont.load(Ordering::Relaxed) {
            return Err(EngineError::Rejected(format!(
                "{} rejected",
                path.display()
            )));
        }

        let mut state = self.state.lock();
        if !state.synths.contains(&synth) {
            return Err(EngineError::UnknownSynth(synth));
        }
        state.fonts.push(path.to_path_buf());
        Ok(state.fonts.len() as u32)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
