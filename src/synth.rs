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

//! The synthesizer ties one engine synth to a sample store and a key-range router.
//!
//! A [`Synthesizer`] is created uninitialized, opened once and closed once. It
//! can't be reopened. Closing releases every binding, then every sample, then
//! the engine synth. Dropping an open synthesizer closes it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, span, warn, Level};

use crate::engine::{Engine, SampleHandle, SynthHandle};
use crate::error::{check_key, check_program, BindFailure, Error};
use crate::router::{KeyRange, KeyRangeRouter, OverlapPolicy};
use crate::samples::{Sample, SampleStore};

/// Lifecycle of a synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthState {
    Uninitialized,
    Open,
    Closed,
}

impl fmt::Display for SynthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SynthState::Uninitialized => "uninitialized",
            SynthState::Open => "open",
            SynthState::Closed => "closed",
        };
        f.write_str(name)
    }
}

struct Inner {
    state: SynthState,
    native: Option<SynthHandle>,
    store: SampleStore,
    router: KeyRangeRouter,
    soundfonts: Vec<PathBuf>,
}

impl Inner {
    /// Returns the engine synth if the synthesizer is open.
    fn require_open(&self) -> Result<SynthHandle, Error> {
        match (self.state, self.native) {
            (SynthState::Open, Some(native)) => Ok(native),
            (state, _) => Err(Error::InvalidState(state)),
        }
    }
}

/// A sample-bank synthesizer. All methods take `&self` and may be called from
/// several threads; mutations are serialized by an internal lock.
pub struct Synthesizer {
    engine: Arc<dyn Engine>,
    inner: Mutex<Inner>,
}

impl Synthesizer {
    /// Creates an uninitialized synthesizer.
    pub fn new(engine: Arc<dyn Engine>, policy: OverlapPolicy) -> Synthesizer {
        Synthesizer {
            inner: Mutex::new(Inner {
                state: SynthState::Uninitialized,
                native: None,
                store: SampleStore::new(engine.clone()),
                router: KeyRangeRouter::new(policy),
                soundfonts: Vec::new(),
            }),
            engine,
        }
    }

    /// Creates and opens a synthesizer.
    pub fn open_with(engine: Arc<dyn Engine>, policy: OverlapPolicy) -> Result<Synthesizer, Error> {
        let synth = Synthesizer::new(engine, policy);
        synth.open()?;
        Ok(synth)
    }

    /// Creates the engine synth. Only valid once, on an uninitialized synthesizer.
    pub fn open(&self) -> Result<(), Error> {
        let mut inner = self.inner.lock();
        if inner.state != SynthState::Uninitialized {
            return Err(Error::InvalidState(inner.state));
        }

        let native = self.engine.create_synth().map_err(|e| {
            warn!(engine = %self.engine, code = e.code(), error = %e, "Unable to create synth");
            Error::Init(e)
        })?;
        inner.native = Some(native);
        inner.state = SynthState::Open;
        info!(engine = %self.engine, synth = %native, "Synthesizer open");
        Ok(())
    }

    /// Releases every binding, every sample and the engine synth. Closing more than once does nothing.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        let native = match (inner.state, inner.native) {
            (SynthState::Open, Some(native)) => native,
            (SynthState::Closed, _) => return,
            _ => {
                inner.state = SynthState::Closed;
                return;
            }
        };

        let span = span!(Level::INFO, "close synthesizer");
        let _enter = span.enter();

        let mut unbound: Vec<(SampleHandle, u16, u8)> = inner
            .router
            .bindings()
            .into_iter()
            .map(|(bank, preset, range)| (range.sample(), bank, preset))
            .collect();
        unbound.sort();
        unbound.dedup();
        for (sample, bank, preset) in unbound {
            if let Err(e) = self.engine.unbind(native, sample, bank, preset) {
                warn!(sample = %sample, bank, preset, error = %e, "Engine failed to unbind sample");
            }
        }
        inner.router.clear();
        inner.store.release_all();
        inner.soundfonts.clear();

        self.engine.destroy_synth(native);
        inner.native = None;
        inner.state = SynthState::Closed;
        info!(synth = %native, "Synthesizer closed");
    }

    /// The current lifecycle state.
    pub fn state(&self) -> SynthState {
        self.inner.lock().state
    }

    /// The engine synth, while open.
    pub fn handle(&self) -> Option<SynthHandle> {
        self.inner.lock().native
    }

    /// Loads a sample into the synthesizer's store.
    pub fn load_sample<P: AsRef<Path>>(&self, filename: P, root_key: u8) -> Result<Sample, Error> {
        let mut inner = self.inner.lock();
        inner.require_open()?;
        inner.store.load(filename, root_key)
    }

    /// Releases a sample, unbinding it everywhere first. Unknown handles are ignored.
    pub fn release_sample(&self, handle: SampleHandle) -> Result<(), Error> {
        let mut inner = self.inner.lock();
        let native = inner.require_open()?;

        for (bank, preset) in inner.router.unbind_all(handle) {
            if let Err(e) = self.engine.unbind(native, handle, bank, preset) {
                warn!(sample = %handle, bank, preset, error = %e, "Engine failed to unbind sample");
            }
        }
        inner.store.release(handle);
        Ok(())
    }

    /// Looks up a loaded sample.
    pub fn lookup(&self, handle: SampleHandle) -> Result<Option<Sample>, Error> {
        let inner = self.inner.lock();
        inner.require_open()?;
        Ok(inner.store.lookup(handle))
    }

    /// All loaded samples, by handle.
    pub fn samples(&self) -> Result<Vec<Sample>, Error> {
        let inner = self.inner.lock();
        inner.require_open()?;
        Ok(inner
            .store
            .handles()
            .into_iter()
            .filter_map(|handle| inner.store.lookup(handle))
            .collect())
    }

    /// Attaches a loaded sample to the inclusive key range of a bank and preset.
    pub fn bind(
        &self,
        bank: u16,
        preset: u8,
        lokey: u8,
        hikey: u8,
        handle: SampleHandle,
    ) -> Result<KeyRange, Error> {
        let mut inner = self.inner.lock();
        let native = inner.require_open()?;

        let range = KeyRange::new(lokey, hikey, handle)?;
        check_program(bank, preset)?;
        if !inner.store.contains(handle) {
            return Err(Error::NotFound(format!("sample {} is not loaded", handle)));
        }
        inner.router.check(bank, preset, &range)?;

        self.engine
            .bind(native, handle, bank, preset, lokey, hikey)
            .map_err(|e| {
                warn!(sample = %handle, bank, preset, lokey, hikey, code = e.code(), error = %e, "Engine refused key range");
                Error::Bind {
                    sample: handle,
                    bank,
                    preset,
                    lokey,
                    hikey,
                    reason: BindFailure::Engine(e),
                }
            })?;
        inner.router.insert(bank, preset, range);
        info!(sample = %handle, bank, preset, lokey, hikey, "Sample bound");
        Ok(range)
    }

    /// Detaches every key range of a sample from a bank and preset.
    pub fn unbind(&self, bank: u16, preset: u8, handle: SampleHandle) -> Result<(), Error> {
        let mut inner = self.inner.lock();
        let native = inner.require_open()?;
        check_program(bank, preset)?;

        let bound = inner
            .router
            .ranges(bank, preset)
            .iter()
            .any(|range| range.sample() == handle);
        if !bound {
            return Err(Error::NotFound(format!(
                "sample {} is not bound in bank {}, preset {}",
                handle, bank, preset
            )));
        }

        // The router keeps the binding until the engine has let go of it.
        self.engine
            .unbind(native, handle, bank, preset)
            .map_err(|e| {
                warn!(sample = %handle, bank, preset, code = e.code(), error = %e, "Engine failed to unbind sample");
                Error::NotFound(format!("sample {}: {}", handle, e))
            })?;
        let removed = inner.router.unbind(bank, preset, handle)?;
        info!(sample = %handle, bank, preset, ranges = removed.len(), "Sample unbound");
        Ok(())
    }

    /// Finds the sample that plays for a key of a bank and preset.
    pub fn resolve(&self, bank: u16, preset: u8, key: u8) -> Result<Option<Sample>, Error> {
        let inner = self.inner.lock();
        inner.require_open()?;
        check_program(bank, preset)?;
        check_key("key", key)?;

        Ok(inner
            .router
            .resolve(bank, preset, key)
            .and_then(|handle| inner.store.lookup(handle)))
    }

    /// All bindings as (bank, preset, range).
    pub fn bindings(&self) -> Result<Vec<(u16, u8, KeyRange)>, Error> {
        let inner = self.inner.lock();
        inner.require_open()?;
        Ok(inner.router.bindings())
    }

    /// Loads a SoundFont into the engine synth and returns its font id.
    pub fn load_soundfont<P: AsRef<Path>>(&self, filename: P) -> Result<u32, Error> {
        let filename = filename.as_ref();
        let mut inner = self.inner.lock();
        let native = inner.require_open()?;

        let font_id = self
            .engine
            .load_soundfont(native, filename)
            .map_err(|e| {
                warn!(path = ?filename, code = e.code(), error = %e, "Failed to load SoundFont");
                Error::Load {
                    path: filename.to_path_buf(),
                    source: e,
                }
            })?;
        inner.soundfonts.push(filename.to_path_buf());
        info!(path = ?filename, font_id, "SoundFont loaded");
        Ok(font_id)
    }

    /// The SoundFont files loaded so far.
    pub fn soundfonts(&self) -> Result<Vec<PathBuf>, Error> {
        let inner = self.inner.lock();
        inner.require_open()?;
        Ok(inner.soundfonts.clone())
    }
}

impl Drop for Synthesizer {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Synthesizer")
            .field("engine", &self.engine.to_string())
            .field("state", &inner.state)
            .field("samples", &inner.store.len())
            .field("bindings", &inner.router.len())
            .finish()
    }
}
