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

//! The sample store hands out handles for loaded samples and guarantees each one
//! is released at the engine exactly once.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::engine::{Engine, SampleHandle};
use crate::error::{check_key, Error};

/// A loaded sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    handle: SampleHandle,
    filename: PathBuf,
    root_key: u8,
}

impl Sample {
    /// The handle of this sample.
    pub fn handle(&self) -> SampleHandle {
        self.handle
    }

    /// The file the sample was loaded from.
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// The key at which the sample plays at its recorded rate.
    pub fn root_key(&self) -> u8 {
        self.root_key
    }

    /// The rate relative to the recorded rate at which this sample plays for `key`.
    pub fn playback_rate(&self, key: u8) -> f32 {
        2.0_f32.powf((key as f32 - self.root_key as f32) / 12.0)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, root key {})",
            self.handle,
            crate::util::filename_display(&self.filename),
            self.root_key
        )
    }
}

/// Owns the samples loaded through an engine.
pub struct SampleStore {
    engine: Arc<dyn Engine>,
    samples: HashMap<SampleHandle, Sample>,
}

impl SampleStore {
    /// Creates an empty store backed by the given engine.
    pub fn new(engine: Arc<dyn Engine>) -> SampleStore {
        SampleStore {
            engine,
            samples: HashMap::new(),
        }
    }

    /// Loads a sample. The root key must be in [0, 127].
    pub fn load<P: AsRef<Path>>(&mut self, filename: P, root_key: u8) -> Result<Sample, Error> {
        let filename = filename.as_ref();
        check_key("root key", root_key)?;

        let handle = self
            .engine
            .load_sample(filename, root_key)
            .map_err(|e| {
                warn!(path = ?filename, root_key, code = e.code(), error = %e, "Failed to load sample");
                Error::Load {
                    path: filename.to_path_buf(),
                    source: e,
                }
            })?;

        let sample = Sample {
            handle,
            filename: filename.to_path_buf(),
            root_key,
        };
        info!(sample = %handle, path = ?filename, root_key, "Sample added to store");
        self.samples.insert(handle, sample.clone());
        Ok(sample)
    }

    /// Releases a sample. Releasing an unknown or already released handle does nothing.
    pub fn release(&mut self, handle: SampleHandle) {
        match self.samples.remove(&handle) {
            Some(sample) => {
                self.engine.delete_sample(handle);
                info!(sample = %sample, "Released sample");
            }
            None => debug!(sample = %handle, "Sample already released"),
        }
    }

    /// Releases every sample in the store.
    pub fn release_all(&mut self) {
        for handle in self.handles() {
            self.release(handle);
        }
    }

    /// Looks up a live sample.
    pub fn lookup(&self, handle: SampleHandle) -> Option<Sample> {
        self.samples.get(&handle).cloned()
    }

    /// Returns true if the handle refers to a live sample.
    pub fn contains(&self, handle: SampleHandle) -> bool {
        self.samples.contains_key(&handle)
    }

    /// The handles of all live samples, in ascending order.
    pub fn handles(&self) -> Vec<SampleHandle> {
        let mut handles: Vec<SampleHandle> = self.samples.keys().copied().collect();
        handles.sort();
        handles
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Drop for SampleStore {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl fmt::Debug for SampleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleStore")
            .field("engine", &self.engine.to_string())
            .field("samples", &self.samples.len())
            .finish()
    }
}
