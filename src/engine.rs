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

//! The boundary with the sample engine.
//!
//! An [`Engine`] owns the actual sample memory and instrument zones. Everything
//! above it (the sample store, the router and the synthesizer) only keeps
//! handles and calls through this trait.

use std::error::Error;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::config::EngineSettings;

pub mod decode;
pub mod mock;
pub mod ram;
mod soundfont;

pub use decode::DecodeError;

/// Handle of a synth created by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SynthHandle(pub u32);

impl fmt::Display for SynthHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle of a sample loaded into an engine. Unique among live samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleHandle(pub u32);

impl fmt::Display for SampleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Failures reported by an engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("a synth is already active on this engine")]
    SynthActive,

    #[error("unknown synth {0}")]
    UnknownSynth(SynthHandle),

    #[error("no free sample slot (maximum {max})")]
    NoFreeSlot { max: usize },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("sample must be mono, found {channels} channels")]
    NotMono { channels: u16 },

    #[error("sample rate must be {expected}Hz, found {actual}Hz")]
    SampleRate { expected: u32, actual: u32 },

    #[error("sample contains no audio")]
    EmptySample,

    #[error("unknown sample {0}")]
    UnknownSample(SampleHandle),

    #[error("no zone for that sample in this bank and preset")]
    NoZone,

    #[error("not a SoundFont: {0}")]
    InvalidSoundFont(String),

    #[error("rejected by engine: {0}")]
    Rejected(String),
}

impl EngineError {
    /// The negative status code a native engine reports for this failure.
    pub fn code(&self) -> i32 {
        match self {
            EngineError::SynthActive
            | EngineError::UnknownSynth(_)
            | EngineError::NoFreeSlot { .. } => -1,
            EngineError::Decode(_) | EngineError::UnknownSample(_) => -2,
            EngineError::NotMono { .. }
            | EngineError::NoZone
            | EngineError::InvalidSoundFont(_)
            | EngineError::Rejected(_) => -3,
            EngineError::SampleRate { .. } => -4,
            EngineError::EmptySample => -8,
        }
    }
}

/// A sample engine. Implementations do their own locking so that a single
/// engine can be shared between threads.
pub trait Engine: fmt::Display + Send + Sync {
    /// Creates a new synth.
    fn create_synth(&self) -> Result<SynthHandle, EngineError>;

    /// Destroys a synth and every zone attached to it. Unknown handles are ignored.
    fn destroy_synth(&self, synth: SynthHandle);

    /// Loads an audio file as a sample that plays at its recorded rate on `root_key`.
    fn load_sample(&self, path: &Path, root_key: u8) -> Result<SampleHandle, EngineError>;

    /// Frees a sample. Unknown handles are ignored.
    fn delete_sample(&self, sample: SampleHandle);

    /// Attaches a sample to a key range of the given bank and preset.
    fn bind(
        &self,
        synth: SynthHandle,
        sample: SampleHandle,
        bank: u16,
        preset: u8,
        lokey: u8,
        hikey: u8,
    ) -> Result<(), EngineError>;

    /// Detaches every key range of a sample from the given bank and preset.
    fn unbind(
        &self,
        synth: SynthHandle,
        sample: SampleHandle,
        bank: u16,
        preset: u8,
    ) -> Result<(), EngineError>;

    /// Loads a SoundFont file into the synth and returns its font id.
    fn load_soundfont(&self, synth: SynthHandle, path: &Path) -> Result<u32, EngineError>;
}

/// Creates the engine named in the settings.
pub fn get_engine(settings: &EngineSettings) -> Result<Arc<dyn Engine>, Box<dyn Error>> {
    let name = settings.engine();
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Engine::new(name)));
    }

    match name {
        "ram" => Ok(Arc::new(ram::Engine::new(
            settings.max_samples(),
            settings.sample_rate(),
        ))),
        _ => Err(format!("unknown engine {}", name).into()),
    }
}
