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

//! Errors surfaced by the sample store, router and synthesizer.
//!
//! Every failure reported by an [`Engine`](crate::engine::Engine) is converted
//! into one of these kinds at the call site and returned immediately.

use std::fmt;
use std::path::PathBuf;

use crate::engine::{EngineError, SampleHandle};
use crate::synth::SynthState;

/// The broad category of an [`Error`], for callers that only care about the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Init,
    Load,
    Bind,
    InvalidArgument,
    InvalidState,
    NotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Init => "init",
            ErrorKind::Load => "load",
            ErrorKind::Bind => "bind",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::InvalidState => "invalid state",
            ErrorKind::NotFound => "not found",
        };
        f.write_str(name)
    }
}

/// Why a key range could not be attached.
#[derive(Debug, thiserror::Error)]
pub enum BindFailure {
    #[error("overlaps keys {lokey}-{hikey} already bound to sample {sample}")]
    Overlap {
        sample: SampleHandle,
        lokey: u8,
        hikey: u8,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("synthesizer initialization failed: {0}")]
    Init(#[source] EngineError),

    #[error("failed to load {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("failed to bind sample {sample} to bank {bank}, preset {preset}, keys {lokey}-{hikey}: {reason}")]
    Bind {
        sample: SampleHandle,
        bank: u16,
        preset: u8,
        lokey: u8,
        hikey: u8,
        #[source]
        reason: BindFailure,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("synthesizer is {0}")]
    InvalidState(SynthState),

    #[error("not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Init(_) => ErrorKind::Init,
            Error::Load { .. } => ErrorKind::Load,
            Error::Bind { .. } => ErrorKind::Bind,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::InvalidState(_) => ErrorKind::InvalidState,
            Error::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// Highest valid MIDI key, root key or preset number.
pub const MAX_KEY: u8 = 127;

/// Highest valid 14-bit MIDI bank number.
pub const MAX_BANK: u16 = 16383;

/// Rejects keys outside of [0, 127].
pub(crate) fn check_key(what: &str, key: u8) -> Result<(), Error> {
    if key > MAX_KEY {
        return Err(Error::InvalidArgument(format!(
            "{} {} is outside of 0-{}",
            what, key, MAX_KEY
        )));
    }
    Ok(())
}

/// Rejects bank/preset pairs outside of the MIDI ranges.
pub(crate) fn check_program(bank: u16, preset: u8) -> Result<(), Error> {
    if bank > MAX_BANK {
        return Err(Error::InvalidArgument(format!(
            "bank {} is outside of 0-{}",
            bank, MAX_BANK
        )));
    }
    check_key("preset", preset)
}
