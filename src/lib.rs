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

//! A sample-bank synthesizer.
//!
//! Samples are loaded into an [`engine::Engine`] through a [`samples::SampleStore`],
//! attached to key ranges of a MIDI bank and preset by a [`router::KeyRangeRouter`],
//! and owned together by a [`Synthesizer`] that releases everything when it closes.

pub mod config;
pub mod engine;
pub mod error;
pub mod router;
pub mod samples;
pub mod synth;
pub mod util;

#[cfg(test)]
mod testutil;

pub use error::{Error, ErrorKind};
pub use synth::{SynthState, Synthesizer};
