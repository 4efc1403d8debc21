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
use serde::{Deserialize, Serialize};

use crate::engine::ram::{DEFAULT_MAX_SAMPLES, DEFAULT_SAMPLE_RATE};
use crate::router::OverlapPolicy;

/// A YAML representation of the engine settings.
#[derive(Deserialize, Clone, Serialize, Debug, PartialEq)]
pub struct EngineSettings {
    /// The engine to use: "ram", or anything starting with "mock".
    #[serde(default = "default_engine")]
    name: String,

    /// The number of sample slots.
    #[serde(default = "default_max_samples")]
    max_samples: usize,

    /// The sample rate every loaded sample must have.
    #[serde(default = "default_sample_rate")]
    sample_rate: u32,

    /// What to do with overlapping key ranges.
    #[serde(default)]
    overlap: OverlapPolicy,
}

fn default_engine() -> String {
    "ram".to_string()
}

fn default_max_samples() -> usize {
    DEFAULT_MAX_SAMPLES
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            name: default_engine(),
            max_samples: DEFAULT_MAX_SAMPLES,
            sample_rate: DEFAULT_SAMPLE_RATE,
            overlap: OverlapPolicy::default(),
        }
    }
}

impl EngineSettings {
    /// Default settings for the named engine.
    pub fn with_engine(name: &str) -> EngineSettings {
        EngineSettings {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Gets the engine name.
    pub fn engine(&self) -> &str {
        &self.name
    }

    /// Gets the number of sample slots.
    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Gets the required sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Gets the overlap policy.
    pub fn overlap(&self) -> OverlapPolicy {
        self.overlap
    }
}
