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

//! Fixture files for tests.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};

/// Writes an integer PCM WAV file with the given interleaved samples.
pub fn write_wav(
    path: &Path,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    samples: &[i32],
) -> Result<(), Box<dyn Error>> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Writes a mono 32-bit float WAV file.
pub fn write_float_wav(path: &Path, sample_rate: u32, samples: &[f32]) -> Result<(), Box<dyn Error>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Writes a mono 16-bit 44.1kHz ramp of `frames` samples into `dir` and returns its path.
pub fn write_mono_wav(dir: &Path, name: &str, frames: usize) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.join(name);
    let samples: Vec<i32> = (0..frames).map(|i| (i % 1000) as i32 * 16).collect();
    write_wav(&path, 1, 44100, 16, &samples)?;
    Ok(path)
}

/// Writes a minimal RIFF `sfbk` container.
pub fn write_soundfont(path: &Path) -> Result<(), Box<dyn Error>> {
    let mut data = Vec::new();
    data.extend_from_slice(b"RIFF");
    data.extend_from_slice(&4u32.to_le_bytes());
    data.extend_from_slice(b"sfbk");
    fs::write(path, data)?;
    Ok(())
}
