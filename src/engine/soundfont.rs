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
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::{DecodeError, EngineError};

/// Checks that the file at `path` is a RIFF container of form type `sfbk`.
/// The chunks inside are not read.
pub(super) fn check_header(path: &Path) -> Result<(), EngineError> {
    let mut file = File::open(path).map_err(|e| DecodeError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut header = [0u8; 12];
    if file.read_exact(&mut header).is_err() {
        return Err(EngineError::InvalidSoundFont(
            "file is too short".to_string(),
        ));
    }

    if &header[0..4] != b"RIFF" {
        return Err(EngineError::InvalidSoundFont(
            "missing RIFF header".to_string(),
        ));
    }
    if &header[8..12] != b"sfbk" {
        return Err(EngineError::InvalidSoundFont(format!(
            "unexpected form type {:?}",
            String::from_utf8_lossy(&header[8..12])
        )));
    }

    Ok(())
}
