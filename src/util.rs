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

use std::path::{Path, PathBuf};

/// Extracts a displayable file name from a path, returning a fallback if the name is unreadable.
pub fn filename_display(path: &Path) -> &str {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unreadable file name")
}

/// Resolves a file named in a configuration against the configuration's directory.
/// Absolute paths are returned as is.
pub fn resolve_path(base_path: &Path, file: &str) -> PathBuf {
    if Path::new(file).is_absolute() {
        PathBuf::from(file)
    } else {
        base_path.join(file)
    }
}

#[cfg(test)]
mod test {
    use std::path::{Path, PathBuf};

    use crate::util::{filename_display, resolve_path};

    #[test]
    fn test_filename_display() {
        assert_eq!("a.wav", filename_display(Path::new("/samples/a.wav")));
        assert_eq!(
            "[accord guitar].wav",
            filename_display(Path::new("[accord guitar].wav"))
        );
        assert_eq!("unreadable file name", filename_display(Path::new("/")));
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            PathBuf::from("/songs/guitar/a.wav"),
            resolve_path(Path::new("/songs/guitar"), "a.wav")
        );
        assert_eq!(
            PathBuf::from("/elsewhere/a.wav"),
            resolve_path(Path::new("/songs/guitar"), "/elsewhere/a.wav")
        );
    }
}
