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

//! Decodes audio files into interleaved 16-bit PCM.
//!
//! WAV files are read with hound. Everything else goes through symphonia.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, warn};

/// Error types for audio decoding.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unable to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("audio file error: {0}")]
    Audio(#[from] SymphoniaError),

    #[error("no audio track found")]
    NoAudioTrack,

    #[error("sample rate not specified")]
    UnknownSampleRate,

    #[error("unsupported sample width of {0} bits")]
    UnsupportedBits(u16),
}

/// Fully decoded audio.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub channels: u16,
    pub sample_rate: u32,
    /// Interleaved samples.
    pub data: Vec<i16>,
}

impl DecodedAudio {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.data.len() / self.channels as usize
    }
}

/// Decodes the whole file at `path`, detecting the format from its extension.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, DecodeError> {
    let file = File::open(path).map_err(|e| DecodeError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

    if is_wav {
        decode_wav(file)
    } else {
        decode_with_symphonia(file, path)
    }
}

fn decode_wav(file: File) -> Result<DecodedAudio, DecodeError> {
    let mut reader = hound::WavReader::new(BufReader::new(file))?;
    let spec = reader.spec();
    debug!(
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        "Decoding WAV"
    );

    let data = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(float_to_i16))
            .collect::<Result<Vec<i16>, hound::Error>>()?,
        hound::SampleFormat::Int if spec.bits_per_sample <= 16 => {
            // 8-bit samples come back centered on zero; widen them to 16 bits.
            let shift = 16 - spec.bits_per_sample;
            reader
                .samples::<i16>()
                .map(|s| s.map(|s| s << shift))
                .collect::<Result<Vec<i16>, hound::Error>>()?
        }
        hound::SampleFormat::Int if spec.bits_per_sample <= 32 => {
            let shift = spec.bits_per_sample - 16;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| (s >> shift) as i16))
                .collect::<Result<Vec<i16>, hound::Error>>()?
        }
        hound::SampleFormat::Int => {
            return Err(DecodeError::UnsupportedBits(spec.bits_per_sample))
        }
    };

    Ok(DecodedAudio {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        data,
    })
}

fn float_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

fn decode_with_symphonia(file: File, path: &Path) -> Result<DecodedAudio, DecodeError> {
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let sample_rate = params.sample_rate.ok_or(DecodeError::UnknownSampleRate)?;
    let mut channels = params.channels.map(|c| c.count() as u16).unwrap_or(0);
    let mut decoder = get_codecs().make(&params, &DecoderOptions::default())?;

    let mut data = Vec::new();
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(path = ?path, error = e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        channels = spec.channels.count() as u16;
        let mut buffer = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        data.extend_from_slice(buffer.samples());
    }

    if channels == 0 {
        return Err(DecodeError::NoAudioTrack);
    }

    Ok(DecodedAudio {
        channels,
        sample_rate,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{write_float_wav, write_wav};

    #[test]
    fn test_decode_16_bit_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 1, 44100, 16, &[0, 1000, -1000, i16::MAX as i32]).unwrap();

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.data, vec![0, 1000, -1000, i16::MAX]);
        assert_eq!(decoded.frames(), 4);
    }

    #[test]
    fn test_decode_24_bit_wav_is_narrowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.wav");
        write_wav(&path, 2, 48000, 24, &[256, -256, 8_388_607, -8_388_608]).unwrap();

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.sample_rate, 48000);
        assert_eq!(decoded.data, vec![1, -1, i16::MAX, i16::MIN]);
        assert_eq!(decoded.frames(), 2);
    }

    #[test]
    fn test_decode_float_wav_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        write_float_wav(&path, 44100, &[0.0, 0.5, 2.0, -2.0]).unwrap();

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.data[0], 0);
        assert_eq!(decoded.data[1], (0.5 * i16::MAX as f32) as i16);
        assert_eq!(decoded.data[2], i16::MAX);
        assert_eq!(decoded.data[3], -i16::MAX);
    }

    #[test]
    fn test_decode_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = decode_file(&dir.path().join("missing.wav")).unwrap_err();
        assert!(matches!(err, DecodeError::Io { .. }));
        assert!(err.to_string().contains("missing.wav"));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("garbage.wav");
        std::fs::write(&wav, b"definitely not audio").unwrap();
        assert!(matches!(decode_file(&wav), Err(DecodeError::Wav(_))));

        let flac = dir.path().join("garbage.flac");
        std::fs::write(&flac, b"definitely not audio").unwrap();
        assert!(matches!(decode_file(&flac), Err(DecodeError::Audio(_))));
    }
}
