// pcm-wave -- Reading and writing canonical PCM wave files.
// Copyright (c) 2016 Kevin Brothaler and the riff-wave project authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Reading and writing canonical PCM wave files.
//!
//! This library handles the "canonical" wave file: a 44-byte header made of
//! the RIFF chunk header, a 16-byte "fmt " subchunk and a "data" subchunk
//! header, followed directly by the interleaved sample data. Samples are
//! exchanged with the caller as `f32` values in the range [-1.0, 1.0], one
//! sequence per channel. Mono and stereo files at 8, 16 and 32 bits per
//! sample are supported.
//!
//! Compressed formats (A-law, µ-law, IEEE float) are recognized by their
//! format code but are never decoded. Extra chunks such as `LIST` are not
//! recognized, and the whole sample payload is held in memory.
//!
//! # The wave file format
//!
//! Offset | Size | Data            | Description
//! -----: | ---: | --------------- | -----------------------------------------
//!      0 |    4 | "RIFF"          | Identifies the main chunk.
//!      4 |    4 | chunk size      | The size of the file minus 8 bytes.
//!      8 |    4 | "WAVE"          | Indicates that this is a wave file.
//!     12 |    4 | "fmt "          | Identifies the format subchunk.
//!     16 |    4 | subchunk size   | 16 for PCM.
//!     20 |    2 | format          | 1 for PCM, 6 for A-law, 7 for µ-law.
//!     22 |    2 | num channels    | 1 or 2.
//!     24 |    4 | sample rate     | Frames per second.
//!     28 |    4 | byte rate       | sample rate * num channels * bits per sample / 8
//!     32 |    2 | block align     | num channels * bits per sample / 8, the size of one frame.
//!     34 |    2 | bits per sample | 8, 16 or 32.
//!     36 |    4 | "data"          | Identifies the data subchunk.
//!     40 |    4 | subchunk size   | The length of the sample data in bytes.
//!     44 |  ... | audio data      | Interleaved frames, left channel first.
//!
//! All multi-byte fields are little-endian on disk.
//!
//! # Example
//!
//! ```no_run
//! use pcm_wave::{read_wave, write_wave};
//!
//! let left: Vec<f32> = (0..1000).map(|n| (n as f32 * 0.01).sin()).collect();
//! let right = left.clone();
//!
//! write_wave("tone.wav", &left, &right, 44100, 2, 16).unwrap();
//! let (read_left, read_right) = read_wave("tone.wav", 2, 44100, 16).unwrap();
//! assert_eq!(read_left.len(), read_right.len());
//! ```

use std::io;
use std::path::PathBuf;
use std::result;

use thiserror::Error;

// This is a helper macro that helps us validate results in our tests.
// Thank you bluss and durka42!
#[cfg(test)]
macro_rules! assert_matches {
    ($expected:pat $(if $guard:expr)*, $value:expr) => {
        match $value {
            $expected $(if $guard)* => {},
            ref actual => {
                panic!("assertion failed: `(left matches right)` (left: `{}`, right: `{:?}`",
                    stringify!($expected), actual);
            },
        }
    };
}

pub mod buffer;
pub mod endian;
pub mod header;
pub mod reader;
pub mod sample;
pub mod writer;

pub use buffer::AudioBuffer;
pub use endian::Endianness;
pub use header::{format_duration, AudioFormat, PcmFormat, WaveHeader, HEADER_SIZE};
pub use reader::{decode_wave, read_wave, DecodedWave};
pub use sample::BitDepth;
pub use writer::{write_wave, WaveWriter};

// MARK: Error types

/// Represents an error that occurred while reading or writing a wave file.
#[derive(Debug, Error)]
pub enum WaveError {
    /// The file to read does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// An IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The file does not start with a "RIFF" tag.
    #[error("not a RIFF file")]
    NotARiffFile,

    /// The file doesn't continue with "WAVE" after the RIFF chunk header.
    #[error("not a WAVE file")]
    NotAWaveFile,

    /// A subchunk other than the canonical "fmt " / "data" pair was found.
    #[error("unexpected chunk {:?}", String::from_utf8_lossy(.0))]
    UnexpectedChunk([u8; 4]),

    /// The "fmt " subchunk is too short to hold the PCM fields.
    #[error("fmt chunk is too short ({0} bytes)")]
    FmtChunkTooShort(u32),

    /// Only mono and stereo are supported.
    #[error("unsupported channel count {0}, only 1 or 2 channels are supported")]
    UnsupportedChannelCount(u16),

    /// The sample rate is zero, which is invalid.
    #[error("sample rate is zero")]
    SampleRateIsZero,

    /// The file is not uncompressed PCM.
    #[error("unsupported audio format {0} ({})", format_name(.0))]
    UnsupportedFormat(u16),

    /// Only 8-bit, 16-bit and 32-bit PCM is supported.
    #[error("unsupported bits per sample: {0}")]
    UnsupportedBitDepth(u16),

    /// The byte rate (sample rate * block align) doesn't fit the 32-bit header field.
    #[error("sample rate {sample_rate} is too high for {block_align}-byte frames")]
    SampleRateTooHigh {
        /// Frames per second requested.
        sample_rate: u32,
        /// Bytes per frame.
        block_align: u16,
    },

    /// The sample data is larger than the 32-bit RIFF size fields can describe.
    #[error("{0} bytes of sample data do not fit in a wave file")]
    DataTooLarge(u64),

    /// The block align doesn't split evenly into one sample per channel.
    #[error("block align {block_align} does not hold {num_channels} channels of {bits_per_sample}-bit samples")]
    MisalignedBlockSize {
        /// Bytes per frame, as read from the header.
        block_align: u16,
        /// Channels, as read from the header.
        num_channels: u16,
        /// Bits per sample, as read from the header.
        bits_per_sample: u16,
    },

    /// The data subchunk ends before the number of frames its size announces.
    #[error("truncated file: expected {expected} frames, found {actual}")]
    TruncatedFile {
        /// Frames announced by the data chunk size.
        expected: usize,
        /// Complete frames actually present.
        actual: usize,
    },

    /// Stereo channels of different lengths were passed to the writer.
    #[error("channel lengths differ: left has {left} samples, right has {right}")]
    ChannelLengthMismatch {
        /// Length of the left channel.
        left: usize,
        /// Length of the right channel.
        right: usize,
    },

    /// The audio buffer was resized after samples had been written to it.
    #[error("audio buffer already holds samples")]
    BufferAlreadyAllocated,

    /// The audio buffer has no room for another frame.
    #[error("audio buffer is full")]
    BufferFull,

    /// A frame was passed with a sample count that doesn't match the channel count.
    #[error("frame has {actual} samples, expected {expected}")]
    WrongFrameWidth {
        /// Channel count of the buffer.
        expected: usize,
        /// Samples in the frame.
        actual: usize,
    },
}

/// Represents a result when reading or writing a wave file.
pub type WaveResult<T> = result::Result<T, WaveError>;

fn format_name(code: &u16) -> &'static str {
    AudioFormat::from_code(*code).name()
}

/// Checks that the channel count is mono or stereo.
pub(crate) fn validate_num_channels(num_channels: u16) -> WaveResult<()> {
    match num_channels {
        1 | 2 => Ok(()),
        _ => Err(WaveError::UnsupportedChannelCount(num_channels)),
    }
}

// MARK: Tests
