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

//! Conversion between `f32` samples in [-1.0, 1.0] and PCM words.
//!
//! 16-bit and 32-bit samples are signed and centered on zero: the float is
//! scaled by the largest positive value and truncated. 8-bit samples are
//! stored unsigned and centered on 127, so that -1.0, 0.0 and 1.0 become 0,
//! 127 and 254. Note that this is one below the usual 8-bit midpoint of 128;
//! decoding removes the same offset, so files written here read back
//! correctly.

use std::convert::TryFrom;

use byteorder::{ByteOrder, LittleEndian};

use crate::endian;
use crate::{WaveError, WaveResult};

const EIGHT_BIT_CENTER: f64 = 127.0;

/// A supported PCM word size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    Eight,
    Sixteen,
    ThirtyTwo,
}

impl TryFrom<u16> for BitDepth {
    type Error = WaveError;

    fn try_from(bits_per_sample: u16) -> WaveResult<BitDepth> {
        match bits_per_sample {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            32 => Ok(BitDepth::ThirtyTwo),
            _ => Err(WaveError::UnsupportedBitDepth(bits_per_sample)),
        }
    }
}

impl BitDepth {
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
            BitDepth::ThirtyTwo => 32,
        }
    }

    /// Bytes taken by one sample of one channel.
    pub fn bytes(self) -> usize {
        usize::from(self.bits() / 8)
    }

    /// The divisor that maps a decoded word back to [-1.0, 1.0]:
    /// 2^(bits - 1) - 1.
    pub fn full_scale(self) -> f64 {
        match self {
            BitDepth::Eight => f64::from(i8::max_value()),
            BitDepth::Sixteen => f64::from(i16::max_value()),
            BitDepth::ThirtyTwo => f64::from(i32::max_value()),
        }
    }

    /// The inclusive range a decoded word must fall in.
    pub fn limits(self) -> (i64, i64) {
        match self {
            BitDepth::Eight => (i64::from(i8::min_value()), i64::from(i8::max_value())),
            BitDepth::Sixteen => (i64::from(i16::min_value()), i64::from(i16::max_value())),
            BitDepth::ThirtyTwo => (i64::from(i32::min_value()), i64::from(i32::max_value())),
        }
    }
}

/// Saturates a sample to [-1.0, 1.0].
pub fn clamp(sample: f32) -> f32 {
    sample.max(-1.0).min(1.0)
}

/// Encodes one sample into `dest`, little-endian, which must be exactly
/// `depth.bytes()` long. The sample is expected to be clamped already;
/// anything outside [-1.0, 1.0] saturates at the word limits.
pub fn encode_sample(depth: BitDepth, sample: f32, dest: &mut [u8]) {
    let scaled = depth.full_scale() * f64::from(sample);
    match depth {
        BitDepth::Eight => {
            dest[0] = (EIGHT_BIT_CENTER + scaled).round() as u8;
        }
        BitDepth::Sixteen => {
            let mut word = (scaled as i16).to_ne_bytes();
            endian::to_little_endian(&mut word);
            dest.copy_from_slice(&word);
        }
        BitDepth::ThirtyTwo => {
            let mut word = (scaled as i32).to_ne_bytes();
            endian::to_little_endian(&mut word);
            dest.copy_from_slice(&word);
        }
    }
}

/// Reads the little-endian word at the start of `src` as a signed integer.
/// For 8-bit samples this is the stored byte minus the 127 center.
pub fn decode_raw(depth: BitDepth, src: &[u8]) -> i64 {
    match depth {
        BitDepth::Eight => i64::from(src[0]) - EIGHT_BIT_CENTER as i64,
        BitDepth::Sixteen => i64::from(LittleEndian::read_i16(src)),
        BitDepth::ThirtyTwo => i64::from(LittleEndian::read_i32(src)),
    }
}

/// True if a decoded word lies inside the range of its bit depth.
pub fn is_in_range(depth: BitDepth, raw: i64) -> bool {
    let (low, high) = depth.limits();
    raw >= low && raw <= high
}

/// Scales a decoded word back to approximately [-1.0, 1.0].
pub fn raw_to_float(depth: BitDepth, raw: i64) -> f32 {
    (raw as f64 / depth.full_scale()) as f32
}

pub fn decode_sample(depth: BitDepth, src: &[u8]) -> f32 {
    raw_to_float(depth, decode_raw(depth, src))
}

// MARK: Tests
