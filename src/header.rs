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

//! The canonical 44-byte wave header.

use std::convert::TryFrom;
use std::fmt;
use std::io;
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::sample::BitDepth;
use crate::{validate_num_channels, WaveError, WaveResult};

/// Size of the canonical header, up to and including the data chunk size.
pub const HEADER_SIZE: usize = 44;

/// Size of the header that follows the RIFF chunk size field, without any data:
/// "WAVE" (4) + "fmt " subchunk (8 + 16) + "data" subchunk header (8).
pub const RIFF_OVERHEAD: u32 = 36;

/// Largest data chunk whose RIFF chunk size still fits in 32 bits.
pub const MAX_DATA_SIZE: u32 = u32::MAX - RIFF_OVERHEAD;

/// Length of the "fmt " subchunk for PCM.
pub const PCM_FMT_LENGTH: u32 = 16;

pub const RIFF_TAG: &[u8; 4] = b"RIFF";
pub const WAVE_TAG: &[u8; 4] = b"WAVE";
pub const FMT_TAG: &[u8; 4] = b"fmt ";
pub const DATA_TAG: &[u8; 4] = b"data";

const FORMAT_PCM: u16 = 1;
const FORMAT_IEEE_FLOAT: u16 = 3;
const FORMAT_A_LAW: u16 = 6;
const FORMAT_MU_LAW: u16 = 7;

/// The format code stored in the "fmt " subchunk. Only `Pcm` can be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Pcm,
    IeeeFloat,
    ALaw,
    MuLaw,
    Other(u16),
}

impl AudioFormat {
    pub fn from_code(code: u16) -> AudioFormat {
        match code {
            FORMAT_PCM => AudioFormat::Pcm,
            FORMAT_IEEE_FLOAT => AudioFormat::IeeeFloat,
            FORMAT_A_LAW => AudioFormat::ALaw,
            FORMAT_MU_LAW => AudioFormat::MuLaw,
            other => AudioFormat::Other(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            AudioFormat::Pcm => FORMAT_PCM,
            AudioFormat::IeeeFloat => FORMAT_IEEE_FLOAT,
            AudioFormat::ALaw => FORMAT_A_LAW,
            AudioFormat::MuLaw => FORMAT_MU_LAW,
            AudioFormat::Other(code) => code,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AudioFormat::Pcm => "PCM",
            AudioFormat::IeeeFloat => "IEEE float",
            AudioFormat::ALaw => "A-law",
            AudioFormat::MuLaw => "Mu-law",
            AudioFormat::Other(_) => "unknown",
        }
    }
}

/// The parameters that describe a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub num_channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl PcmFormat {
    /// Checks that we can encode and decode this format, and returns the typed
    /// bit depth.
    pub fn validate(&self) -> WaveResult<BitDepth> {
        validate_num_channels(self.num_channels)?;
        if self.sample_rate == 0 {
            return Err(WaveError::SampleRateIsZero);
        }
        let depth = BitDepth::try_from(self.bits_per_sample)?;

        let block_align = self.num_channels * (depth.bits() / 8);
        if u32::MAX / u32::from(block_align) < self.sample_rate {
            return Err(WaveError::SampleRateTooHigh {
                sample_rate: self.sample_rate,
                block_align: block_align,
            });
        }
        Ok(depth)
    }
}

/// The canonical wave header. Fields are held in host order; they are only
/// little-endian in their serialized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveHeader {
    pub riff: [u8; 4],
    /// File size minus 8.
    pub overall_size: u32,
    pub wave: [u8; 4],
    pub fmt_marker: [u8; 4],
    pub fmt_length: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_marker: [u8; 4],
    /// Length of the sample data in bytes.
    pub data_size: u32,
}

impl WaveHeader {
    /// Builds a PCM header with an empty data chunk. The parameters are not
    /// validated here; see `PcmFormat::validate`. Derived fields that don't
    /// fit their header width saturate, which `is_consistent` reports.
    pub fn new(sample_rate: u32, num_channels: u16, bits_per_sample: u16) -> WaveHeader {
        let block_align = u32::from(num_channels) * u32::from(bits_per_sample) / 8;
        WaveHeader {
            riff: *RIFF_TAG,
            overall_size: RIFF_OVERHEAD,
            wave: *WAVE_TAG,
            fmt_marker: *FMT_TAG,
            fmt_length: PCM_FMT_LENGTH,
            audio_format: FORMAT_PCM,
            num_channels: num_channels,
            sample_rate: sample_rate,
            byte_rate: sample_rate.saturating_mul(block_align),
            block_align: u16::try_from(block_align).unwrap_or(u16::MAX),
            bits_per_sample: bits_per_sample,
            data_marker: *DATA_TAG,
            data_size: 0,
        }
    }

    pub fn from_format(format: &PcmFormat) -> WaveHeader {
        WaveHeader::new(format.sample_rate, format.num_channels, format.bits_per_sample)
    }

    pub fn pcm_format(&self) -> PcmFormat {
        PcmFormat {
            num_channels: self.num_channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
        }
    }

    pub fn format(&self) -> AudioFormat {
        AudioFormat::from_code(self.audio_format)
    }

    /// Sets the data chunk size, keeping the RIFF chunk size in step. Sizes
    /// above `MAX_DATA_SIZE` leave the RIFF chunk size pinned at `u32::MAX`.
    pub fn set_data_size(&mut self, data_size: u32) {
        self.data_size = data_size;
        self.overall_size = RIFF_OVERHEAD.saturating_add(data_size);
    }

    /// True if all four chunk markers hold their literal values.
    pub fn has_valid_markers(&self) -> bool {
        &self.riff == RIFF_TAG && &self.wave == WAVE_TAG && &self.fmt_marker == FMT_TAG &&
        &self.data_marker == DATA_TAG
    }

    /// True if the byte rate and block align agree with the other fields, and
    /// the data size is a whole number of frames.
    pub fn is_consistent(&self) -> bool {
        let block_align = u32::from(self.num_channels) * u32::from(self.bits_per_sample) / 8;
        block_align == u32::from(self.block_align) &&
        u64::from(self.byte_rate) == u64::from(self.sample_rate) * u64::from(block_align) &&
        (block_align == 0 || self.data_size % block_align == 0)
    }

    /// Bytes in one frame, as derived from the channel count and bit depth.
    pub fn bytes_per_frame(&self) -> usize {
        usize::from(self.num_channels) * usize::from(self.bits_per_sample) / 8
    }

    /// Number of frames in the data chunk.
    pub fn num_frames(&self) -> usize {
        let bits_per_frame = u64::from(self.num_channels) * u64::from(self.bits_per_sample);
        if bits_per_frame == 0 {
            0
        } else {
            (8 * u64::from(self.data_size) / bits_per_frame) as usize
        }
    }

    /// Approximate play time of the data chunk.
    pub fn duration_seconds(&self) -> f64 {
        if self.byte_rate == 0 {
            0.0
        } else {
            f64::from(self.data_size) / f64::from(self.byte_rate)
        }
    }

    /// Writes the header field by field, all numbers little-endian.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.riff)?;
        writer.write_u32::<LittleEndian>(self.overall_size)?;
        writer.write_all(&self.wave)?;
        writer.write_all(&self.fmt_marker)?;
        writer.write_u32::<LittleEndian>(self.fmt_length)?;
        writer.write_u16::<LittleEndian>(self.audio_format)?;
        writer.write_u16::<LittleEndian>(self.num_channels)?;
        writer.write_u32::<LittleEndian>(self.sample_rate)?;
        writer.write_u32::<LittleEndian>(self.byte_rate)?;
        writer.write_u16::<LittleEndian>(self.block_align)?;
        writer.write_u16::<LittleEndian>(self.bits_per_sample)?;
        writer.write_all(&self.data_marker)?;
        writer.write_u32::<LittleEndian>(self.data_size)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        let result = self.write_to(&mut &mut bytes[..]);
        debug_assert!(result.is_ok(), "header doesn't fit in {} bytes", HEADER_SIZE);
        bytes
    }
}

impl fmt::Display for WaveHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Wave File Header Info:")?;
        writeln!(f, "----------------------")?;
        writeln!(f, "1-4\t{}", String::from_utf8_lossy(&self.riff))?;
        writeln!(f,
                 "5-8\tOverall size: {} bytes ({:.2} KB)",
                 self.overall_size,
                 f64::from(self.overall_size) / 1024.0)?;
        writeln!(f, "9-12\tWave marker: {}", String::from_utf8_lossy(&self.wave))?;
        writeln!(f, "13-16\tFmt marker: {}", String::from_utf8_lossy(&self.fmt_marker))?;
        writeln!(f, "17-20\tLength of Fmt header: {}", self.fmt_length)?;
        writeln!(f, "21-22\tFormat type: {} ({})", self.audio_format, self.format().name())?;
        writeln!(f, "23-24\tChannels: {}", self.num_channels)?;
        writeln!(f, "25-28\tSample rate: {}", self.sample_rate)?;
        writeln!(f,
                 "29-32\tByte Rate: {}, Bit Rate: {}",
                 self.byte_rate,
                 u64::from(self.byte_rate) * 8)?;
        writeln!(f, "33-34\tBlock Alignment: {}", self.block_align)?;
        writeln!(f, "35-36\tBits per sample: {}", self.bits_per_sample)?;
        writeln!(f, "37-40\tData Marker: {}", String::from_utf8_lossy(&self.data_marker))?;
        writeln!(f, "41-44\tSize of data chunk: {}", self.data_size)?;
        writeln!(f)?;
        writeln!(f, "Number of samples: {}", self.num_frames())?;
        writeln!(f, "Size of each sample: {} bytes", self.bytes_per_frame())?;
        let duration = self.duration_seconds();
        writeln!(f, "Approx. duration in seconds: {:.6}", duration)?;
        write!(f, "Approx. duration in h:m:s: {}", format_duration(duration))
    }
}

/// Formats a number of seconds as `HH:MM:SS.mmm`.
pub fn format_duration(seconds: f64) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let millis = total_millis % 1000;
    let total_seconds = total_millis / 1000;
    format!("{:02}:{:02}:{:02}.{:03}",
            total_seconds / 3600,
            total_seconds / 60 % 60,
            total_seconds % 60,
            millis)
}

// MARK: Tests

#[cfg(test)]
mod tests {
    use super::{format_duration, AudioFormat, PcmFormat, WaveHeader, HEADER_SIZE, MAX_DATA_SIZE};
    use crate::sample::BitDepth;
    use crate::WaveError;

    #[test]
    fn test_new_header_fields() {
        let header = WaveHeader::new(44100, 2, 16);
        assert!(header.has_valid_markers());
        assert_eq!(36, header.overall_size);
        assert_eq!(16, header.fmt_length);
        assert_eq!(1, header.audio_format);
        assert_eq!(176400, header.byte_rate);
        assert_eq!(4, header.block_align);
        assert_eq!(0, header.data_size);
        assert_eq!(AudioFormat::Pcm, header.format());
    }

    #[test]
    fn test_header_arithmetic_for_supported_formats() {
        for &sample_rate in &[8000u32, 22050, 44100, 48000, 96000] {
            for &num_channels in &[1u16, 2] {
                for &bits_per_sample in &[8u16, 16, 32] {
                    let header = WaveHeader::new(sample_rate, num_channels, bits_per_sample);
                    let frame = u32::from(num_channels) * u32::from(bits_per_sample) / 8;
                    assert_eq!(sample_rate * frame, header.byte_rate);
                    assert_eq!(frame, u32::from(header.block_align));
                    assert!(header.is_consistent());
                }
            }
        }
    }

    #[test]
    fn test_set_data_size_updates_overall_size() {
        let mut header = WaveHeader::new(44100, 2, 32);
        header.set_data_size(8000);
        assert_eq!(8000, header.data_size);
        assert_eq!(8036, header.overall_size);
        assert_eq!(1000, header.num_frames());
    }

    #[test]
    fn test_set_data_size_at_limit() {
        let mut header = WaveHeader::new(8000, 1, 8);
        header.set_data_size(MAX_DATA_SIZE);
        assert_eq!(u32::MAX, header.overall_size);
        assert_eq!(MAX_DATA_SIZE as usize, header.num_frames());

        header.set_data_size(u32::MAX);
        assert_eq!(u32::MAX, header.overall_size);
        assert_eq!(u32::MAX, header.data_size);
    }

    #[test]
    fn test_new_header_saturates_unvalidated_fields() {
        let header = WaveHeader::new(44100, 3000, 32);
        assert_eq!(12000, header.block_align);
        assert_eq!(529_200_000, header.byte_rate);
        assert_matches!(Err(WaveError::UnsupportedChannelCount(3000)), header.pcm_format().validate());

        let header = WaveHeader::new(44100, u16::MAX, u16::MAX);
        assert_eq!(u16::MAX, header.block_align);
        assert!(!header.is_consistent());

        let header = WaveHeader::new(600_000_000, 2, 32);
        assert_eq!(u32::MAX, header.byte_rate);
        assert!(!header.is_consistent());
    }

    #[test]
    fn test_inconsistent_header() {
        let mut header = WaveHeader::new(44100, 2, 16);
        header.set_data_size(6);
        assert!(!header.is_consistent());

        let mut header = WaveHeader::new(44100, 2, 16);
        header.byte_rate = 1;
        assert!(!header.is_consistent());
    }

    #[test]
    fn test_serialized_layout() {
        let mut header = WaveHeader::new(44100, 1, 16);
        header.set_data_size(4);
        let bytes = header.to_bytes();

        assert_eq!(HEADER_SIZE, bytes.len());
        assert_eq!(&b"RIFF\x28\x00\x00\x00WAVEfmt \x10\x00\x00\x00"[..], &bytes[0..20]);
        assert_eq!(&b"\x01\x00\x01\x00\x44\xAC\x00\x00\x88\x58\x01\x00\x02\x00\x10\x00"[..],
                   &bytes[20..36]);
        assert_eq!(&b"data\x04\x00\x00\x00"[..], &bytes[36..44]);
    }

    #[test]
    fn test_serializing_leaves_header_in_host_order() {
        let header = WaveHeader::new(48000, 2, 32);
        let before = header.clone();
        let _ = header.to_bytes();
        assert_eq!(before, header);
    }

    #[test]
    fn test_validate_pcm_format() {
        let format = PcmFormat { num_channels: 2, sample_rate: 44100, bits_per_sample: 16 };
        assert_matches!(Ok(BitDepth::Sixteen), format.validate());

        let format = PcmFormat { num_channels: 3, sample_rate: 44100, bits_per_sample: 16 };
        assert_matches!(Err(WaveError::UnsupportedChannelCount(3)), format.validate());

        let format = PcmFormat { num_channels: 1, sample_rate: 0, bits_per_sample: 16 };
        assert_matches!(Err(WaveError::SampleRateIsZero), format.validate());

        let format = PcmFormat { num_channels: 1, sample_rate: 44100, bits_per_sample: 24 };
        assert_matches!(Err(WaveError::UnsupportedBitDepth(24)), format.validate());

        let format = PcmFormat { num_channels: 2, sample_rate: 600_000_000, bits_per_sample: 32 };
        assert_matches!(Err(WaveError::SampleRateTooHigh { sample_rate: 600_000_000, block_align: 8 }),
                        format.validate());
    }

    #[test]
    fn test_validate_highest_sample_rate() {
        let highest = u32::MAX / 8;
        let format = PcmFormat { num_channels: 2, sample_rate: highest, bits_per_sample: 32 };
        assert_matches!(Ok(BitDepth::ThirtyTwo), format.validate());

        let header = WaveHeader::from_format(&format);
        assert_eq!(highest * 8, header.byte_rate);
        assert!(header.is_consistent());

        let format = PcmFormat { num_channels: 2, sample_rate: highest + 1, bits_per_sample: 32 };
        assert_matches!(Err(WaveError::SampleRateTooHigh { block_align: 8, .. }), format.validate());

        let format = PcmFormat { num_channels: 1, sample_rate: u32::MAX, bits_per_sample: 8 };
        assert_matches!(Ok(BitDepth::Eight), format.validate());
        assert_eq!(u32::MAX, WaveHeader::from_format(&format).byte_rate);
    }

    #[test]
    fn test_audio_format_names() {
        assert_eq!("PCM", AudioFormat::from_code(1).name());
        assert_eq!("A-law", AudioFormat::from_code(6).name());
        assert_eq!("Mu-law", AudioFormat::from_code(7).name());
        assert_eq!(AudioFormat::Other(12345), AudioFormat::from_code(12345));
        assert_eq!(7, AudioFormat::MuLaw.code());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!("00:00:00.000", format_duration(0.0));
        assert_eq!("00:00:01.500", format_duration(1.5));
        assert_eq!("01:01:01.250", format_duration(3661.25));
        assert_eq!("00:01:00.000", format_duration(59.9999));
    }

    #[test]
    fn test_display_dumps_fields() {
        let mut header = WaveHeader::new(44100, 2, 16);
        header.set_data_size(176400);
        let dump = header.to_string();
        assert!(dump.contains("Format type: 1 (PCM)"));
        assert!(dump.contains("Number of samples: 44100"));
        assert!(dump.contains("Approx. duration in h:m:s: 00:00:01.000"));
    }
}
