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

use std::convert::TryFrom;
use std::fs::File;
use std::io;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, warn};

use crate::header::{AudioFormat, WaveHeader, DATA_TAG, FMT_TAG, PCM_FMT_LENGTH, RIFF_TAG, WAVE_TAG};
use crate::sample::{self, BitDepth};
use crate::{validate_num_channels, WaveError, WaveResult};

/// The result of decoding a wave file.
#[derive(Debug, Clone)]
pub struct DecodedWave {
    /// The header as read from the file, in host order.
    pub header: WaveHeader,
    /// Samples of the first channel.
    pub left: Vec<f32>,
    /// Samples of the second channel, or silence for mono files. Always the
    /// same length as `left`.
    pub right: Vec<f32>,
    /// How many decoded words fell outside the range of the bit depth.
    pub out_of_range: usize,
}

// Upper bound on the payload buffer reserved up front. The data chunk size
// comes from the file, so anything beyond this grows as bytes actually arrive.
const MAX_PREALLOCATION: usize = 1 << 20;

// MARK: Validation and parsing functions

fn validate_fmt_length(fmt_length: u32) -> WaveResult<()> {
    if fmt_length < PCM_FMT_LENGTH {
        Err(WaveError::FmtChunkTooShort(fmt_length))
    } else {
        Ok(())
    }
}

/// Checks the header fields that decoding depends on, returning the bit depth.
fn validate_header(header: &WaveHeader) -> WaveResult<BitDepth> {
    validate_num_channels(header.num_channels)?;
    if header.sample_rate == 0 {
        return Err(WaveError::SampleRateIsZero);
    }
    if header.format() != AudioFormat::Pcm {
        return Err(WaveError::UnsupportedFormat(header.audio_format));
    }
    let depth = BitDepth::try_from(header.bits_per_sample)?;

    let misaligned = WaveError::MisalignedBlockSize {
        block_align: header.block_align,
        num_channels: header.num_channels,
        bits_per_sample: header.bits_per_sample,
    };
    if header.block_align % header.num_channels != 0 {
        return Err(misaligned);
    }
    let bytes_per_channel = usize::from(header.block_align / header.num_channels);
    if bytes_per_channel != depth.bytes() {
        return Err(misaligned);
    }

    Ok(depth)
}

trait ReadWaveExt: Read + Sized {
    /// Reads the canonical header field by field.
    fn read_wave_header(&mut self) -> WaveResult<WaveHeader> {
        let riff = self.read_tag()?;
        if &riff != RIFF_TAG {
            return Err(WaveError::NotARiffFile);
        }
        // The RIFF size isn't validated, so that files with an incorrect
        // chunk size can still be read.
        let overall_size = self.read_u32::<LittleEndian>()?;
        let wave = self.read_tag()?;
        if &wave != WAVE_TAG {
            return Err(WaveError::NotAWaveFile);
        }

        let fmt_marker = self.read_expected_tag(FMT_TAG)?;
        let fmt_length = self.read_u32::<LittleEndian>()?;
        validate_fmt_length(fmt_length)?;
        let audio_format = self.read_u16::<LittleEndian>()?;
        let num_channels = self.read_u16::<LittleEndian>()?;
        let sample_rate = self.read_u32::<LittleEndian>()?;
        let byte_rate = self.read_u32::<LittleEndian>()?;
        let block_align = self.read_u16::<LittleEndian>()?;
        let bits_per_sample = self.read_u16::<LittleEndian>()?;
        // Skip over the rest of the fmt subchunk, if present.
        self.skip_bytes(u64::from(fmt_length - PCM_FMT_LENGTH))?;

        let data_marker = self.read_expected_tag(DATA_TAG)?;
        let data_size = self.read_u32::<LittleEndian>()?;

        Ok(WaveHeader {
            riff: riff,
            overall_size: overall_size,
            wave: wave,
            fmt_marker: fmt_marker,
            fmt_length: fmt_length,
            audio_format: audio_format,
            num_channels: num_channels,
            sample_rate: sample_rate,
            byte_rate: byte_rate,
            block_align: block_align,
            bits_per_sample: bits_per_sample,
            data_marker: data_marker,
            data_size: data_size,
        })
    }

    fn read_tag(&mut self) -> io::Result<[u8; 4]> {
        let mut tag: [u8; 4] = [0; 4];
        self.read_exact(&mut tag)?;
        Ok(tag)
    }

    fn read_expected_tag(&mut self, expected_tag: &[u8; 4]) -> WaveResult<[u8; 4]> {
        let tag = self.read_tag()?;
        if &tag != expected_tag {
            return Err(WaveError::UnexpectedChunk(tag));
        }
        Ok(tag)
    }

    fn skip_bytes(&mut self, count: u64) -> io::Result<()> {
        let skipped = io::copy(&mut self.by_ref().take(count), &mut io::sink())?;
        if skipped < count {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "fmt chunk ends early"));
        }
        Ok(())
    }
}

impl<T> ReadWaveExt for T where T: Read + Sized {}

// MARK: Decoding

/// Decodes a whole wave stream into per-channel samples.
///
/// Structural problems abort the decode. Words outside the range of their bit
/// depth are logged and counted, and decoding carries on.
pub fn decode_wave<R: Read>(mut reader: R) -> WaveResult<DecodedWave> {
    let header = reader.read_wave_header()?;
    let depth = validate_header(&header)?;
    debug!("decoding {} channel(s) of {}-bit PCM at {} Hz, {} data bytes",
           header.num_channels,
           header.bits_per_sample,
           header.sample_rate,
           header.data_size);

    let frame_size = usize::from(header.block_align);
    let num_frames = header.num_frames();
    let expected_bytes = num_frames * frame_size;

    let mut payload = Vec::with_capacity(expected_bytes.min(MAX_PREALLOCATION));
    reader.take(expected_bytes as u64).read_to_end(&mut payload)?;
    if payload.len() < expected_bytes {
        return Err(WaveError::TruncatedFile {
            expected: num_frames,
            actual: payload.len() / frame_size,
        });
    }

    let mut left = vec![0.0; num_frames];
    let mut right = vec![0.0; num_frames];
    let mut out_of_range = 0;
    let width = depth.bytes();

    for (index, frame) in payload.chunks_exact(frame_size).enumerate() {
        for (channel, word) in frame.chunks_exact(width).enumerate() {
            let raw = sample::decode_raw(depth, word);
            if !sample::is_in_range(depth, raw) {
                warn!("sample {} of channel {} is out of range: {}", index, channel, raw);
                out_of_range += 1;
            }
            let value = sample::raw_to_float(depth, raw);
            if channel == 0 {
                left[index] = value;
            } else {
                right[index] = value;
            }
        }
    }

    Ok(DecodedWave {
        header: header,
        left: left,
        right: right,
        out_of_range: out_of_range,
    })
}

/// Reads a mono or stereo PCM wave file into left and right channel samples.
///
/// `num_channels` must be 1 or 2. The header in the file is authoritative; a
/// file whose sample rate or bit depth differs from the ones given is still
/// decoded, with a warning.
pub fn read_wave<P: AsRef<Path>>(path: P,
                                 num_channels: u16,
                                 sample_rate: u32,
                                 bits_per_sample: u16)
                                 -> WaveResult<(Vec<f32>, Vec<f32>)> {
    validate_num_channels(num_channels)?;

    let path = path.as_ref();
    let file = File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => WaveError::FileNotFound(path.to_path_buf()),
            _ => WaveError::Io(err),
        })?;

    let decoded = decode_wave(BufReader::new(file))?;
    let header = &decoded.header;
    if header.num_channels != num_channels {
        warn!("{}: expected {} channel(s), file has {}",
              path.display(),
              num_channels,
              header.num_channels);
    }
    if header.sample_rate != sample_rate {
        warn!("{}: expected {} Hz, file has {} Hz",
              path.display(),
              sample_rate,
              header.sample_rate);
    }
    if header.bits_per_sample != bits_per_sample {
        warn!("{}: expected {} bits per sample, file has {}",
              path.display(),
              bits_per_sample,
              header.bits_per_sample);
    }

    Ok((decoded.left, decoded.right))
}

// MARK: Tests

#[cfg(test)]
mod tests {
    use std::io;
    use std::io::Cursor;

    use super::{decode_wave, validate_fmt_length, validate_header, ReadWaveExt};
    use crate::header::WaveHeader;
    use crate::sample::BitDepth;
    use crate::WaveError;

    fn wave_bytes(num_channels: u16, bits_per_sample: u16, data: &[u8]) -> Vec<u8> {
        let mut header = WaveHeader::new(44100, num_channels, bits_per_sample);
        header.set_data_size(data.len() as u32);
        let mut vec = header.to_bytes().to_vec();
        vec.extend_from_slice(data);
        vec
    }

    // Header parsing tests

    #[test]
    fn test_read_wave_header_8bit_mono_example() {
        let mut data = Cursor::new(b"RIFF\x24\x00\x00\x00WAVE\
                                     fmt \x10\x00\x00\x00\
                                     \x01\x00\
                                     \x01\x00\
                                     \x44\xAC\x00\x00\
                                     \x44\xAC\x00\x00\
                                     \x01\x00\
                                     \x08\x00\
                                     data\x00\x00\x00\x00" as &[u8]);
        let header = data.read_wave_header().unwrap();
        assert_eq!(WaveHeader::new(44100, 1, 8), header);
    }

    #[test]
    fn test_read_wave_header_err_not_riff() {
        let mut data = Cursor::new(b"JPEG    WAVE");
        assert_matches!(Err(WaveError::NotARiffFile), data.read_wave_header());
    }

    #[test]
    fn test_read_wave_header_err_not_wave() {
        let mut data = Cursor::new(b"RIFF    WAV ");
        assert_matches!(Err(WaveError::NotAWaveFile), data.read_wave_header());
    }

    #[test]
    fn test_read_wave_header_missing_fmt_chunk() {
        let mut data = Cursor::new(b"RIFF    WAVE");
        assert_matches!(Err(WaveError::Io(ref err)) if err.kind() == io::ErrorKind::UnexpectedEof,
                        data.read_wave_header());
    }

    #[test]
    fn test_read_wave_header_rejects_other_chunks() {
        let mut data = Cursor::new(b"RIFF    WAVELIST\x04\x00\x00\x00INFO");
        assert_matches!(Err(WaveError::UnexpectedChunk(ref tag)) if tag == b"LIST",
                        data.read_wave_header());
    }

    #[test]
    fn test_read_wave_header_fmt_chunk_too_small() {
        let mut data = Cursor::new(b"RIFF    WAVE\
                                     fmt \x0E\x00\x00\x00\
                                     \x01\x00");
        assert_matches!(Err(WaveError::FmtChunkTooShort(14)), data.read_wave_header());
    }

    #[test]
    fn test_read_wave_header_skips_extra_fmt_bytes() {
        let mut data = Cursor::new(b"RIFF\x26\x00\x00\x00WAVE\
                                     fmt \x12\x00\x00\x00\
                                     \x01\x00\
                                     \x01\x00\
                                     \x44\xAC\x00\x00\
                                     \x44\xAC\x00\x00\
                                     \x01\x00\
                                     \x08\x00\
                                     \x00\x00\
                                     data\x00\x00\x00\x00" as &[u8]);
        let header = data.read_wave_header().unwrap();
        assert_eq!(18, header.fmt_length);
        assert_eq!(0, header.data_size);
    }

    #[test]
    fn test_read_wave_header_fmt_chunk_ends_early() {
        let mut data = Cursor::new(b"RIFF\x26\x00\x00\x00WAVE\
                                     fmt \x14\x00\x00\x00\
                                     \x01\x00\
                                     \x01\x00\
                                     \x44\xAC\x00\x00\
                                     \x44\xAC\x00\x00\
                                     \x01\x00\
                                     \x08\x00\
                                     \x00\x00" as &[u8]);
        assert_matches!(Err(WaveError::Io(ref err)) if err.kind() == io::ErrorKind::UnexpectedEof,
                        data.read_wave_header());
    }

    #[test]
    fn test_validate_fmt_length() {
        assert_matches!(Ok(()), validate_fmt_length(16));
        assert_matches!(Ok(()), validate_fmt_length(18));
        assert_matches!(Err(WaveError::FmtChunkTooShort(12)), validate_fmt_length(12));
    }

    // Header validation tests

    #[test]
    fn test_validate_header_ok() {
        assert_matches!(Ok(BitDepth::Sixteen), validate_header(&WaveHeader::new(44100, 2, 16)));
        assert_matches!(Ok(BitDepth::Eight), validate_header(&WaveHeader::new(8000, 1, 8)));
    }

    #[test]
    fn test_validate_header_channel_counts() {
        assert_matches!(Err(WaveError::UnsupportedChannelCount(0)),
                        validate_header(&WaveHeader::new(44100, 0, 16)));
        assert_matches!(Err(WaveError::UnsupportedChannelCount(3)),
                        validate_header(&WaveHeader::new(44100, 3, 16)));
    }

    #[test]
    fn test_validate_header_non_pcm() {
        let mut header = WaveHeader::new(44100, 1, 8);
        header.audio_format = 7;
        assert_matches!(Err(WaveError::UnsupportedFormat(7)), validate_header(&header));
    }

    #[test]
    fn test_validate_header_bit_depth() {
        assert_matches!(Err(WaveError::UnsupportedBitDepth(24)),
                        validate_header(&WaveHeader::new(44100, 2, 24)));
    }

    #[test]
    fn test_validate_header_zero_sample_rate() {
        assert_matches!(Err(WaveError::SampleRateIsZero),
                        validate_header(&WaveHeader::new(0, 1, 16)));
    }

    #[test]
    fn test_validate_header_misaligned_block() {
        let mut header = WaveHeader::new(44100, 2, 16);
        header.block_align = 5;
        assert_matches!(Err(WaveError::MisalignedBlockSize { block_align: 5, .. }),
                        validate_header(&header));

        let mut header = WaveHeader::new(44100, 2, 16);
        header.block_align = 6;
        assert_matches!(Err(WaveError::MisalignedBlockSize { block_align: 6, .. }),
                        validate_header(&header));
    }

    // Decoding tests

    #[test]
    fn test_decode_16bit_stereo() {
        let bytes = wave_bytes(2, 16, b"\xFF\x7F\x01\x80\x00\x00\x00\x40");
        let decoded = decode_wave(Cursor::new(bytes)).unwrap();

        assert_eq!(vec![1.0, 0.0], decoded.left);
        assert_eq!(-1.0, decoded.right[0]);
        assert!((decoded.right[1] - 0.5).abs() < 1e-4);
        assert_eq!(0, decoded.out_of_range);
    }

    #[test]
    fn test_decode_mono_leaves_right_silent() {
        let bytes = wave_bytes(1, 8, &[0, 127, 254]);
        let decoded = decode_wave(Cursor::new(bytes)).unwrap();

        assert_eq!(vec![-1.0, 0.0, 1.0], decoded.left);
        assert_eq!(vec![0.0, 0.0, 0.0], decoded.right);
    }

    #[test]
    fn test_decode_empty_data_chunk() {
        let decoded = decode_wave(Cursor::new(wave_bytes(2, 32, &[]))).unwrap();
        assert!(decoded.left.is_empty());
        assert!(decoded.right.is_empty());
    }

    #[test]
    fn test_decode_counts_out_of_range_words() {
        let bytes = wave_bytes(1, 8, &[255, 127, 255]);
        let decoded = decode_wave(Cursor::new(bytes)).unwrap();

        assert_eq!(2, decoded.out_of_range);
        assert_eq!(3, decoded.left.len());
        assert_eq!(0.0, decoded.left[1]);
    }

    #[test]
    fn test_decode_truncated_data() {
        let mut bytes = wave_bytes(2, 16, &[0; 16]);
        bytes.truncate(bytes.len() - 6);
        assert_matches!(Err(WaveError::TruncatedFile { expected: 4, actual: 2 }),
                        decode_wave(Cursor::new(bytes)));
    }

    #[test]
    fn test_decode_oversized_data_chunk_claim() {
        let mut header = WaveHeader::new(44100, 2, 16);
        header.set_data_size(0xFFFF_FFF0);
        let bytes = header.to_bytes().to_vec();
        assert_matches!(Err(WaveError::TruncatedFile { expected: 0x3FFF_FFFC, actual: 0 }),
                        decode_wave(Cursor::new(bytes)));
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut bytes = wave_bytes(1, 16, &[0x00, 0x40]);
        bytes.extend_from_slice(b"junk");
        let decoded = decode_wave(Cursor::new(bytes)).unwrap();
        assert_eq!(1, decoded.left.len());
    }

    #[test]
    fn test_decode_rejects_a_law() {
        let mut bytes = wave_bytes(1, 8, &[0x55]);
        bytes[20] = 6;
        assert_matches!(Err(WaveError::UnsupportedFormat(6)), decode_wave(Cursor::new(bytes)));
    }
}
