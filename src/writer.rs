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

use std::io;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;
use tempfile::NamedTempFile;

use crate::buffer::AudioBuffer;
use crate::header::{PcmFormat, WaveHeader};
use crate::sample;
use crate::{WaveError, WaveResult};

// MARK: Writing functions

/// Helper struct that takes ownership of a writer and can be used to write
/// PCM samples to it as a complete wave file.
#[derive(Debug)]
pub struct WaveWriter<T>
    where T: Write
{
    ///  Represents the PCM format for this wave file.
    pub pcm_format: PcmFormat,

    // The underlying writer that we'll write the file to.
    writer: T,
}

impl<T> WaveWriter<T>
    where T: Write
{
    /// Returns a new wave writer for the given writer, once the format has
    /// been checked.
    pub fn new(num_channels: u16,
               sample_rate: u32,
               bits_per_sample: u16,
               writer: T)
               -> WaveResult<WaveWriter<T>> {
        let pcm_format = PcmFormat {
            num_channels: num_channels,
            sample_rate: sample_rate,
            bits_per_sample: bits_per_sample,
        };
        pcm_format.validate()?;

        Ok(WaveWriter {
            pcm_format: pcm_format,
            writer: writer,
        })
    }

    /// Encodes the channels and writes header and data. Samples are clamped
    /// to [-1.0, 1.0]. For mono files `right` is ignored; for stereo files it
    /// must be as long as `left`.
    ///
    /// Returns the header that was written, in host order, and the writer.
    pub fn write_channels(mut self, left: &[f32], right: &[f32]) -> WaveResult<(WaveHeader, T)> {
        let stereo = self.pcm_format.num_channels == 2;
        if stereo && left.len() != right.len() {
            return Err(WaveError::ChannelLengthMismatch {
                left: left.len(),
                right: right.len(),
            });
        }

        let mut buffer = AudioBuffer::new(WaveHeader::from_format(&self.pcm_format))?;
        buffer.set_frame_count(left.len())?;

        for (index, &value) in left.iter().enumerate() {
            if stereo {
                buffer.add_frame(&[sample::clamp(value), sample::clamp(right[index])])?;
            } else {
                buffer.add_frame(&[sample::clamp(value)])?;
            }
        }

        buffer.write_to(&mut self.writer)?;
        self.writer.flush()?;
        Ok((buffer.header().clone(), self.writer))
    }
}

/// Writes left and right channel samples to a PCM wave file.
///
/// The file is written to a temporary file next to `path` and moved into
/// place once complete, so a failed write never leaves partial output.
pub fn write_wave<P: AsRef<Path>>(path: P,
                                  left: &[f32],
                                  right: &[f32],
                                  sample_rate: u32,
                                  num_channels: u16,
                                  bits_per_sample: u16)
                                  -> WaveResult<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Validate before touching the filesystem.
    let format = PcmFormat {
        num_channels: num_channels,
        sample_rate: sample_rate,
        bits_per_sample: bits_per_sample,
    };
    format.validate()?;

    let temp = NamedTempFile::new_in(dir)?;
    let wave_writer = WaveWriter::new(num_channels,
                                      sample_rate,
                                      bits_per_sample,
                                      BufWriter::new(temp))?;
    let (header, writer) = wave_writer.write_channels(left, right)?;
    let temp = writer.into_inner().map_err(io::Error::from)?;
    temp.persist(path).map_err(|err| err.error)?;

    debug!("wrote {} frames ({} data bytes) to {}",
           header.num_frames(),
           header.data_size,
           path.display());
    Ok(())
}

// MARK: Tests
