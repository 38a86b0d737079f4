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

//! An in-memory wave file under construction.

use std::convert::TryFrom;
use std::io;
use std::io::Write;

use log::debug;

use crate::header::{WaveHeader, MAX_DATA_SIZE};
use crate::sample::{self, BitDepth};
use crate::{WaveError, WaveResult};

/// Owns a header and the encoded sample data that will follow it.
///
/// The data is allocated once, with `set_frame_count` or `set_duration`, and
/// then filled front to back with `add_frame`.
#[derive(Debug)]
pub struct AudioBuffer {
    header: WaveHeader,
    depth: BitDepth,
    data: Vec<u8>,
    // Offset of the next byte to write. Never exceeds data.len().
    cursor: usize,
    sample_count: usize,
}

impl AudioBuffer {
    /// Returns an empty buffer for the given header. The header's bit depth
    /// must be one we can encode.
    pub fn new(header: WaveHeader) -> WaveResult<AudioBuffer> {
        let depth = BitDepth::try_from(header.bits_per_sample)?;
        Ok(AudioBuffer {
            header: header,
            depth: depth,
            data: Vec::new(),
            cursor: 0,
            sample_count: 0,
        })
    }

    /// Allocates room for exactly `frames` frames and updates the header's
    /// sizes to match. Fails once samples have been added, unless the buffer
    /// is `reset` first.
    pub fn set_frame_count(&mut self, frames: usize) -> WaveResult<()> {
        if self.cursor > 0 {
            return Err(WaveError::BufferAlreadyAllocated);
        }

        let frame_size = u64::from(self.header.block_align);
        let size = (frames as u64).checked_mul(frame_size).unwrap_or(u64::MAX);
        if size > u64::from(MAX_DATA_SIZE) {
            return Err(WaveError::DataTooLarge(size));
        }
        let data_size = size as u32;
        let size = size as usize;

        self.data = vec![0; size];
        self.sample_count = frames * usize::from(self.header.num_channels);
        self.header.set_data_size(data_size);
        debug!("allocated {} bytes for {} frames", size, frames);
        Ok(())
    }

    /// Allocates room for `seconds` of audio at the header's sample rate.
    pub fn set_duration(&mut self, seconds: f64) -> WaveResult<()> {
        let frames = (f64::from(self.header.sample_rate) * seconds.max(0.0)) as usize;
        self.set_frame_count(frames)
    }

    /// Rewinds the write cursor so the buffer can be filled or resized again.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Appends one frame, with one sample per channel.
    pub fn add_frame(&mut self, samples: &[f32]) -> WaveResult<()> {
        let num_channels = usize::from(self.header.num_channels);
        if samples.len() != num_channels {
            return Err(WaveError::WrongFrameWidth {
                expected: num_channels,
                actual: samples.len(),
            });
        }

        let width = self.depth.bytes();
        if self.remaining() < width * num_channels {
            return Err(WaveError::BufferFull);
        }

        for &value in samples {
            let end = self.cursor + width;
            sample::encode_sample(self.depth, value, &mut self.data[self.cursor..end]);
            self.cursor = end;
        }
        Ok(())
    }

    /// Writes the header followed by the sample data.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.header.write_to(writer)?;
        writer.write_all(&self.data)
    }

    pub fn header(&self) -> &WaveHeader {
        &self.header
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The allocated size of the sample data, in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Total samples across all channels that the buffer was sized for.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }
}

// MARK: Tests
