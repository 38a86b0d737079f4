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

//! Byte order normalization between the host and a target order.

/// The widest value, in bytes, that `reverse_bytes` accepts.
pub const MAX_VALUE_WIDTH: usize = 32;

/// Byte order of a multi-byte value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// Least significant byte first, as used by wave files.
    Little,
    /// Most significant byte first.
    Big,
}

impl Endianness {
    /// The byte order of the machine we're running on.
    pub fn host() -> Endianness {
        if is_big_endian_host() {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

/// Returns true if the host stores the most significant byte first.
///
/// Determined by looking at where the low byte of a known two-byte integer
/// lands in memory.
pub fn is_big_endian_host() -> bool {
    let probe: u16 = 1;
    probe.to_ne_bytes()[0] == 0
}

/// Reverses the byte order of a value in place.
///
/// # Panics
///
/// Panics if the value is wider than `MAX_VALUE_WIDTH` bytes.
pub fn reverse_bytes(value: &mut [u8]) {
    assert!(value.len() <= MAX_VALUE_WIDTH,
            "cannot reverse a {}-byte value, the limit is {} bytes",
            value.len(),
            MAX_VALUE_WIDTH);
    value.reverse();
}

/// Converts a value between host order and `target`. The bytes are only
/// reversed when the host order differs from `target`, so calling this twice
/// with the same order restores the original bytes.
pub fn to_order(target: Endianness, value: &mut [u8]) {
    if Endianness::host() != target {
        reverse_bytes(value);
    }
}

/// Converts a value between host order and little-endian.
pub fn to_little_endian(value: &mut [u8]) {
    to_order(Endianness::Little, value)
}

/// Converts a value between host order and big-endian.
pub fn to_big_endian(value: &mut [u8]) {
    to_order(Endianness::Big, value)
}

// MARK: Tests
