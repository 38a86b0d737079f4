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

//! Writes a stereo sine wave, reads it back and checks that the samples
//! survived within the quantization error of the bit depth.

use std::f32::consts::PI;
use std::fs::File;
use std::io::BufReader;

use pcm_wave::{decode_wave, write_wave, WaveResult};

const SAMPLE_RATE: u32 = 44100;
const FREQ: f32 = 440.0;
const SIZE: usize = 1000;
const NUM_CHANNELS: u16 = 2;
const BITS_PER_SAMPLE: u16 = 32;
const PATH: &str = "mytest.wav";

fn sine(freq: f32, size: usize) -> Vec<f32> {
	(0..size).map(|k| (2.0 * PI * k as f32 * freq / SAMPLE_RATE as f32).sin()).collect()
}

fn first_mismatch(written: &[f32], read: &[f32]) -> Option<usize> {
	let tolerance = 2.0 / 2f64.powi(i32::from(BITS_PER_SAMPLE) - 1);
	written.iter().zip(read).position(|(&w, &r)| f64::from((w - r).abs()) > tolerance)
}

fn main() -> WaveResult<()> {
	let left = sine(FREQ, SIZE);
	let right = sine(2.0 * FREQ, SIZE);

	write_wave(PATH, &left, &right, SAMPLE_RATE, NUM_CHANNELS, BITS_PER_SAMPLE)?;

	let decoded = decode_wave(BufReader::new(File::open(PATH)?))?;
	println!("{}\n", decoded.header);

	println!("Left Channel \t Right Channel");
	for (l, r) in decoded.left.iter().zip(&decoded.right) {
		println!("{:.6}\t{:.6}", l, r);
	}

	let mismatch = first_mismatch(&left, &decoded.left).or_else(|| first_mismatch(&right, &decoded.right));
	match mismatch {
		None => println!("\nVerification: SUCCESSFUL"),
		Some(k) => println!("\nVerification: FAILED at sample {}", k),
	}
	Ok(())
}
