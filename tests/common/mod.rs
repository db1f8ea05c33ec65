// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Shared fixtures: synthetic capture files built in a temp directory.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use byteorder::{LittleEndian, WriteBytesExt};
use num_complex::Complex32;

use picoparse::decode::pico::FRAME_MAGIC;

/// Parameters for one synthetic frame.
pub struct FrameSpec {
    pub timestamp_ns: u64,
    pub cbw_mhz: u16,
    pub indices: Vec<i16>,
    pub tx: u8,
    pub rx: u8,
    pub ess: u8,
    pub samples: Vec<Complex32>,
}

impl FrameSpec {
    /// A 20 MHz 1x1 frame on the usual 56-tone grid (no DC), with
    /// deterministic samples derived from `seed`.
    pub fn simple(timestamp_ns: u64, seed: f32) -> Self {
        let indices: Vec<i16> = (-28..=28).filter(|&i| i != 0).collect();
        let samples = indices
            .iter()
            .map(|&i| Complex32::new(seed + i as f32, seed - i as f32))
            .collect();
        Self {
            timestamp_ns,
            cbw_mhz: 20,
            indices,
            tx: 1,
            rx: 1,
            ess: 0,
            samples,
        }
    }

    /// A 20 MHz 1x1 frame whose native grid already equals the
    /// canonical grid (57 contiguous tones including DC).
    pub fn canonical(timestamp_ns: u64, seed: f32) -> Self {
        let indices: Vec<i16> = (-28..=28).collect();
        let samples = indices
            .iter()
            .map(|&i| Complex32::new(seed + i as f32, seed * 0.5))
            .collect();
        Self {
            timestamp_ns,
            cbw_mhz: 20,
            indices,
            tx: 1,
            rx: 1,
            ess: 0,
            samples,
        }
    }

    /// Encode as one full frame record, length prefix included.
    pub fn encode(&self) -> Vec<u8> {
        assert_eq!(
            self.samples.len(),
            self.indices.len() * self.tx as usize * (self.rx + self.ess) as usize
        );

        let mut payload = Vec::new();
        payload.write_u32::<LittleEndian>(FRAME_MAGIC).unwrap();
        payload.write_u16::<LittleEndian>(1).unwrap();
        payload.write_u16::<LittleEndian>(0x5300).unwrap();
        payload.write_u64::<LittleEndian>(self.timestamp_ns).unwrap();
        payload
            .write_u16::<LittleEndian>(self.indices.len() as u16)
            .unwrap();
        payload.write_u8(self.tx).unwrap();
        payload.write_u8(self.rx).unwrap();
        payload.write_u8(self.ess).unwrap();
        payload.write_u8(0).unwrap();
        payload.write_u16::<LittleEndian>(self.cbw_mhz).unwrap();
        for &idx in &self.indices {
            payload.write_i16::<LittleEndian>(idx).unwrap();
        }
        for z in &self.samples {
            payload.write_f32::<LittleEndian>(z.re).unwrap();
            payload.write_f32::<LittleEndian>(z.im).unwrap();
        }

        let mut frame = Vec::with_capacity(4 + payload.len());
        frame
            .write_u32::<LittleEndian>(payload.len() as u32)
            .unwrap();
        frame.extend_from_slice(&payload);
        frame
    }
}

/// Write a capture file from raw frame records plus optional trailing
/// bytes, returning its path.
pub fn write_capture(name: &str, frames: &[Vec<u8>], trailing: &[u8]) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "picoparse_test_{}_{}.csi",
        std::process::id(),
        name
    ));
    let mut file = File::create(&path).unwrap();
    for frame in frames {
        file.write_all(frame).unwrap();
    }
    file.write_all(trailing).unwrap();
    file.flush().unwrap();
    path
}

/// Byte offset of frame `i` within a capture built from `frames`.
pub fn frame_offset(frames: &[Vec<u8>], i: usize) -> usize {
    frames[..i].iter().map(|f| f.len()).sum()
}

/// Flip the magic of frame `i` in an already-encoded capture buffer,
/// leaving the length prefix intact so indexing still works.
pub fn corrupt_frame(frames: &mut [Vec<u8>], i: usize) {
    frames[i][4] ^= 0xff;
}
