// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Default decoder for PicoScenes CSI frame payloads.
//!
//! # Frame Layout
//!
//! Every frame is a `u32` little-endian payload length followed by the
//! payload. The payload is:
//!
//! ```text
//! u32  magic (0x2015_0315)
//! u16  format version
//! u16  device type
//! u64  system time, ns since the Unix epoch
//! u16  num_tones
//! u8   num_tx
//! u8   num_rx
//! u8   num_ess
//! u8   reserved
//! u16  channel bandwidth, MHz
//! i16  subcarrier_index[num_tones]
//! f32  (re, im) pairs, tone-major, num_tones * num_tx * (num_rx + num_ess)
//! ```
//!
//! All fields are little-endian. The stream dimension of the decoded
//! tensor is `num_rx + num_ess`.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use ndarray::Array3;
use num_complex::Complex32;

use super::record::{CsiRecord, DeviceInfo};
use super::{DecodeError, FrameDecoder};
use crate::io::index::LENGTH_PREFIX_LEN;

/// Magic value opening every frame payload.
pub const FRAME_MAGIC: u32 = 0x2015_0315;

/// Fixed payload header size, after the length prefix.
pub const PAYLOAD_HEADER_LEN: usize = 24;

/// Decoder for the PicoScenes fixed-schema frame payload.
///
/// Stateless; a single instance is shared across all workers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PicoFrameDecoder;

impl PicoFrameDecoder {
    fn short(frame_len: usize) -> DecodeError {
        DecodeError::TooShort {
            needed: LENGTH_PREFIX_LEN + PAYLOAD_HEADER_LEN,
            actual: frame_len,
        }
    }
}

impl FrameDecoder for PicoFrameDecoder {
    fn decode(&self, frame: &[u8]) -> std::result::Result<CsiRecord, DecodeError> {
        if frame.len() < LENGTH_PREFIX_LEN + PAYLOAD_HEADER_LEN {
            return Err(Self::short(frame.len()));
        }

        let mut cursor = Cursor::new(frame);
        let declared = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| Self::short(frame.len()))? as usize;
        let payload_len = frame.len() - LENGTH_PREFIX_LEN;
        if declared != payload_len {
            return Err(DecodeError::LengthMismatch {
                declared,
                actual: payload_len,
            });
        }

        let magic = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| Self::short(frame.len()))?;
        if magic != FRAME_MAGIC {
            return Err(DecodeError::BadMagic(magic));
        }

        let read_err = |_| Self::short(frame.len());
        let format_version = cursor.read_u16::<LittleEndian>().map_err(read_err)?;
        let device_type = cursor.read_u16::<LittleEndian>().map_err(read_err)?;
        let timestamp_ns = cursor.read_u64::<LittleEndian>().map_err(read_err)?;
        let tones = cursor.read_u16::<LittleEndian>().map_err(read_err)? as usize;
        let tx = cursor.read_u8().map_err(read_err)? as usize;
        let rx = cursor.read_u8().map_err(read_err)? as usize;
        let ess = cursor.read_u8().map_err(read_err)? as usize;
        let _reserved = cursor.read_u8().map_err(read_err)?;
        let cbw_mhz = cursor.read_u16::<LittleEndian>().map_err(read_err)?;

        let streams = rx + ess;
        if tones == 0 || tx == 0 || streams == 0 {
            return Err(DecodeError::EmptyDimensions { tones, tx, streams });
        }

        let sample_count = tones * tx * streams;
        let needed = tones * 2 + sample_count * 8;
        let actual = frame.len() - (LENGTH_PREFIX_LEN + PAYLOAD_HEADER_LEN);
        if actual != needed {
            return Err(DecodeError::SampleCountMismatch { needed, actual });
        }

        let mut subcarrier_indices = Vec::with_capacity(tones);
        for _ in 0..tones {
            subcarrier_indices.push(cursor.read_i16::<LittleEndian>().map_err(read_err)?);
        }

        let mut samples = Vec::with_capacity(sample_count);
        for _ in 0..sample_count {
            let re = cursor.read_f32::<LittleEndian>().map_err(read_err)?;
            let im = cursor.read_f32::<LittleEndian>().map_err(read_err)?;
            samples.push(Complex32::new(re, im));
        }

        let csi = Array3::from_shape_vec((tones, tx, streams), samples).map_err(|_| {
            DecodeError::SampleCountMismatch {
                needed: sample_count,
                actual: 0,
            }
        })?;

        Ok(CsiRecord {
            device: DeviceInfo {
                format_version,
                device_type,
            },
            timestamp_ns,
            cbw_mhz,
            subcarrier_indices,
            csi,
        })
    }
}
