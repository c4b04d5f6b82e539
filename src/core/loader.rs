// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! PSX-EXE image loading
//!
//! A PSF payload is a PSX-EXE: a 2048-byte header followed by the text
//! that is copied into RAM.
//!
//! ```text
//! 0x00-0x07: "PS-X EXE" magic
//! 0x10-0x13: Initial PC (entry point)
//! 0x14-0x17: Initial GP (global pointer)
//! 0x18-0x1B: Load address
//! 0x1C-0x1F: Load size
//! 0x30-0x33: Stack base
//! 0x34-0x37: Stack offset
//! 0x4C-...:  Region marker ("... North America area" / "... Europe area")
//! 0x800+:    Text
//! ```
//!
//! # Example
//!
//! ```
//! use psfrx::core::loader::LoadedImage;
//!
//! let mut exe = vec![0u8; 0x804];
//! exe[0..8].copy_from_slice(b"PS-X EXE");
//! exe[0x10..0x14].copy_from_slice(&0x8001_0000u32.to_le_bytes());
//! exe[0x18..0x1C].copy_from_slice(&0x8001_0000u32.to_le_bytes());
//! exe[0x1C..0x20].copy_from_slice(&4u32.to_le_bytes());
//!
//! let image = LoadedImage::parse(&exe).unwrap();
//! assert_eq!(image.pc, 0x8001_0000);
//! assert_eq!(image.text.len(), 4);
//! ```

use std::path::Path;

use super::error::{EmulatorError, Result};

/// Stack pointer used when the header leaves it at zero
pub const DEFAULT_STACK: u32 = 0x801F_FFF0;

const HEADER_SIZE: usize = 0x800;
const MAGIC: &[u8; 8] = b"PS-X EXE";
const REGION_MARKER: std::ops::Range<usize> = 0x4C..0x800;

/// A parsed executable ready to be copied into the address space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// Entry point
    pub pc: u32,

    /// Global pointer (r28)
    pub gp: u32,

    /// Initial stack and frame pointer
    pub sp: u32,

    /// Where `text` is copied
    pub load_address: u32,

    /// Code and initialized data
    pub text: Vec<u8>,

    /// VSync rate implied by the region marker, if any
    pub vsync_hz: Option<u32>,
}

impl LoadedImage {
    /// Parse a PSX-EXE
    ///
    /// A text shorter than the header's load size is accepted and loaded
    /// as far as it goes; ripped payloads are often trimmed.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(EmulatorError::LoaderError(format!(
                "PSX-EXE is {} bytes, shorter than its 2048-byte header",
                data.len()
            )));
        }
        if &data[0..8] != MAGIC {
            return Err(EmulatorError::LoaderError(
                "missing PS-X EXE magic".to_string(),
            ));
        }

        let word = |offset: usize| {
            u32::from_le_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ])
        };

        let pc = word(0x10);
        let gp = word(0x14);
        let load_address = word(0x18);
        let load_size = word(0x1C) as usize;
        let stack = word(0x30).wrapping_add(word(0x34));

        let available = data.len() - HEADER_SIZE;
        if load_size > available {
            log::warn!(
                "PSX-EXE text truncated: header says 0x{:X} bytes, file has 0x{:X}",
                load_size,
                available
            );
        }
        let text = data[HEADER_SIZE..HEADER_SIZE + load_size.min(available)].to_vec();

        let image = Self {
            pc,
            gp,
            sp: if stack == 0 { DEFAULT_STACK } else { stack },
            load_address,
            text,
            vsync_hz: region_vsync(&data[REGION_MARKER]),
        };

        log::info!(
            "PSX-EXE: PC=0x{:08X} GP=0x{:08X} SP=0x{:08X} load 0x{:X} bytes at 0x{:08X}",
            image.pc,
            image.gp,
            image.sp,
            image.text.len(),
            image.load_address
        );
        Ok(image)
    }

    /// Read and parse a PSX-EXE file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse(&data)
    }
}

/// 50 Hz for European discs, 60 Hz for the other markers
fn region_vsync(marker: &[u8]) -> Option<u32> {
    let end = marker.iter().position(|&b| b == 0).unwrap_or(marker.len());
    let text = String::from_utf8_lossy(&marker[..end]);

    if text.contains("Europe") {
        Some(50)
    } else if text.contains("North America") || text.contains("Japan") {
        Some(60)
    } else {
        None
    }
}
