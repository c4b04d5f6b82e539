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

//! ADPCM (Adaptive Differential Pulse Code Modulation) decoder
//!
//! Implements the PlayStation's ADPCM audio decompression format.
//! ADPCM compresses 16-bit PCM audio to 4 bits per sample using
//! adaptive prediction filters.
//!
//! # ADPCM Block Format
//!
//! ```text
//! Byte 0: Shift (bits 0-3) | Filter (bits 4-6)
//! Byte 1: Flags (bit 0 end, bit 1 repeat, bit 2 loop start)
//! Bytes 2-15: 14 bytes of nibble pairs (28 samples total)
//! ```

/// Size of one ADPCM block in bytes
pub const BLOCK_SIZE: usize = 16;

/// Samples decoded from one block
pub const SAMPLES_PER_BLOCK: usize = 28;

/// Positive filter coefficients (x/64)
const FILTER_POS: [i32; 5] = [0, 60, 115, 98, 122];

/// Negative filter coefficients (x/64)
const FILTER_NEG: [i32; 5] = [0, 0, -52, -55, -60];

/// Block header flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockFlags {
    /// Last block of the sample
    pub end: bool,
    /// Jump to the loop point after this block instead of stopping
    pub repeat: bool,
    /// This block is the loop point
    pub loop_start: bool,
}

impl BlockFlags {
    /// Decode the flags byte of a block
    pub fn from_byte(byte: u8) -> Self {
        Self {
            end: byte & 0x01 != 0,
            repeat: byte & 0x02 != 0,
            loop_start: byte & 0x04 != 0,
        }
    }
}

/// ADPCM decoder state
///
/// Keeps the two previous output samples used by the prediction filters.
#[derive(Debug, Clone, Default)]
pub struct AdpcmDecoder {
    history: [i32; 2],
}

impl AdpcmDecoder {
    /// Decode a single 16-byte block, appending 28 samples to `out`
    ///
    /// # Returns
    ///
    /// The block's header flags
    pub fn decode_block(&mut self, block: &[u8], out: &mut Vec<i16>) -> BlockFlags {
        if block.len() < BLOCK_SIZE {
            return BlockFlags {
                end: true,
                ..BlockFlags::default()
            };
        }

        let shift = (block[0] & 0xF) as u32;
        // Shift values 13-15 behave like 9 on hardware
        let shift = if shift > 12 { 9 } else { shift };
        let filter = (((block[0] >> 4) & 0x7) as usize).min(4);

        for &byte in &block[2..BLOCK_SIZE] {
            for nibble in [byte & 0xF, byte >> 4] {
                // Sign-extend the nibble into the top of a 16-bit word
                let raw = ((nibble as i16) << 12) as i32 >> shift;
                let predicted = (self.history[0] * FILTER_POS[filter]
                    + self.history[1] * FILTER_NEG[filter]
                    + 32)
                    >> 6;
                let sample = (raw + predicted).clamp(i16::MIN as i32, i16::MAX as i32);

                self.history[1] = self.history[0];
                self.history[0] = sample;
                out.push(sample as i16);
            }
        }

        BlockFlags::from_byte(block[1])
    }
}
