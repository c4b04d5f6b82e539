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

//! Decoded instruments and the sound bank
//!
//! An instrument is the PCM stream decoded from a run of ADPCM blocks in SPU
//! RAM, starting at a block address and ending with the first block that
//! carries the end flag. Voices share instruments through `Arc`, so a sample
//! is decoded once no matter how many voices play it.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use super::adpcm::{AdpcmDecoder, BLOCK_SIZE, SAMPLES_PER_BLOCK};

/// PCM data decoded from one ADPCM sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    /// Byte address of the first block
    start: u32,

    /// Byte address just past the last block
    end: u32,

    /// Decoded samples
    samples: Vec<i16>,

    /// Sample index of the block flagged as loop start
    loop_offset: Option<usize>,

    /// Whether the final block asks to jump back to the loop point
    repeat: bool,
}

impl Instrument {
    /// Decode the instrument starting at `start`
    ///
    /// Decoding stops after the first block with the end flag, or at the end
    /// of SPU RAM if no such block exists.
    pub fn decode(ram: &[u8], start: u32) -> Self {
        let start = start & !(BLOCK_SIZE as u32 - 1);
        let mut decoder = AdpcmDecoder::default();
        let mut samples = Vec::new();
        let mut loop_offset = None;
        let mut repeat = false;
        let mut address = start as usize;

        while address + BLOCK_SIZE <= ram.len() {
            let block_index = samples.len();
            let flags = decoder.decode_block(&ram[address..address + BLOCK_SIZE], &mut samples);
            address += BLOCK_SIZE;

            if flags.loop_start {
                loop_offset = Some(block_index);
            }
            if flags.end {
                repeat = flags.repeat;
                break;
            }
        }

        log::trace!(
            "Decoded instrument at 0x{:05X}: {} samples, loop {:?}, repeat {}",
            start,
            samples.len(),
            loop_offset,
            repeat
        );

        Self {
            start,
            end: address as u32,
            samples,
            loop_offset,
            repeat,
        }
    }

    /// Byte address of the first block
    pub fn start(&self) -> u32 {
        self.start
    }

    /// SPU RAM byte range covered by this instrument
    pub fn span(&self) -> Range<u32> {
        self.start..self.end
    }

    /// Number of decoded samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline(always)]
    pub fn sample(&self, index: usize) -> Option<i16> {
        self.samples.get(index).copied()
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Sample index playback resumes from when the stream repeats
    pub fn loop_offset(&self) -> usize {
        self.loop_offset.unwrap_or(0)
    }

    pub fn repeats(&self) -> bool {
        self.repeat
    }

    /// Number of blocks decoded
    pub fn blocks(&self) -> usize {
        self.samples.len() / SAMPLES_PER_BLOCK
    }
}

/// Cache of decoded instruments keyed by start address
#[derive(Debug, Default)]
pub struct SoundBank {
    instruments: HashMap<u32, Arc<Instrument>>,
}

impl SoundBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the instrument starting at `start`, decoding it on first use
    pub fn instrument(&mut self, ram: &[u8], start: u32) -> Arc<Instrument> {
        let start = start & !(BLOCK_SIZE as u32 - 1);
        Arc::clone(
            self.instruments
                .entry(start)
                .or_insert_with(|| Arc::new(Instrument::decode(ram, start))),
        )
    }

    /// Drop every instrument whose blocks overlap `range`
    ///
    /// Voices already playing keep their own reference to the old data.
    pub fn invalidate(&mut self, range: Range<u32>) {
        let before = self.instruments.len();
        self.instruments
            .retain(|_, inst| inst.end <= range.start || inst.start >= range.end);

        let dropped = before - self.instruments.len();
        if dropped > 0 {
            log::trace!(
                "Invalidated {} instrument(s) under 0x{:05X}..0x{:05X}",
                dropped,
                range.start,
                range.end
            );
        }
    }

    /// Forget every decoded instrument
    pub fn clear(&mut self) {
        self.instruments.clear();
    }

    /// Number of cached instruments
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}
