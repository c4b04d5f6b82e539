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

//! SPU voice (audio channel) implementation
//!
//! Each voice plays a shared [`Instrument`] through a 16.16 fractional
//! position accumulator, a four-sample interpolation ring, its own ADSR
//! envelope and a pair of (optionally sweeping) volumes.

use std::sync::Arc;

use super::adsr::{AdsrEnvelope, EnvelopePhase};
use super::instrument::{Instrument, SoundBank};
use super::interpolation::Interpolation;
use super::volume::SweepVolume;

/// One sample step in the 16.16 position accumulator
const POSITION_ONE: u32 = 0x10000;

/// Largest usable pitch register value
const PITCH_MAX: i32 = 0x3FFF;

/// Per-sample inputs shared by all voices
#[derive(Debug, Clone, Copy)]
pub struct MixInput {
    /// Interpolation filter
    pub filter: Interpolation,

    /// Output of the previous voice, when this voice is frequency modulated
    pub modulator: Option<i32>,

    /// Noise generator level, when this voice plays noise
    pub noise: Option<i32>,
}

/// Individual voice channel
#[derive(Debug, Clone)]
pub struct Voice {
    /// Voice number (0-23)
    index: usize,

    pub(crate) volume_left: SweepVolume,
    pub(crate) volume_right: SweepVolume,

    /// Raw pitch register (0x1000 plays at 44100Hz)
    pub(crate) pitch: u16,

    /// Start address register (multiply by 8 for byte address)
    pub(crate) start_address: u16,

    /// Loop address register (multiply by 8 for byte address)
    pub(crate) loop_address: u16,

    pub(crate) adsr: AdsrEnvelope,

    /// Last four fetched samples, oldest first
    ring: [i32; 4],

    /// 16.16 playback position
    position: u32,

    /// Instrument being played
    instrument: Option<Arc<Instrument>>,

    /// Next sample index inside the instrument
    cursor: usize,

    /// Byte address set through the loop address register after key-on
    loop_override: Option<u32>,

    /// Last output sample (post envelope), used as FM source
    last_output: i32,
}

impl Voice {
    /// Create a silent voice
    ///
    /// # Arguments
    ///
    /// * `index` - Voice number (0-23)
    pub fn new(index: usize) -> Self {
        Self {
            index,
            volume_left: SweepVolume::default(),
            volume_right: SweepVolume::default(),
            pitch: 0,
            start_address: 0,
            loop_address: 0,
            adsr: AdsrEnvelope::default(),
            ring: [0; 4],
            position: 0,
            instrument: None,
            cursor: 0,
            loop_override: None,
            last_output: 0,
        }
    }

    /// Whether the voice is silent
    #[inline(always)]
    pub fn is_off(&self) -> bool {
        self.adsr.phase == EnvelopePhase::Off
    }

    /// Visible envelope level (0..=1023)
    pub fn envelope_level(&self) -> i32 {
        self.adsr.level()
    }

    /// Last output sample
    pub fn last_output(&self) -> i32 {
        self.last_output
    }

    /// Instrument currently attached to the voice
    pub fn instrument(&self) -> Option<&Arc<Instrument>> {
        self.instrument.as_ref()
    }

    /// Start playback from the start address
    ///
    /// The position is primed to one full step so the first output sample
    /// fetches sample 0.
    pub fn key_on(&mut self, bank: &mut SoundBank, ram: &[u8]) {
        let start = self.start_address as u32 * 8;
        self.instrument = Some(bank.instrument(ram, start));
        self.cursor = 0;
        self.ring = [0; 4];
        self.position = POSITION_ONE;
        self.loop_override = None;
        self.last_output = 0;
        self.adsr.key_on();

        log::trace!("Voice {} key on at 0x{:05X}", self.index, start);
    }

    /// Begin the release phase
    pub fn key_off(&mut self) {
        self.adsr.key_off();

        log::trace!("Voice {} key off", self.index);
    }

    /// Use the loop address register as the loop point from now on
    pub fn set_loop_override(&mut self) {
        let address = self.loop_address as u32 * 8;
        self.loop_override = Some(address);

        log::trace!("Voice {} loop override 0x{:05X}", self.index, address);
    }

    /// Render one sample
    ///
    /// # Returns
    ///
    /// The enveloped sample before stereo volume is applied
    ///
    /// # Panics
    ///
    /// Panics if the voice is active without an instrument.
    #[inline]
    pub fn render(&mut self, bank: &mut SoundBank, ram: &[u8], input: MixInput) -> i32 {
        if self.is_off() {
            self.last_output = 0;
            return 0;
        }

        while self.position >= POSITION_ONE {
            self.position -= POSITION_ONE;
            match self.next_sample(bank, ram) {
                Some(sample) => {
                    self.ring.rotate_left(1);
                    self.ring[3] = sample;
                }
                None => {
                    log::trace!("Voice {} reached the end of its sample", self.index);
                    self.adsr.silence();
                    self.instrument = None;
                    self.last_output = 0;
                    return 0;
                }
            }
        }

        let sample = match input.noise {
            Some(level) => level,
            None => input.filter.apply(&self.ring, self.position & 0xFFFF),
        };

        self.adsr.tick();
        let out = sample * self.adsr.level() / 1023;
        self.last_output = out;

        self.position += self.step(input.modulator);
        out
    }

    /// Position increment for one output sample
    #[inline(always)]
    fn step(&self, modulator: Option<i32>) -> u32 {
        let mut pitch = (self.pitch as i32).min(PITCH_MAX);

        if let Some(m) = modulator {
            pitch = ((0x8000 + m) * pitch / 0x8000).clamp(1, PITCH_MAX);
        }

        (pitch as u32) << 4
    }

    /// Pull the next PCM sample from the instrument
    ///
    /// Returns `None` when the stream is exhausted without a loop.
    fn next_sample(&mut self, bank: &mut SoundBank, ram: &[u8]) -> Option<i32> {
        let Some(instrument) = self.instrument.as_ref().map(Arc::clone) else {
            panic!("voice {} is active without an instrument", self.index);
        };

        if let Some(sample) = instrument.sample(self.cursor) {
            self.cursor += 1;
            return Some(sample as i32);
        }

        if !instrument.repeats() {
            return None;
        }

        match self.loop_override {
            Some(address) => {
                let next = bank.instrument(ram, address);
                self.instrument = Some(next);
                self.cursor = 0;
            }
            None => self.cursor = instrument.loop_offset(),
        }

        let sample = self.instrument.as_ref()?.sample(self.cursor)?;
        self.cursor += 1;
        Some(sample as i32)
    }
}
