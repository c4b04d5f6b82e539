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

//! SPU (Sound Processing Unit) implementation
//!
//! The SPU owns 512KB of sound RAM, 24 voices and the reverb unit. The
//! worker thread calls [`Spu::mix_frame`] once per output sample; the CPU
//! thread reaches the register bank and the DMA entry points through the
//! shared lock held by [`bridge::SpuBridge`].
//!
//! # Register Map
//!
//! | Address Range         | Contents                              |
//! |-----------------------|---------------------------------------|
//! | 0x1F801C00-0x1F801D7F | Voice registers (24 x 16 bytes)       |
//! | 0x1F801D80-0x1F801DBF | Global control                        |
//! | 0x1F801DC0-0x1F801DFF | Reverb offsets and coefficients       |

pub mod adpcm;
pub mod adsr;
pub mod bridge;
pub mod instrument;
pub mod interpolation;
pub mod noise;
pub mod registers;
pub mod reverb;
pub mod voice;
pub mod volume;

#[cfg(test)]
mod tests;

use crate::core::error::{EmulatorError, Result};

pub use adsr::{AdsrEnvelope, EnvelopePhase};
pub use bridge::{SpuBridge, SpuMeter, SpuRequest};
pub use instrument::{Instrument, SoundBank};
pub use interpolation::Interpolation;
pub use registers::{SpuControl, SPU_RAM_SIZE, VOICE_COUNT};
pub use reverb::{PsxReverb, ReverbRegisters, ReverbUnit};

use noise::NoiseGenerator;
use registers::*;
use voice::{MixInput, Voice};
use volume::SweepVolume;

/// Sound Processing Unit
pub struct Spu {
    /// Sound RAM (512KB)
    ram: Vec<u8>,

    voices: Vec<Voice>,

    /// Decoded instruments keyed by start address
    bank: SoundBank,

    control: SpuControl,

    main_volume_left: SweepVolume,
    main_volume_right: SweepVolume,

    /// Reverb output volume
    reverb_depth_left: i16,
    reverb_depth_right: i16,

    /// Voice bitfields (bit n = voice n)
    fm_on: u32,
    noise_on: u32,
    reverb_on: u32,

    reverb_regs: ReverbRegisters,
    reverb: Box<dyn ReverbUnit>,

    noise: NoiseGenerator,

    /// Manual transfer byte address
    transfer_address: u32,

    /// Raw register values, for registers without live state
    shadow: Box<[u16; 0x100]>,

    /// Interpolation filter used by every voice
    interpolation: Interpolation,

    /// Player-level switch for reverb processing
    reverb_enabled: bool,

    /// Frames mixed since reset
    frames: u64,
}

impl Spu {
    /// Create a new SPU with default settings
    pub fn new() -> Self {
        Self {
            ram: vec![0u8; SPU_RAM_SIZE],
            voices: (0..VOICE_COUNT).map(Voice::new).collect(),
            bank: SoundBank::new(),
            control: SpuControl::empty(),
            main_volume_left: SweepVolume::default(),
            main_volume_right: SweepVolume::default(),
            reverb_depth_left: 0,
            reverb_depth_right: 0,
            fm_on: 0,
            noise_on: 0,
            reverb_on: 0,
            reverb_regs: ReverbRegisters::default(),
            reverb: Box::new(PsxReverb::new()),
            noise: NoiseGenerator::new(),
            transfer_address: 0,
            shadow: Box::new([0u16; 0x100]),
            interpolation: Interpolation::default(),
            reverb_enabled: true,
            frames: 0,
        }
    }

    /// Return to the power-on state, clearing sound RAM
    pub fn reset(&mut self) {
        let interpolation = self.interpolation;
        let reverb_enabled = self.reverb_enabled;
        let mut reverb = std::mem::replace(&mut self.reverb, Box::new(PsxReverb::new()));
        reverb.reset();

        *self = Self::new();
        self.interpolation = interpolation;
        self.reverb_enabled = reverb_enabled;
        self.reverb = reverb;
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn set_reverb_enabled(&mut self, enabled: bool) {
        self.reverb_enabled = enabled;
    }

    /// Replace the reverb processing strategy
    pub fn set_reverb_unit(&mut self, unit: Box<dyn ReverbUnit>) {
        self.reverb = unit;
    }

    pub fn control(&self) -> SpuControl {
        self.control
    }

    /// Sound RAM
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    /// Frames mixed since reset
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Number of decoded instruments currently cached
    pub fn cached_instruments(&self) -> usize {
        self.bank.len()
    }

    fn voice(&self, index: usize) -> Result<&Voice> {
        self.voices
            .get(index)
            .ok_or(EmulatorError::InvalidVoice(index))
    }

    fn voice_mut(&mut self, index: usize) -> Result<&mut Voice> {
        self.voices
            .get_mut(index)
            .ok_or(EmulatorError::InvalidVoice(index))
    }

    /// Current ADSR phase of a voice
    pub fn voice_phase(&self, index: usize) -> Result<EnvelopePhase> {
        Ok(self.voice(index)?.adsr.phase)
    }

    /// Visible envelope level of a voice (0..=1023)
    pub fn envelope_volume(&self, index: usize) -> Result<u16> {
        Ok(self.voice(index)?.envelope_level() as u16)
    }

    /// Key on a voice
    pub fn key_on(&mut self, index: usize) -> Result<()> {
        let Spu {
            voices, bank, ram, ..
        } = self;
        let voice = voices
            .get_mut(index)
            .ok_or(EmulatorError::InvalidVoice(index))?;
        voice.key_on(bank, ram);
        Ok(())
    }

    /// Key off a voice
    pub fn key_off(&mut self, index: usize) -> Result<()> {
        self.voice_mut(index)?.key_off();
        Ok(())
    }

    /// Apply a voice's loop address register as its loop point
    pub fn set_offset(&mut self, index: usize) -> Result<()> {
        self.voice_mut(index)?.set_loop_override();
        Ok(())
    }

    /// Bitfield of voices whose envelope is not Off
    pub fn channel_on(&self) -> u32 {
        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_off())
            .fold(0, |bits, (i, _)| bits | (1 << i))
    }

    /// Read a 16-bit SPU register
    ///
    /// # Arguments
    ///
    /// * `addr` - Physical address (0x1F801C00-0x1F801DFF)
    pub fn read_register(&self, addr: u32) -> u16 {
        let offset = (addr.wrapping_sub(SPU_BASE)) & 0x1FE;

        if let Some((index, reg)) = voice_register(offset) {
            let voice = &self.voices[index];
            let value = match reg {
                VOICE_VOLUME_LEFT => voice.volume_left.raw(),
                VOICE_VOLUME_RIGHT => voice.volume_right.raw(),
                VOICE_PITCH => voice.pitch,
                VOICE_START_ADDRESS => voice.start_address,
                VOICE_ADSR_LOW => voice.adsr.word_1(),
                VOICE_ADSR_HIGH => voice.adsr.word_2(),
                VOICE_CURRENT_ENVELOPE => (voice.envelope_level() << 5) as u16,
                _ => voice.loop_address,
            };
            log::trace!("SPU voice {} reg +0x{:X} read 0x{:04X}", index, reg, value);
            return value;
        }

        let value = match offset {
            MAIN_VOLUME_LEFT => self.main_volume_left.raw(),
            MAIN_VOLUME_RIGHT => self.main_volume_right.raw(),
            REVERB_DEPTH_LEFT => self.reverb_depth_left as u16,
            REVERB_DEPTH_RIGHT => self.reverb_depth_right as u16,
            FM_LOW => self.fm_on as u16,
            FM_HIGH => (self.fm_on >> 16) as u16,
            NOISE_LOW => self.noise_on as u16,
            NOISE_HIGH => (self.noise_on >> 16) as u16,
            REVERB_ON_LOW => self.reverb_on as u16,
            REVERB_ON_HIGH => (self.reverb_on >> 16) as u16,
            CHANNEL_ON_LOW => self.channel_on() as u16,
            CHANNEL_ON_HIGH => (self.channel_on() >> 16) as u16,
            REVERB_WORK_AREA => self.reverb_regs.work_area,
            TRANSFER_ADDRESS => (self.transfer_address / 8) as u16,
            CONTROL => self.control.bits(),
            STATUS => self.control.status_bits(),
            o if o >= REVERB_REGISTERS => {
                self.reverb_regs.regs[((o - REVERB_REGISTERS) / 2) as usize]
            }
            o => self.shadow[(o / 2) as usize],
        };

        log::trace!("SPU read 0x{:08X} = 0x{:04X}", addr, value);
        value
    }

    /// Write a 16-bit SPU register
    ///
    /// Key-on and key-off bits are latched here but acted on by the worker
    /// thread through [`SpuRequest::NoteOn`] / [`SpuRequest::NoteOff`].
    pub fn write_register(&mut self, addr: u32, value: u16) {
        let offset = (addr.wrapping_sub(SPU_BASE)) & 0x1FE;
        self.shadow[(offset / 2) as usize] = value;

        if let Some((index, reg)) = voice_register(offset) {
            log::trace!("SPU voice {} reg +0x{:X} = 0x{:04X}", index, reg, value);
            let voice = &mut self.voices[index];
            match reg {
                VOICE_VOLUME_LEFT => voice.volume_left.set(value),
                VOICE_VOLUME_RIGHT => voice.volume_right.set(value),
                VOICE_PITCH => voice.pitch = value,
                VOICE_START_ADDRESS => voice.start_address = value,
                VOICE_ADSR_LOW => voice.adsr.set_word_1(value),
                VOICE_ADSR_HIGH => voice.adsr.set_word_2(value),
                VOICE_CURRENT_ENVELOPE => {}
                _ => voice.loop_address = value,
            }
            return;
        }

        log::trace!("SPU write 0x{:08X} = 0x{:04X}", addr, value);

        match offset {
            MAIN_VOLUME_LEFT => self.main_volume_left.set(value),
            MAIN_VOLUME_RIGHT => self.main_volume_right.set(value),
            REVERB_DEPTH_LEFT => self.reverb_depth_left = value as i16,
            REVERB_DEPTH_RIGHT => self.reverb_depth_right = value as i16,
            FM_LOW => set_low(&mut self.fm_on, value),
            FM_HIGH => set_high(&mut self.fm_on, value),
            NOISE_LOW => set_low(&mut self.noise_on, value),
            NOISE_HIGH => set_high(&mut self.noise_on, value),
            REVERB_ON_LOW => set_low(&mut self.reverb_on, value),
            REVERB_ON_HIGH => set_high(&mut self.reverb_on, value),
            REVERB_WORK_AREA => self.reverb_regs.work_area = value,
            TRANSFER_ADDRESS => self.transfer_address = value as u32 * 8,
            TRANSFER_FIFO => self.write_dma4(value),
            CONTROL => {
                self.control = SpuControl::from_bits_retain(value);
                self.noise
                    .set_frequency(self.control.noise_shift(), self.control.noise_step());
                log::debug!("SPU control = 0x{:04X}", value);
            }
            o if o >= REVERB_REGISTERS => {
                self.reverb_regs.regs[((o - REVERB_REGISTERS) / 2) as usize] = value;
            }
            _ => {}
        }
    }

    /// Write one halfword through the transfer FIFO
    pub fn write_dma4(&mut self, value: u16) {
        let addr = self.transfer_address as usize & (SPU_RAM_SIZE - 1) & !1;
        self.ram[addr..addr + 2].copy_from_slice(&value.to_le_bytes());
        self.bank.invalidate(addr as u32..addr as u32 + 2);
        self.transfer_address = ((addr + 2) & (SPU_RAM_SIZE - 1)) as u32;
    }

    /// Read one halfword through the transfer FIFO
    pub fn read_dma4(&mut self) -> u16 {
        let addr = self.transfer_address as usize & (SPU_RAM_SIZE - 1) & !1;
        let value = u16::from_le_bytes([self.ram[addr], self.ram[addr + 1]]);
        self.transfer_address = ((addr + 2) & (SPU_RAM_SIZE - 1)) as u32;
        value
    }

    /// Bulk copy into sound RAM at the transfer address
    ///
    /// The copy wraps at the end of sound RAM.
    pub fn write_dma4_memory(&mut self, data: &[u8]) {
        let mut addr = self.transfer_address as usize & (SPU_RAM_SIZE - 1);
        let mut remaining = data;

        while !remaining.is_empty() {
            let len = remaining.len().min(SPU_RAM_SIZE - addr);
            let (chunk, rest) = remaining.split_at(len);
            self.ram[addr..addr + len].copy_from_slice(chunk);
            self.bank.invalidate(addr as u32..(addr + len) as u32);
            addr = (addr + len) & (SPU_RAM_SIZE - 1);
            remaining = rest;
        }

        log::debug!(
            "SPU DMA write of {} bytes at 0x{:05X}",
            data.len(),
            self.transfer_address
        );
        self.transfer_address = addr as u32;
    }

    /// Bulk copy out of sound RAM at the transfer address
    pub fn read_dma4_memory(&mut self, out: &mut [u8]) {
        let mut addr = self.transfer_address as usize & (SPU_RAM_SIZE - 1);

        let mut filled = 0;

        while filled < out.len() {
            let len = (out.len() - filled).min(SPU_RAM_SIZE - addr);
            out[filled..filled + len].copy_from_slice(&self.ram[addr..addr + len]);
            filled += len;
            addr = (addr + len) & (SPU_RAM_SIZE - 1);
        }

        log::debug!(
            "SPU DMA read of {} bytes at 0x{:05X}",
            out.len(),
            self.transfer_address
        );
        self.transfer_address = addr as u32;
    }

    /// Mix one stereo output frame
    pub fn mix_frame(&mut self) -> (i16, i16) {
        let noise_level = self.noise.tick();
        let filter = self.interpolation;

        let Spu {
            voices,
            bank,
            ram,
            fm_on,
            noise_on,
            reverb_on,
            ..
        } = self;

        let mut left: i64 = 0;
        let mut right: i64 = 0;
        let mut reverb_left: i32 = 0;
        let mut reverb_right: i32 = 0;
        let mut previous = 0;

        for (i, voice) in voices.iter_mut().enumerate() {
            let bit = 1u32 << i;
            let input = MixInput {
                filter,
                modulator: (i > 0 && *fm_on & bit != 0).then_some(previous),
                noise: (*noise_on & bit != 0).then_some(noise_level),
            };

            let sample = voice.render(bank, ram, input);
            previous = sample;

            voice.volume_left.tick();
            voice.volume_right.tick();
            if sample == 0 {
                continue;
            }

            let l = voice.volume_left.apply(sample);
            let r = voice.volume_right.apply(sample);
            left += l as i64;
            right += r as i64;

            if *reverb_on & bit != 0 {
                reverb_left += l;
                reverb_right += r;
            }
        }

        self.main_volume_left.tick();
        self.main_volume_right.tick();

        let mut out_left = clamp16(left * self.main_volume_left.level() as i64 / 0x4000);
        let mut out_right = clamp16(right * self.main_volume_right.level() as i64 / 0x4000);

        if self.reverb_enabled && self.control.contains(SpuControl::REVERB_MASTER) {
            let (rl, rr) = self.reverb.process(
                &self.reverb_regs,
                &mut self.ram,
                clamp16(reverb_left as i64),
                clamp16(reverb_right as i64),
            );
            out_left += rl * self.reverb_depth_left as i32 / 0x8000;
            out_right += rr * self.reverb_depth_right as i32 / 0x8000;
        }

        self.frames += 1;

        if !self.control.contains(SpuControl::UNMUTE) {
            return (0, 0);
        }

        (clamp16(out_left as i64) as i16, clamp16(out_right as i64) as i16)
    }

    /// Mix `frames` frames into interleaved stereo
    pub fn render(&mut self, frames: usize, out: &mut Vec<i16>) {
        out.reserve(frames * 2);
        for _ in 0..frames {
            let (l, r) = self.mix_frame();
            out.push(l);
            out.push(r);
        }
    }
}

impl Default for Spu {
    fn default() -> Self {
        Self::new()
    }
}

#[inline(always)]
fn clamp16(v: i64) -> i32 {
    v.clamp(i16::MIN as i64, i16::MAX as i64) as i32
}

#[inline(always)]
fn set_low(bits: &mut u32, value: u16) {
    *bits = (*bits & 0xFFFF_0000) | value as u32;
}

#[inline(always)]
fn set_high(bits: &mut u32, value: u16) {
    *bits = (*bits & 0x0000_FFFF) | ((value as u32 & 0xFF) << 16);
}
