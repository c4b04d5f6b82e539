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

//! SPU reverb
//!
//! The reverb is a set of delay lines living in a work area at the top of
//! SPU RAM, driven by 32 offset/coefficient registers at 0x1F801DC0. It runs
//! at half the output rate: every second output sample the averaged input
//! pair is processed, and the result is held for two output samples.
//!
//! All multiplies are `a * v / 0x8000`, truncating toward zero, and every
//! write into the work area saturates to 16 bits.

use super::registers::{REVERB_REGISTER_COUNT, SPU_RAM_SIZE};

/// Reverb register indices, in bank order from 0x1F801DC0
#[allow(dead_code)]
pub mod reg {
    pub const D_APF1: usize = 0;
    pub const D_APF2: usize = 1;
    pub const V_IIR: usize = 2;
    pub const V_COMB1: usize = 3;
    pub const V_COMB2: usize = 4;
    pub const V_COMB3: usize = 5;
    pub const V_COMB4: usize = 6;
    pub const V_WALL: usize = 7;
    pub const V_APF1: usize = 8;
    pub const V_APF2: usize = 9;
    pub const M_LSAME: usize = 10;
    pub const M_RSAME: usize = 11;
    pub const M_LCOMB1: usize = 12;
    pub const M_RCOMB1: usize = 13;
    pub const M_LCOMB2: usize = 14;
    pub const M_RCOMB2: usize = 15;
    pub const D_LSAME: usize = 16;
    pub const D_RSAME: usize = 17;
    pub const M_LDIFF: usize = 18;
    pub const M_RDIFF: usize = 19;
    pub const M_LCOMB3: usize = 20;
    pub const M_RCOMB3: usize = 21;
    pub const M_LCOMB4: usize = 22;
    pub const M_RCOMB4: usize = 23;
    pub const D_LDIFF: usize = 24;
    pub const D_RDIFF: usize = 25;
    pub const M_LAPF1: usize = 26;
    pub const M_RAPF1: usize = 27;
    pub const M_LAPF2: usize = 28;
    pub const M_RAPF2: usize = 29;
    pub const V_LIN: usize = 30;
    pub const V_RIN: usize = 31;
}

/// Reverb register file
#[derive(Debug, Clone, Default)]
pub struct ReverbRegisters {
    /// Offset/coefficient registers, see [`reg`]
    pub regs: [u16; REVERB_REGISTER_COUNT],

    /// Work area start register (multiply by 8 for byte address)
    pub work_area: u16,
}

impl ReverbRegisters {
    /// Coefficient register as a signed volume
    #[inline(always)]
    pub fn volume(&self, index: usize) -> i32 {
        self.regs[index] as i16 as i32
    }

    /// Offset register as a byte distance
    #[inline(always)]
    pub fn offset(&self, index: usize) -> i64 {
        self.regs[index] as i64 * 8
    }

    /// Work area start as a byte address
    pub fn base(&self) -> u32 {
        self.work_area as u32 * 8
    }
}

/// A reverb processing strategy
///
/// Implementations read their parameters from the register file and keep
/// their delay lines in SPU RAM.
pub trait ReverbUnit: Send {
    /// Feed one stereo input sample and return one stereo output sample
    fn process(
        &mut self,
        regs: &ReverbRegisters,
        ram: &mut [u8],
        left: i32,
        right: i32,
    ) -> (i32, i32);

    /// Return to the power-on state
    fn reset(&mut self);
}

#[inline(always)]
fn mul(a: i32, v: i32) -> i32 {
    ((a as i64 * v as i64) / 0x8000) as i32
}

#[inline(always)]
fn saturate(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// The hardware reverb algorithm
#[derive(Debug, Clone, Default)]
pub struct PsxReverb {
    /// Current buffer byte address inside the work area
    current: u32,

    /// First input sample of the pending pair
    pending: Option<(i32, i32)>,

    /// Output held between 22.05kHz steps
    held: (i32, i32),
}

impl PsxReverb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current buffer byte address
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Resolve a byte offset relative to the current buffer address
    fn address(&self, base: u32, offset: i64) -> usize {
        let size = SPU_RAM_SIZE as i64 - base as i64;
        if size <= 0 {
            return SPU_RAM_SIZE - 2;
        }
        let rel = (self.current as i64 - base as i64 + offset).rem_euclid(size);
        ((base as i64 + rel) as usize) & !1
    }

    fn load(&self, ram: &[u8], base: u32, offset: i64) -> i32 {
        let a = self.address(base, offset);
        i16::from_le_bytes([ram[a], ram[a + 1]]) as i32
    }

    fn store(&self, ram: &mut [u8], base: u32, offset: i64, value: i32) {
        let a = self.address(base, offset);
        ram[a..a + 2].copy_from_slice(&saturate(value).to_le_bytes());
    }

    /// One 22.05kHz step
    fn step(&mut self, r: &ReverbRegisters, ram: &mut [u8], left: i32, right: i32) -> (i32, i32) {
        use reg::*;

        let base = r.base();
        if self.current < base || self.current as usize >= SPU_RAM_SIZE {
            self.current = base;
        }

        let v_iir = r.volume(V_IIR);
        let v_wall = r.volume(V_WALL);
        let l_in = mul(left, r.volume(V_LIN));
        let r_in = mul(right, r.volume(V_RIN));

        // Same-side and cross-side reflections through the IIR
        let reflections = [
            (M_LSAME, D_LSAME, l_in),
            (M_RSAME, D_RSAME, r_in),
            (M_LDIFF, D_RDIFF, l_in),
            (M_RDIFF, D_LDIFF, r_in),
        ];
        for (dest, src, input) in reflections {
            let wall = mul(self.load(ram, base, r.offset(src)), v_wall);
            let previous = self.load(ram, base, r.offset(dest) - 2);
            let value = mul(input + wall, v_iir) + mul(previous, 0x8000 - v_iir);
            self.store(ram, base, r.offset(dest), value);
        }

        let mut out = [0i32; 2];
        let sides = [
            ([M_LCOMB1, M_LCOMB2, M_LCOMB3, M_LCOMB4], M_LAPF1, M_LAPF2),
            ([M_RCOMB1, M_RCOMB2, M_RCOMB3, M_RCOMB4], M_RAPF1, M_RAPF2),
        ];
        for (side, (combs, apf1, apf2)) in sides.into_iter().enumerate() {
            let mut acc: i32 = combs
                .iter()
                .zip([V_COMB1, V_COMB2, V_COMB3, V_COMB4])
                .map(|(&m, v)| mul(self.load(ram, base, r.offset(m)), r.volume(v)))
                .sum();

            for (m, d, v) in [(apf1, D_APF1, V_APF1), (apf2, D_APF2, V_APF2)] {
                let delayed = self.load(ram, base, r.offset(m) - r.offset(d));
                let vol = r.volume(v);
                acc -= mul(delayed, vol);
                self.store(ram, base, r.offset(m), acc);
                acc = mul(saturate(acc) as i32, vol) + delayed;
            }

            out[side] = saturate(acc) as i32;
        }

        self.current += 2;
        if self.current as usize >= SPU_RAM_SIZE {
            self.current = base;
        }

        (out[0], out[1])
    }
}

impl ReverbUnit for PsxReverb {
    fn process(
        &mut self,
        regs: &ReverbRegisters,
        ram: &mut [u8],
        left: i32,
        right: i32,
    ) -> (i32, i32) {
        match self.pending.take() {
            None => self.pending = Some((left, right)),
            Some((l0, r0)) => {
                self.held = self.step(regs, ram, (l0 + left) / 2, (r0 + right) / 2);
            }
        }
        self.held
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
