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

//! Voice and main volume registers
//!
//! A volume register either holds a fixed level or describes a sweep that
//! moves the level once per output sample.
//!
//! ```text
//! Fixed  (bit 15 = 0): bit 14 phase invert, bits 13-0 level
//! Sweep  (bit 15 = 1): bit 14 exponential, bit 13 decrease,
//!                      bit 12 phase, bits 6-0 rate
//! ```

use super::adsr::ramp;

/// Largest effective volume (unity is 0x4000)
pub const VOLUME_MAX: i32 = 0x3FFF;

/// A volume register plus its live level
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepVolume {
    /// Raw register value
    raw: u16,

    /// Live sweep state, 32-bit like the ADSR envelope
    sweep: i32,

    /// Current level (0..=0x3FFF)
    level: i32,
}

impl SweepVolume {
    /// Load a new register value
    pub fn set(&mut self, value: u16) {
        self.raw = value;

        if self.is_sweep() {
            // Sweeps start from the level currently in effect
            self.sweep = self.level << 17;
        } else {
            self.level = if value & 0x4000 != 0 {
                VOLUME_MAX - (value as i32 & 0x3FFF)
            } else {
                value as i32 & 0x3FFF
            };
        }
    }

    /// Raw register value
    pub fn raw(&self) -> u16 {
        self.raw
    }

    /// Current level (0..=0x3FFF)
    #[inline(always)]
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Whether the register describes a sweep
    pub fn is_sweep(&self) -> bool {
        self.raw & 0x8000 != 0
    }

    /// Advance a sweep by one sample; fixed volumes are untouched
    #[inline(always)]
    pub fn tick(&mut self) {
        if !self.is_sweep() {
            return;
        }

        let exponential = self.raw & 0x4000 != 0;
        let decrease = self.raw & 0x2000 != 0;
        let rate = (self.raw & 0x7F) as u8;

        self.sweep = ramp(self.sweep, rate, exponential, decrease);
        self.level = (self.sweep >> 17).clamp(0, VOLUME_MAX);
    }

    /// Scale a sample by this volume (unity = 0x4000)
    #[inline(always)]
    pub fn apply(&self, sample: i32) -> i32 {
        sample * self.level / 0x4000
    }
}
