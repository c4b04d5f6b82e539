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

//! SPU noise generator
//!
//! Voices with their noise bit set play the output of a single shared
//! Linear Feedback Shift Register (LFSR) instead of their sample data. The
//! generator is clocked from the noise shift/step fields of SPUCNT.

/// Noise generator using LFSR
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    /// LFSR state
    lfsr: u16,

    /// Noise clock frequency shift (0-15)
    clock_shift: u8,

    /// Noise clock step (0-3)
    clock_step: u8,

    /// Frequency divider accumulator
    counter: i32,
}

impl NoiseGenerator {
    pub fn new() -> Self {
        Self {
            lfsr: 0x0001,
            clock_shift: 0,
            clock_step: 0,
            counter: 0,
        }
    }

    /// Set noise frequency parameters from SPUCNT
    ///
    /// # Arguments
    ///
    /// * `shift` - Frequency shift value (0-15)
    /// * `step` - Frequency step selector (0-3)
    pub fn set_frequency(&mut self, shift: u8, step: u8) {
        self.clock_shift = shift & 0xF;
        self.clock_step = step & 0x3;
    }

    /// Advance the generator by one output sample
    ///
    /// # Returns
    ///
    /// The current noise level, either 0x7FFF or -0x8000
    #[inline(always)]
    pub fn tick(&mut self) -> i32 {
        // Step values 4-7 are encoded as 0-3
        self.counter += (self.clock_step as i32) + 4;
        let period = 0x20000 >> self.clock_shift;

        while self.counter >= period {
            self.counter -= period;
            self.step_lfsr();
        }

        self.output()
    }

    /// Current output level without advancing
    #[inline(always)]
    pub fn output(&self) -> i32 {
        if self.lfsr & 0x8000 != 0 {
            0x7FFF
        } else {
            -0x8000
        }
    }

    /// Step the LFSR by one tick
    ///
    /// Feedback taps at bits 15, 12, 11 and 10.
    pub(crate) fn step_lfsr(&mut self) {
        let feedback =
            ((self.lfsr >> 15) ^ (self.lfsr >> 12) ^ (self.lfsr >> 11) ^ (self.lfsr >> 10) ^ 1) & 1;
        self.lfsr = (self.lfsr << 1) | feedback;
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}
