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

//! ADSR (Attack, Decay, Sustain, Release) envelope generator
//!
//! Each voice carries a 32-bit envelope in the range 0..=0x7FFFFFFF. Every
//! output sample advances it by one step taken from the shared rate table;
//! only the top 11 bits are ever visible outside the voice.
//!
//! ```text
//! Off -> Attack -> Decay -> Sustain --key off--> Release -> Off
//! ```
//!
//! Key-off moves any active phase to Release.

use std::sync::OnceLock;

/// Envelope ceiling
pub const ENVELOPE_MAX: i32 = 0x7FFF_FFFF;

/// Number of rate table entries
const RATE_TABLE_SIZE: usize = 160;

/// Exponential step offsets selected by the top envelope bits
const EXP_OFFSETS: [usize; 8] = [0, 4, 6, 8, 9, 10, 11, 12];

static RATE_TABLE: OnceLock<[i32; RATE_TABLE_SIZE]> = OnceLock::new();

/// Shared envelope rate table
///
/// The first 32 entries are zero. From there the step starts at 3 and grows
/// geometrically, doubling its increment every four entries, saturating at
/// 0x3FFFFFFF.
pub fn rate_table() -> &'static [i32; RATE_TABLE_SIZE] {
    RATE_TABLE.get_or_init(|| {
        let mut table = [0i32; RATE_TABLE_SIZE];
        let mut rate: i64 = 3;
        let mut increment: i64 = 1;
        let mut count = 0;

        for entry in table.iter_mut().skip(32) {
            if rate < 0x3FFF_FFFF {
                rate += increment;
                count += 1;
                if count == 5 {
                    count = 1;
                    increment *= 2;
                }
            }
            rate = rate.min(0x3FFF_FFFF);
            *entry = rate as i32;
        }

        table
    })
}

#[inline(always)]
fn rate(index: usize) -> i64 {
    rate_table()[index.min(RATE_TABLE_SIZE - 1)] as i64
}

#[inline(always)]
fn exp_offset(envelope: i64) -> usize {
    EXP_OFFSETS[((envelope >> 28) & 0x7) as usize]
}

/// One step of a sustain-style ramp
///
/// Shared by the sustain phase and by swept volumes.
///
/// # Arguments
///
/// * `envelope` - Current 32-bit level
/// * `rate_code` - 7-bit rate
/// * `exponential` - Curve selector
/// * `decrease` - Ramp direction
///
/// # Returns
///
/// New level clamped to 0..=ENVELOPE_MAX
pub fn ramp(envelope: i32, rate_code: u8, exponential: bool, decrease: bool) -> i32 {
    let env = envelope as i64;
    let code = ((rate_code ^ 0x7F) & 0x7F) as usize;

    let next = if decrease {
        if exponential {
            env - rate(code + 32 + exp_offset(env) - 0x1B)
        } else {
            env - rate(code + 32 - 0x0F)
        }
    } else if exponential && env >= 0x6000_0000 {
        env + rate(code + 32 - 0x18)
    } else {
        env + rate(code + 32 - 0x10)
    };

    next.clamp(0, ENVELOPE_MAX as i64) as i32
}

/// Envelope phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopePhase {
    /// Silent; the voice is not mixed
    #[default]
    Off,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// ADSR envelope generator
#[derive(Debug, Clone, Default)]
pub struct AdsrEnvelope {
    pub attack_exponential: bool,
    pub attack_rate: u8,
    pub decay_rate: u8,
    pub sustain_level: u8,
    pub sustain_exponential: bool,
    pub sustain_decrease: bool,
    pub sustain_rate: u8,
    pub release_exponential: bool,
    pub release_rate: u8,

    /// Current phase
    pub phase: EnvelopePhase,

    /// Current 32-bit envelope (0..=0x7FFFFFFF)
    pub envelope: i32,
}

impl AdsrEnvelope {
    /// Start the attack phase from silence
    pub fn key_on(&mut self) {
        self.phase = EnvelopePhase::Attack;
        self.envelope = 0;
    }

    /// Enter the release phase from any active phase
    pub fn key_off(&mut self) {
        if self.phase != EnvelopePhase::Off {
            self.phase = EnvelopePhase::Release;
        }
    }

    /// Force the envelope silent
    pub fn silence(&mut self) {
        self.phase = EnvelopePhase::Off;
        self.envelope = 0;
    }

    /// Visible envelope level (top 11 bits, 0..=1023)
    #[inline(always)]
    pub fn level(&self) -> i32 {
        self.envelope >> 21
    }

    /// Advance the envelope by one sample
    pub fn tick(&mut self) {
        let env = self.envelope as i64;

        match self.phase {
            EnvelopePhase::Off => {}
            EnvelopePhase::Attack => {
                let code = ((self.attack_rate ^ 0x7F) & 0x7F) as usize;
                let step = if self.attack_exponential && env >= 0x6000_0000 {
                    rate(code + 32 - 0x18)
                } else {
                    rate(code + 32 - 0x10)
                };

                let next = env + step;
                if next > ENVELOPE_MAX as i64 {
                    self.envelope = ENVELOPE_MAX;
                    self.phase = EnvelopePhase::Decay;
                } else {
                    self.envelope = next as i32;
                }
            }
            EnvelopePhase::Decay => {
                let code = 4 * ((self.decay_rate ^ 0x1F) & 0x1F) as usize;
                let next = (env - rate(code + 32 + exp_offset(env) - 0x18)).max(0);
                self.envelope = next as i32;

                if ((next >> 27) & 0xF) as u8 <= self.sustain_level {
                    self.phase = EnvelopePhase::Sustain;
                }
            }
            EnvelopePhase::Sustain => {
                self.envelope = ramp(
                    self.envelope,
                    self.sustain_rate,
                    self.sustain_exponential,
                    self.sustain_decrease,
                );
            }
            EnvelopePhase::Release => {
                let code = 4 * ((self.release_rate ^ 0x1F) & 0x1F) as usize;
                let step = if self.release_exponential {
                    rate(code + 32 + exp_offset(env) - 0x18)
                } else {
                    rate(code + 32 - 0x0C)
                };

                let next = env - step;
                if next <= 0 {
                    self.silence();
                } else {
                    self.envelope = next as i32;
                }
            }
        }
    }

    /// Load ADSR configuration from register format (voice +0x8)
    ///
    /// ```text
    /// Bit   15:   Attack Mode (0=Linear, 1=Exponential)
    /// Bits  14-8: Attack Rate
    /// Bits  7-4:  Decay Rate
    /// Bits  3-0:  Sustain Level
    /// ```
    pub fn set_word_1(&mut self, value: u16) {
        self.attack_exponential = value & 0x8000 != 0;
        self.attack_rate = ((value >> 8) & 0x7F) as u8;
        self.decay_rate = ((value >> 4) & 0xF) as u8;
        self.sustain_level = (value & 0xF) as u8;
    }

    /// Load ADSR configuration from register format (voice +0xA)
    ///
    /// ```text
    /// Bit   15:   Sustain Mode (0=Linear, 1=Exponential)
    /// Bit   14:   Sustain Direction (0=Increase, 1=Decrease)
    /// Bits  12-6: Sustain Rate
    /// Bit   5:    Release Mode (0=Linear, 1=Exponential)
    /// Bits  4-0:  Release Rate
    /// ```
    pub fn set_word_2(&mut self, value: u16) {
        self.sustain_exponential = value & 0x8000 != 0;
        self.sustain_decrease = value & 0x4000 != 0;
        self.sustain_rate = ((value >> 6) & 0x7F) as u8;
        self.release_exponential = value & 0x20 != 0;
        self.release_rate = (value & 0x1F) as u8;
    }

    /// Register value for voice +0x8
    pub fn word_1(&self) -> u16 {
        (u16::from(self.attack_exponential) << 15)
            | (u16::from(self.attack_rate & 0x7F) << 8)
            | (u16::from(self.decay_rate & 0xF) << 4)
            | u16::from(self.sustain_level & 0xF)
    }

    /// Register value for voice +0xA
    pub fn word_2(&self) -> u16 {
        (u16::from(self.sustain_exponential) << 15)
            | (u16::from(self.sustain_decrease) << 14)
            | (u16::from(self.sustain_rate & 0x7F) << 6)
            | (u16::from(self.release_exponential) << 5)
            | u16::from(self.release_rate & 0x1F)
    }
}
