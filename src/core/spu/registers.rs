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

//! SPU register map and control flags
//!
//! Offsets are relative to the start of the SPU bank at 0x1F801C00.
//! Voice registers occupy 16 bytes per voice for the 24 voices; the global
//! block follows at 0x180.

use bitflags::bitflags;

/// Number of hardware voices
pub const VOICE_COUNT: usize = 24;

/// Base physical address of the SPU register bank
pub const SPU_BASE: u32 = 0x1F80_1C00;

/// Last physical address of the SPU register bank
pub const SPU_END: u32 = 0x1F80_1DFF;

/// SPU RAM size (512KB)
pub const SPU_RAM_SIZE: usize = 512 * 1024;

// Per-voice register offsets (relative to the voice block)
pub const VOICE_VOLUME_LEFT: u32 = 0x0;
pub const VOICE_VOLUME_RIGHT: u32 = 0x2;
pub const VOICE_PITCH: u32 = 0x4;
pub const VOICE_START_ADDRESS: u32 = 0x6;
pub const VOICE_ADSR_LOW: u32 = 0x8;
pub const VOICE_ADSR_HIGH: u32 = 0xA;
pub const VOICE_CURRENT_ENVELOPE: u32 = 0xC;
pub const VOICE_LOOP_ADDRESS: u32 = 0xE;

// Global register offsets
pub const MAIN_VOLUME_LEFT: u32 = 0x180;
pub const MAIN_VOLUME_RIGHT: u32 = 0x182;
pub const REVERB_DEPTH_LEFT: u32 = 0x184;
pub const REVERB_DEPTH_RIGHT: u32 = 0x186;
pub const KEY_ON_LOW: u32 = 0x188;
pub const KEY_ON_HIGH: u32 = 0x18A;
pub const KEY_OFF_LOW: u32 = 0x18C;
pub const KEY_OFF_HIGH: u32 = 0x18E;
pub const FM_LOW: u32 = 0x190;
pub const FM_HIGH: u32 = 0x192;
pub const NOISE_LOW: u32 = 0x194;
pub const NOISE_HIGH: u32 = 0x196;
pub const REVERB_ON_LOW: u32 = 0x198;
pub const REVERB_ON_HIGH: u32 = 0x19A;
pub const CHANNEL_ON_LOW: u32 = 0x19C;
pub const CHANNEL_ON_HIGH: u32 = 0x19E;
pub const REVERB_WORK_AREA: u32 = 0x1A2;
pub const IRQ_ADDRESS: u32 = 0x1A4;
pub const TRANSFER_ADDRESS: u32 = 0x1A6;
pub const TRANSFER_FIFO: u32 = 0x1A8;
pub const CONTROL: u32 = 0x1AA;
pub const TRANSFER_CONTROL: u32 = 0x1AC;
pub const STATUS: u32 = 0x1AE;

/// First reverb coefficient/offset register (dAPF1)
pub const REVERB_REGISTERS: u32 = 0x1C0;

/// Number of reverb coefficient/offset registers
pub const REVERB_REGISTER_COUNT: usize = 32;

bitflags! {
    /// SPU control register (0x1F801DAA)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SpuControl: u16 {
        const ENABLE = 1 << 15;
        const UNMUTE = 1 << 14;
        const NOISE_SHIFT = 0xF << 10;
        const NOISE_STEP = 0x3 << 8;
        const REVERB_MASTER = 1 << 7;
        const IRQ_ENABLE = 1 << 6;
        const TRANSFER_MODE = 0x3 << 4;
        const EXTERNAL_REVERB = 1 << 3;
        const CD_REVERB = 1 << 2;
        const EXTERNAL_AUDIO = 1 << 1;
        const CD_AUDIO = 1 << 0;
    }
}

impl SpuControl {
    /// Noise clock shift (bits 13-10)
    pub fn noise_shift(self) -> u8 {
        ((self.bits() >> 10) & 0xF) as u8
    }

    /// Noise clock step (bits 9-8)
    pub fn noise_step(self) -> u8 {
        ((self.bits() >> 8) & 0x3) as u8
    }

    /// Status register view (mirrors control bits 5-0)
    pub fn status_bits(self) -> u16 {
        self.bits() & 0x3F
    }
}

/// Resolve a bank offset to a voice index and per-voice register offset
#[inline]
pub fn voice_register(offset: u32) -> Option<(usize, u32)> {
    let voice = (offset / 0x10) as usize;
    if voice < VOICE_COUNT {
        Some((voice, offset & 0xF))
    } else {
        None
    }
}
