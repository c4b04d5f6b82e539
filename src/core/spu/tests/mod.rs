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

//! SPU tests
//!
//! - Envelope state machine and ADPCM decoding
//! - Interpolation filters and voice mixing
//! - Register bank, DMA and reverb
//! - Worker rendezvous

use super::*;

mod adpcm;
mod bridge;
mod reverb;

/// Nibbles of a four-sample waveform
const WAVE_NIBBLES: [i8; 4] = [1, 3, -2, -4];

/// The waveform decoded with shift 4 and filter 0
const WAVE: [i32; 4] = [256, 768, -512, -1024];

/// Build one filter-0 ADPCM block from up to 28 signed nibbles
fn block(shift: u8, flags: u8, nibbles: &[i8]) -> [u8; 16] {
    let mut b = [0u8; 16];
    b[0] = shift & 0xF;
    b[1] = flags;
    for (i, pair) in nibbles.chunks(2).take(14).enumerate() {
        let lo = pair[0] as u8 & 0xF;
        let hi = pair.get(1).map_or(0, |&n| n as u8 & 0xF);
        b[2 + i] = lo | (hi << 4);
    }
    b
}

/// One block holding the waveform seven times, looping onto itself
fn looping_wave_block() -> [u8; 16] {
    let nibbles: Vec<i8> = WAVE_NIBBLES.iter().copied().cycle().take(28).collect();
    block(4, 0x07, &nibbles)
}

/// Unmuted SPU with unity main volume, no interpolation and no reverb
fn unmuted_spu() -> Spu {
    let mut spu = Spu::new();
    spu.set_interpolation(Interpolation::None);
    spu.write_register(
        SPU_BASE + CONTROL,
        (SpuControl::ENABLE | SpuControl::UNMUTE).bits(),
    );
    spu.write_register(SPU_BASE + MAIN_VOLUME_LEFT, 0x3FFF);
    spu.write_register(SPU_BASE + MAIN_VOLUME_RIGHT, 0x3FFF);
    spu
}

/// Copy bytes into sound RAM at a byte address
fn upload(spu: &mut Spu, addr: u32, data: &[u8]) {
    spu.write_register(SPU_BASE + TRANSFER_ADDRESS, (addr / 8) as u16);
    spu.write_dma4_memory(data);
}

/// Point a voice at a sample with unity pitch, full volume and an
/// envelope that reaches its ceiling within three samples and holds it
fn setup_voice(spu: &mut Spu, voice: usize, addr: u32) {
    let base = SPU_BASE + voice as u32 * 0x10;
    spu.write_register(base + VOICE_VOLUME_LEFT, 0x3FFF);
    spu.write_register(base + VOICE_VOLUME_RIGHT, 0x3FFF);
    spu.write_register(base + VOICE_PITCH, 0x1000);
    spu.write_register(base + VOICE_START_ADDRESS, (addr / 8) as u16);
    spu.write_register(base + VOICE_ADSR_LOW, 0x00FF);
    spu.write_register(base + VOICE_ADSR_HIGH, 0x1FC0);
}

/// Expected output of one voice sample at full envelope and unity volumes
fn unity(sample: i32) -> i16 {
    let voice = sample * 0x3FFF / 0x4000;
    (voice as i64 * 0x3FFF / 0x4000) as i16
}
