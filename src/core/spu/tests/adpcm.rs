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

//! ADPCM block decoding and instrument cache tests

use super::{block, looping_wave_block, WAVE, WAVE_NIBBLES};
use crate::core::spu::adpcm::{AdpcmDecoder, BlockFlags, BLOCK_SIZE, SAMPLES_PER_BLOCK};
use crate::core::spu::instrument::{Instrument, SoundBank};

#[test]
fn test_block_flags() {
    assert_eq!(BlockFlags::from_byte(0x00), BlockFlags::default());

    let flags = BlockFlags::from_byte(0x07);
    assert!(flags.end && flags.repeat && flags.loop_start);

    let flags = BlockFlags::from_byte(0x01);
    assert!(flags.end);
    assert!(!flags.repeat);
    assert!(!flags.loop_start);
}

#[test]
fn test_decode_filter_zero() {
    let mut decoder = AdpcmDecoder::default();
    let mut out = Vec::new();

    let flags = decoder.decode_block(&looping_wave_block(), &mut out);

    assert_eq!(out.len(), SAMPLES_PER_BLOCK);
    for (i, &s) in out.iter().enumerate() {
        assert_eq!(s as i32, WAVE[i % 4], "sample {}", i);
    }
    assert_eq!(flags, BlockFlags::from_byte(0x07));
}

#[test]
fn test_decode_filter_one_predicts() {
    let mut b = block(12, 0, &[7]);
    b[0] |= 0x10;

    let mut decoder = AdpcmDecoder::default();
    let mut out = Vec::new();
    decoder.decode_block(&b, &mut out);

    // 7 followed by zero nibbles: (7 * 60 + 32) >> 6 keeps predicting 7
    assert!(out.iter().all(|&s| s == 7));
}

#[test]
fn test_decode_large_shift_treated_as_nine() {
    let mut a = Vec::new();
    let mut b = Vec::new();
    AdpcmDecoder::default().decode_block(&block(9, 0, &WAVE_NIBBLES), &mut a);
    AdpcmDecoder::default().decode_block(&block(15, 0, &WAVE_NIBBLES), &mut b);

    assert_eq!(a, b);
    assert_eq!(&a[..4], &[8, 24, -16, -32]);
}

#[test]
fn test_decode_short_block_is_end() {
    let mut out = Vec::new();
    let flags = AdpcmDecoder::default().decode_block(&[0u8; 4], &mut out);

    assert!(flags.end);
    assert!(out.is_empty());
}

#[test]
fn test_instrument_loop_point_and_end() {
    let mut ram = vec![0u8; 0x100];
    ram[0x10..0x20].copy_from_slice(&block(4, 0x00, &WAVE_NIBBLES));
    ram[0x20..0x30].copy_from_slice(&block(4, 0x04, &WAVE_NIBBLES));
    ram[0x30..0x40].copy_from_slice(&block(4, 0x03, &WAVE_NIBBLES));
    // Never reached: decoding stops at the end flag
    ram[0x40..0x50].copy_from_slice(&block(4, 0x00, &WAVE_NIBBLES));

    let inst = Instrument::decode(&ram, 0x10);

    assert_eq!(inst.start(), 0x10);
    assert_eq!(inst.span(), 0x10..0x40);
    assert_eq!(inst.len(), 3 * SAMPLES_PER_BLOCK);
    assert_eq!(inst.blocks(), 3);
    assert_eq!(inst.loop_offset(), SAMPLES_PER_BLOCK);
    assert!(inst.repeats());
    assert_eq!(inst.sample(1), Some(768));
    assert_eq!(inst.sample(3 * SAMPLES_PER_BLOCK), None);
}

#[test]
fn test_instrument_without_end_flag_stops_at_ram_end() {
    let ram = vec![0u8; 4 * BLOCK_SIZE];
    let inst = Instrument::decode(&ram, 0x10);

    assert_eq!(inst.blocks(), 3);
    assert!(!inst.repeats());
    assert_eq!(inst.loop_offset(), 0);
}

#[test]
fn test_instrument_start_is_block_aligned() {
    let mut ram = vec![0u8; 0x40];
    ram[0x10..0x20].copy_from_slice(&block(4, 0x01, &WAVE_NIBBLES));

    assert_eq!(Instrument::decode(&ram, 0x17).start(), 0x10);
}

#[test]
fn test_sound_bank_caches_and_invalidates() {
    let mut ram = vec![0u8; 0x100];
    ram[0x10..0x20].copy_from_slice(&block(4, 0x01, &WAVE_NIBBLES));
    ram[0x80..0x90].copy_from_slice(&block(4, 0x01, &WAVE_NIBBLES));

    let mut bank = SoundBank::new();
    let first = bank.instrument(&ram, 0x10);
    let again = bank.instrument(&ram, 0x10);
    assert!(std::sync::Arc::ptr_eq(&first, &again));

    bank.instrument(&ram, 0x80);
    assert_eq!(bank.len(), 2);

    // Overlaps the first instrument only
    bank.invalidate(0x18..0x19);
    assert_eq!(bank.len(), 1);

    // Touching the end boundary does not overlap
    bank.invalidate(0x90..0xA0);
    assert_eq!(bank.len(), 1);

    bank.clear();
    assert!(bank.is_empty());
}
