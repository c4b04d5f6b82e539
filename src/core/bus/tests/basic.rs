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

use super::*;
use crate::core::interrupt::Irq;
use crate::core::timer::{PSXCLK, SAMPLE_PERIOD};

#[test]
fn test_ram_fall_through_and_mirrors() {
    let (mut bus, _) = test_bus();
    bus.write::<u32>(0x8000_0100, 0xDEAD_BEEF).unwrap();

    assert_eq!(bus.read::<u32>(0x0000_0100), 0xDEAD_BEEF);
    assert_eq!(bus.read::<u32>(0xA000_0100), 0xDEAD_BEEF);
    assert_eq!(bus.read::<u16>(0x8000_0102), 0xDEAD);
    assert_eq!(bus.read::<u8>(0x8000_0100), 0xEF);
}

#[test]
fn test_scratchpad_is_plain_memory() {
    let (mut bus, _) = test_bus();
    bus.write::<u32>(0x1F80_0010, 0x1234_5678).unwrap();
    assert_eq!(bus.read::<u32>(0x1F80_0010), 0x1234_5678);
}

#[test]
fn test_unrouted_register_backed_by_memory() {
    let (mut bus, _) = test_bus();
    // Memory control register, not owned by any device
    bus.write::<u32>(0x1F80_1010, 0x0013_243F).unwrap();
    assert_eq!(bus.read::<u32>(0x1F80_1010), 0x0013_243F);
}

#[test]
fn test_irq_status_write_clears_masked_bits() {
    let (mut bus, _) = test_bus();
    bus.irq_mut().request(Irq::VBLANK | Irq::TIMER0 | Irq::DMA);
    bus.write::<u32>(Bus::I_MASK, 0x11).unwrap();

    bus.write::<u32>(Bus::I_STAT, 0x01).unwrap();
    assert_eq!(bus.read::<u32>(Bus::I_STAT), 0x18);

    // DMA is not enabled in the mask, so writing its bit leaves it set
    bus.write::<u32>(Bus::I_STAT, 0x08).unwrap();
    assert_eq!(bus.read::<u32>(Bus::I_STAT), 0x18);

    bus.write::<u16>(Bus::I_STAT, 0x10).unwrap();
    assert_eq!(bus.read::<u32>(Bus::I_STAT), 0x08);
}

#[test]
fn test_irq_mask_byte_write_merges() {
    let (mut bus, _) = test_bus();
    bus.write::<u32>(Bus::I_MASK, 0x11).unwrap();
    bus.write::<u8>(Bus::I_MASK + 1, 0x02).unwrap();

    assert_eq!(bus.read::<u32>(Bus::I_MASK), 0x0211);
    assert_eq!(bus.read::<u8>(Bus::I_MASK + 1), 0x02);
}

#[test]
fn test_timer_registers() {
    let (mut bus, _) = test_bus();

    bus.write::<u32>(0x1F80_1100, 0x0100).unwrap();
    assert_eq!(bus.read::<u32>(0x1F80_1100), 0x0100);

    bus.write::<u32>(0x1F80_1118, 0x1234).unwrap();
    assert_eq!(bus.counters().read_target(1), 0x1234);
    assert_eq!(bus.read::<u16>(0x1F80_1118), 0x1234);

    bus.write::<u16>(0x1F80_1124, 0x0058).unwrap();
    assert_eq!(bus.counters().read_mode(2), 0x0058);
    assert_eq!(bus.read::<u32>(0x1F80_1124), 0x0058);
}

#[test]
fn test_timer_count_advances_with_clock() {
    let (mut bus, _) = test_bus();
    bus.write::<u32>(0x1F80_1100, 0).unwrap();

    for _ in 0..10 {
        bus.tick();
    }
    // Two counts per cycle at rate 1
    assert_eq!(bus.read::<u32>(0x1F80_1100), 20);
}

#[test]
fn test_vsync_raises_vblank_and_synthesizes() {
    let (mut bus, _) = test_bus();
    let period = bus.counters().cycles_until_fire(3);
    assert_eq!(period, PSXCLK / 60 / 2);

    bus.counters_mut().advance(period);
    assert!(bus.counters().deadline_reached());

    bus.update_counters().unwrap();
    assert_ne!(bus.irq().read_status() & Irq::VBLANK.bits() as u32, 0);
    assert_eq!(
        bus.spu().meter().frames(),
        (period / SAMPLE_PERIOD) as u64
    );
}

#[test]
fn test_reset_clears_devices() {
    let (mut bus, _) = test_bus();
    bus.write::<u32>(0x8000_0000, 1).unwrap();
    bus.irq_mut().request(Irq::VBLANK);
    bus.counters_mut().advance(1000);

    bus.reset();

    assert_eq!(bus.read::<u32>(0x8000_0000), 0);
    assert_eq!(bus.irq().read_status(), 0);
    assert_eq!(bus.counters().cycle(), 0);
}
