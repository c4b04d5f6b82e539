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

#[test]
fn test_dma_initialization() {
    let dma = DmaController::new();
    assert_eq!(dma.read_control(), 0x0765_4321);
    assert_eq!(dma.read_interrupt(), 0);
    assert!(!dma.spu().is_active());
}

#[test]
fn test_channel_registers_round_trip() {
    let mut dma = DmaController::new();
    dma.write_madr(0x8010_0000);
    dma.write_bcr(0x0004_0010);

    assert_eq!(dma.read_madr(), 0x0010_0000);
    assert_eq!(dma.read_bcr(), 0x0004_0010);
    assert_eq!(dma.spu().address(), 0x0010_0000);
}

#[test]
fn test_chcr_start_bit() {
    let mut dma = DmaController::new();
    assert!(!dma.write_chcr(0x0000_0201));
    assert!(dma.write_chcr(0x0100_0201));
    assert_eq!(dma.spu().direction(), TransferDirection::FromRam);
    assert_eq!(dma.spu().sync_mode(), 1);
}

#[test]
fn test_word_count_modes() {
    let mut dma = DmaController::new();

    dma.write_bcr(0x0003_0010);
    dma.write_chcr(0x0000_0000);
    assert_eq!(dma.spu().word_count(), 0x10);

    dma.write_bcr(0);
    assert_eq!(dma.spu().word_count(), 0x10000);

    dma.write_bcr(0x0003_0010);
    dma.write_chcr(0x0000_0200);
    assert_eq!(dma.spu().word_count(), 0x30);
}

#[test]
fn test_complete_clears_start_and_advances_block_mode() {
    let mut dma = DmaController::new();
    dma.write_madr(0x1000);
    dma.write_bcr(0x0002_0010);
    dma.write_chcr(0x0100_0201);

    let raise = dma.complete(0x20);
    assert!(!raise);
    assert!(!dma.spu().is_active());
    assert_eq!(dma.read_madr(), 0x1080);
}

#[test]
fn test_complete_immediate_keeps_address() {
    let mut dma = DmaController::new();
    dma.write_madr(0x1000);
    dma.write_chcr(0x0100_0001);
    dma.complete(4);
    assert_eq!(dma.read_madr(), 0x1000);
}

#[test]
fn test_dicr_flag_and_irq() {
    let mut dma = DmaController::new();
    // Master enable + channel 4 enable
    dma.write_interrupt((1 << 23) | (1 << 20));
    dma.write_chcr(0x0100_0001);

    assert!(dma.complete(1));
    let dicr = dma.read_interrupt();
    assert_ne!(dicr & (1 << 28), 0);
    assert_ne!(dicr & (1 << 31), 0);

    // Write 1 to clear the flag
    dma.write_interrupt((1 << 23) | (1 << 20) | (1 << 28));
    let dicr = dma.read_interrupt();
    assert_eq!(dicr & (1 << 28), 0);
    assert_eq!(dicr & (1 << 31), 0);
}

#[test]
fn test_dicr_without_master_enable() {
    let mut dma = DmaController::new();
    dma.write_interrupt(1 << 20);
    dma.write_chcr(0x0100_0001);

    assert!(!dma.complete(1));
    assert_ne!(dma.read_interrupt() & (1 << 28), 0);
    assert_eq!(dma.read_interrupt() & (1 << 31), 0);
}

#[test]
fn test_dicr_flags_not_set_by_write() {
    let mut dma = DmaController::new();
    dma.write_interrupt(0x7F00_0000);
    assert_eq!(dma.read_interrupt(), 0);
}
