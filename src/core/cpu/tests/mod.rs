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

//! CPU tests
//!
//! - `basic`: construction, reset, register file, stepping
//! - `arithmetic`: ALU, multiply/divide, shifts
//! - `memory`: loads, stores, unaligned merges, address errors
//! - `branch`: delay slots, links, load hazards at branch targets
//! - `exceptions`: COP0 exception entry, RFE, interrupts
//! - `bios`: HLE BIOS traps and library calls

use super::*;
use crate::core::audio::NullSink;
use crate::core::spu::{Spu, SpuBridge};

mod bios;

/// Where test programs are placed
const BASE: u32 = 0x8001_0000;

/// Scratch data area
const DATA: u32 = 0x8002_0000;

/// CPU at [`BASE`] plus a bus with a live SPU worker
fn setup() -> (CPU, Bus) {
    let spu = SpuBridge::spawn(Spu::new(), Box::new(NullSink), 16).unwrap();
    let bus = Bus::new(60, spu);
    let mut cpu = CPU::new();
    cpu.regs[CPU::PC] = BASE;
    (cpu, bus)
}

fn load_program(bus: &mut Bus, addr: u32, program: &[u32]) {
    for (i, &word) in program.iter().enumerate() {
        bus.write::<u32>(addr + 4 * i as u32, word).unwrap();
    }
}

/// Execute a single word as if it had just been fetched from `BASE`
fn exec(cpu: &mut CPU, bus: &mut Bus, instruction: u32) {
    cpu.regs[CPU::PC] = BASE + 4;
    cpu.execute(instruction, bus).unwrap();
}

// === Encoders ===

const NOP: u32 = 0;

fn r_type(funct: u32, rs: u8, rt: u8, rd: u8, shamt: u32) -> u32 {
    ((rs as u32) << 21) | ((rt as u32) << 16) | ((rd as u32) << 11) | (shamt << 6) | funct
}

fn i_type(op: u32, rs: u8, rt: u8, imm: u16) -> u32 {
    (op << 26) | ((rs as u32) << 21) | ((rt as u32) << 16) | imm as u32
}

fn addiu(rt: Register, rs: Register, imm: i16) -> u32 {
    i_type(0x09, rs as u8, rt as u8, imm as u16)
}

fn lui(rt: Register, imm: u16) -> u32 {
    i_type(0x0F, 0, rt as u8, imm)
}

fn lw(rt: Register, offset: i16, base: Register) -> u32 {
    i_type(0x23, base as u8, rt as u8, offset as u16)
}

fn sw(rt: Register, offset: i16, base: Register) -> u32 {
    i_type(0x2B, base as u8, rt as u8, offset as u16)
}

fn addu(rd: Register, rs: Register, rt: Register) -> u32 {
    r_type(0x21, rs as u8, rt as u8, rd as u8, 0)
}

/// `offset` counts instructions from the delay slot
fn beq(rs: Register, rt: Register, offset: i16) -> u32 {
    i_type(0x04, rs as u8, rt as u8, offset as u16)
}

fn bne(rs: Register, rt: Register, offset: i16) -> u32 {
    i_type(0x05, rs as u8, rt as u8, offset as u16)
}

fn jal(target: u32) -> u32 {
    (0x03 << 26) | ((target >> 2) & 0x03FF_FFFF)
}

fn jr(rs: Register) -> u32 {
    r_type(0x08, rs as u8, 0, 0, 0)
}

fn syscall() -> u32 {
    0x0C
}

fn mtc0(rt: Register, rd: usize) -> u32 {
    (0x10 << 26) | (0x04 << 21) | ((rt as u32) << 16) | ((rd as u32) << 11)
}

fn mfc0(rt: Register, rd: usize) -> u32 {
    (0x10 << 26) | ((rt as u32) << 16) | ((rd as u32) << 11)
}

fn rfe() -> u32 {
    (0x10 << 26) | (0x10 << 21) | 0x10
}
