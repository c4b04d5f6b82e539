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

use Register::{A0, Ra, S0, T0, T1, T3, V0, Zero};

/// Where HLE calls return to
const RETURN: u32 = BASE + 0x40;

const TABLE_A0: u32 = 0xA0;
const TABLE_B0: u32 = 0xB0;
const TABLE_C0: u32 = 0xC0;

fn hle() -> (CPU, Bus) {
    let (cpu, mut bus) = setup();
    Bios::install(bus.memory_mut()).unwrap();
    (cpu, bus)
}

/// Enter a library table the way guest code does and return v0
fn call(cpu: &mut CPU, bus: &mut Bus, table: u32, function: u32, args: &[u32]) -> u32 {
    for (i, &arg) in args.iter().enumerate() {
        cpu.set_reg(A0 as u8 + i as u8, arg);
    }
    cpu.set_reg(T1 as u8, function);
    cpu.set_reg(Ra as u8, RETURN);
    cpu.regs[CPU::PC] = table;

    cpu.step(bus).unwrap();
    cpu.reg(V0 as u8)
}

fn put_string(bus: &mut Bus, addr: u32, text: &str) {
    bus.memory_mut().load(addr, text.as_bytes());
    bus.write::<u8>(addr + text.len() as u32, 0).unwrap();
}

/// Raise VBLANK and take a branch at BASE so the interrupt is serviced
fn raise_vblank(cpu: &mut CPU, bus: &mut Bus) {
    load_program(bus, BASE, &[beq(Zero, Zero, 1), NOP, NOP]);
    cpu.regs[CPU::PC] = BASE;
    cpu.set_cop0(COP0::SR, 0x0000_0401);
    bus.irq_mut().write_mask(Irq::VBLANK.bits() as u32);
    bus.irq_mut().request(Irq::VBLANK);

    cpu.step(bus).unwrap();
    assert_eq!(cpu.pc(), 0x8000_0080);
    cpu.step(bus).unwrap();
}

#[test]
fn test_install_plants_traps() {
    let (_cpu, bus) = hle();

    assert_eq!(bus.read::<u32>(0x0000_0000), 0x0800_0000);
    assert_eq!(bus.read::<u32>(0x8000_0080), TrapKind::Exception.word());
    assert_eq!(bus.read::<u32>(0x0000_00A0), TrapKind::TableA0.word());
    assert_eq!(bus.read::<u32>(0x0000_00B0), TrapKind::TableB0.word());
    assert_eq!(bus.read::<u32>(0x0000_00C0), TrapKind::TableC0.word());
    assert_eq!(bus.read::<u32>(SOFT_CALL_RETURN), TrapKind::SoftCallReturn.word());
    assert_eq!(bus.read::<u32>(0xBFC0_0180), TrapKind::Exception.word());
}

#[test]
fn test_trap_words_round_trip() {
    for kind in [
        TrapKind::Exception,
        TrapKind::TableA0,
        TrapKind::TableB0,
        TrapKind::TableC0,
        TrapKind::SoftCallReturn,
    ] {
        assert_eq!(TrapKind::from_word(kind.word()), Some(kind));
    }
    assert_eq!(TrapKind::from_word(TrapKind::TableA0.word() | 0x100), None);
}

#[test]
fn test_enter_and_exit_critical() {
    let (mut cpu, mut bus) = hle();
    load_program(
        &mut bus,
        BASE,
        &[
            addiu(A0, Zero, 1),
            syscall(),
            addiu(A0, Zero, 2),
            syscall(),
            NOP,
        ],
    );
    cpu.set_cop0(COP0::SR, 0x0000_0405);

    for _ in 0..3 {
        cpu.step(&mut bus).unwrap();
    }
    assert_eq!(cpu.pc(), BASE + 8);
    assert_eq!(cpu.reg(V0 as u8), 1);
    assert_eq!(cpu.cop0(COP0::SR) & 0x401, 0, "EnterCritical");

    for _ in 0..3 {
        cpu.step(&mut bus).unwrap();
    }
    assert_eq!(cpu.pc(), BASE + 16);
    assert_eq!(cpu.cop0(COP0::SR) & 0x401, 0x401, "ExitCritical");
}

#[test]
fn test_jal_into_a0_table_returns_to_caller() {
    let (mut cpu, mut bus) = hle();
    put_string(&mut bus, DATA, "sequence");
    load_program(&mut bus, BASE, &[jal(0xA0), addiu(T1, Zero, 0x1B)]);
    cpu.set_reg(A0 as u8, DATA);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc(), 0x8000_00A0);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc(), BASE + 8);
    assert_eq!(cpu.reg(V0 as u8), 8);
}

#[test]
fn test_string_functions() {
    let (mut cpu, mut bus) = hle();
    put_string(&mut bus, DATA, "abc");
    put_string(&mut bus, DATA + 0x10, "abd");

    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x1B, &[DATA]), 3);
    assert_eq!(cpu.pc(), RETURN);

    let cmp = call(&mut cpu, &mut bus, TABLE_A0, 0x17, &[DATA, DATA + 0x10]);
    assert_eq!(cmp as i32, -1);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x17, &[DATA, DATA]), 0);

    let dst = DATA + 0x20;
    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x19, &[dst, DATA]), dst);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x1B, &[dst]), 3);
}

#[test]
fn test_memory_functions() {
    let (mut cpu, mut bus) = hle();
    bus.memory_mut().load(DATA, &[1, 2, 3, 4, 5, 6]);

    let dst = DATA + 0x100;
    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x2A, &[dst, DATA, 6]), dst);
    assert_eq!(bus.read::<u32>(dst), 0x0403_0201);

    call(&mut cpu, &mut bus, TABLE_A0, 0x2B, &[dst, 0xEE, 2]);
    assert_eq!(bus.read::<u32>(dst), 0x0403_EEEE);

    call(&mut cpu, &mut bus, TABLE_A0, 0x28, &[dst, 4]);
    assert_eq!(bus.read::<u32>(dst), 0);

    // Overlapping move
    call(&mut cpu, &mut bus, TABLE_A0, 0x2C, &[DATA + 1, DATA, 4]);
    let bytes: Vec<u8> = (0..6).map(|i| bus.read::<u8>(DATA + i)).collect();
    assert_eq!(bytes, [1, 1, 2, 3, 4, 6]);
}

#[test]
fn test_negative_lengths_touch_nothing() {
    let (mut cpu, mut bus) = hle();
    bus.memory_mut().load(DATA, &[1, 2, 3, 4]);
    let dst = DATA + 0x100;
    bus.write::<u32>(dst, 0xCAFE_F00D).unwrap();

    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x2A, &[dst, DATA, 0xFFFF_FFFF]), dst);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x2B, &[dst, 0xEE, 0xFFFF_FFFF]), dst);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x2C, &[dst, DATA, 0xFFFF_FFFF]), dst);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x28, &[dst, 0x8000_0000]), dst);

    assert_eq!(bus.read::<u32>(dst), 0xCAFE_F00D);
    assert_eq!(cpu.pc(), RETURN);
}

#[test]
fn test_rand_is_deterministic() {
    let (mut cpu, mut bus) = hle();
    call(&mut cpu, &mut bus, TABLE_A0, 0x30, &[1]);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x2F, &[]), 16838);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x2F, &[]), 5758);
}

#[test]
fn test_printf_returns_length() {
    let (mut cpu, mut bus) = hle();
    put_string(&mut bus, DATA, "v=%d %x %s%%");
    put_string(&mut bus, DATA + 0x20, "ok");

    let args = [DATA, (-5i32) as u32, 255, DATA + 0x20];
    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x3F, &args), 11);
}

#[test]
fn test_heap() {
    let (mut cpu, mut bus) = hle();
    call(&mut cpu, &mut bus, TABLE_A0, 0x39, &[0x8006_0000, 0x1000]);

    let first = call(&mut cpu, &mut bus, TABLE_A0, 0x33, &[0x10]);
    let second = call(&mut cpu, &mut bus, TABLE_A0, 0x33, &[5]);
    assert_eq!(first, 0x8006_0000);
    assert_eq!(second, 0x8006_0010);

    call(&mut cpu, &mut bus, TABLE_A0, 0x34, &[first]);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x33, &[8]), 0x8006_0000);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x33, &[0x2000]), 0);
}

#[test]
fn test_setjmp_longjmp() {
    let (mut cpu, mut bus) = hle();
    let buffer = 0x8007_0000;
    cpu.set_reg(S0 as u8, 0x11);

    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x13, &[buffer]), 0);
    assert_eq!(bus.read::<u32>(buffer), RETURN);
    assert_eq!(bus.read::<u32>(buffer + 12), 0x11);

    cpu.set_reg(S0 as u8, 0);
    bus.write::<u32>(buffer, BASE + 0x80).unwrap();

    assert_eq!(call(&mut cpu, &mut bus, TABLE_A0, 0x14, &[buffer, 5]), 5);
    assert_eq!(cpu.pc(), BASE + 0x80);
    assert_eq!(cpu.reg(S0 as u8), 0x11);
}

#[test]
fn test_unknown_call_returns_zero() {
    let (mut cpu, mut bus) = hle();
    cpu.set_reg(V0 as u8, 0x1234);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_B0, 0xFE, &[]), 0);
    assert_eq!(cpu.pc(), RETURN);
}

#[test]
fn test_event_ready_mode() {
    let (mut cpu, mut bus) = hle();

    let handle = call(&mut cpu, &mut bus, TABLE_B0, 0x08, &[0xF200_0003, 2, 0x2000, 0]);
    assert_eq!(handle & 0xFFFF_0000, 0xF100_0000);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_B0, 0x0C, &[handle]), 1);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_B0, 0x0B, &[handle]), 0);

    call(&mut cpu, &mut bus, TABLE_B0, 0x07, &[0xF200_0003, 2]);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_B0, 0x0B, &[handle]), 1);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_B0, 0x0B, &[handle]), 0);

    // Disabled events are not delivered
    call(&mut cpu, &mut bus, TABLE_B0, 0x0D, &[handle]);
    call(&mut cpu, &mut bus, TABLE_B0, 0x07, &[0xF200_0003, 2]);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_B0, 0x0B, &[handle]), 0);

    assert_eq!(call(&mut cpu, &mut bus, TABLE_B0, 0x09, &[handle]), 1);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_B0, 0x0C, &[handle]), 0);
}

#[test]
fn test_event_callback_runs_as_soft_call() {
    let (mut cpu, mut bus) = hle();
    let handler = 0x8004_0000;
    load_program(
        &mut bus,
        handler,
        &[
            lui(T0, 0x8005),
            addiu(T3, Zero, 0x55),
            sw(T3, 0, T0),
            jr(Ra),
            NOP,
        ],
    );

    let handle = call(&mut cpu, &mut bus, TABLE_B0, 0x08, &[0xF200_0000, 2, 0x1000, handler]);
    call(&mut cpu, &mut bus, TABLE_B0, 0x0C, &[handle]);
    cpu.set_reg(T0 as u8, 0x99);

    call(&mut cpu, &mut bus, TABLE_B0, 0x07, &[0xF200_0000, 2]);

    assert_eq!(bus.read::<u32>(0x8005_0000), 0x55);
    assert_eq!(cpu.reg(T0 as u8), 0x99);
    assert_eq!(cpu.pc(), RETURN);
}

#[test]
fn test_interrupt_delivers_vsync_event() {
    let (mut cpu, mut bus) = hle();
    let handle = call(&mut cpu, &mut bus, TABLE_B0, 0x08, &[0xF200_0003, 2, 0x2000, 0]);
    call(&mut cpu, &mut bus, TABLE_B0, 0x0C, &[handle]);

    raise_vblank(&mut cpu, &mut bus);

    assert_eq!(cpu.pc(), BASE + 8);
    assert_eq!(cpu.cop0(COP0::SR) & 0x3F, 0x01);
    assert_eq!(bus.irq().read_status() & Irq::VBLANK.bits() as u32, 0);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_B0, 0x0B, &[handle]), 1);
}

#[test]
fn test_hook_entry_int_and_return_from_exception() {
    let (mut cpu, mut bus) = hle();
    let buffer = 0x8007_0000;

    call(&mut cpu, &mut bus, TABLE_A0, 0x13, &[buffer]);
    bus.write::<u32>(buffer, BASE + 0x80).unwrap();
    call(&mut cpu, &mut bus, TABLE_B0, 0x19, &[buffer]);
    cpu.set_reg(S0 as u8, 0x77);

    raise_vblank(&mut cpu, &mut bus);
    assert_eq!(cpu.pc(), BASE + 0x80);
    assert_eq!(cpu.reg(V0 as u8), 1);
    assert_eq!(cpu.reg(S0 as u8), 0);

    call(&mut cpu, &mut bus, TABLE_B0, 0x17, &[]);
    assert_eq!(cpu.pc(), BASE + 8);
    assert_eq!(cpu.reg(S0 as u8), 0x77);

    // SetDefaultExitFromException removes the hook
    call(&mut cpu, &mut bus, TABLE_B0, 0x18, &[]);
    raise_vblank(&mut cpu, &mut bus);
    assert_eq!(cpu.pc(), BASE + 8);
}

#[test]
fn test_root_counter_calls() {
    let (mut cpu, mut bus) = hle();

    assert_eq!(call(&mut cpu, &mut bus, TABLE_B0, 0x02, &[0, 0x100, 0x1000]), 1);
    assert_eq!(bus.counters().read_mode(0), 0x50);
    assert_eq!(bus.counters().read_target(0), 0x100);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_B0, 0x03, &[3]), 0);

    call(&mut cpu, &mut bus, TABLE_B0, 0x04, &[3]);
    call(&mut cpu, &mut bus, TABLE_B0, 0x04, &[1]);
    assert_eq!(bus.irq().read_mask(), 0x21);
    call(&mut cpu, &mut bus, TABLE_B0, 0x05, &[3]);
    assert_eq!(bus.irq().read_mask(), 0x20);

    call(&mut cpu, &mut bus, TABLE_B0, 0x06, &[0]);
    assert_eq!(bus.counters().read_mode(0), 0);
    assert_eq!(bus.counters().read_target(0), 0);
}

#[test]
fn test_change_clear_rcnt() {
    let (mut cpu, mut bus) = hle();
    assert_eq!(call(&mut cpu, &mut bus, TABLE_C0, 0x0A, &[1, 0]), 1);
    assert_eq!(call(&mut cpu, &mut bus, TABLE_C0, 0x0A, &[1, 1]), 0);
}
