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

//! High-level emulated BIOS
//!
//! No BIOS ROM is executed. Instead, trap words (primary opcode 0x3B,
//! undefined on the R3000A) are planted at the exception vectors and at
//! the 0xA0/0xB0/0xC0 library entry points. Executing one hands control to
//! a host-side stand-in, which then returns to the guest exactly as the
//! real routine would.
//!
//! | Address    | Trap              |
//! |------------|-------------------|
//! | 0x00000000 | `j 0` idle loop   |
//! | 0x00000080 | Exception         |
//! | 0x000000A0 | A0 table          |
//! | 0x000000B0 | B0 table          |
//! | 0x000000C0 | C0 table          |
//! | 0x00001000 | Soft call return  |
//! | 0xBFC00180 | Exception (BEV=1) |
//!
//! Event handlers are run re-entrantly ("soft calls"): the interpreter is
//! stepped with ra = [`SOFT_CALL_RETURN`] until PC gets there.

use super::cop0::COP0;
use super::decode::HLE_TRAP_OPCODE;
use super::{Register, CPU};
use crate::core::bus::Bus;
use crate::core::error::Result;
use crate::core::interrupt::Irq;
use crate::core::memory::AddressSpace;

mod heap;
mod kernel;
mod libc;

use heap::Heap;
use kernel::Event;

/// Return address planted for soft calls
pub const SOFT_CALL_RETURN: u32 = 0x8000_1000;

/// Upper bound on instructions run by one soft call
const SOFT_CALL_LIMIT: u64 = 10_000_000;

/// Root counter event class base (class = base + counter)
const RCNT_CLASS: u32 = 0xF200_0000;

/// Event spec delivered by root counter interrupts
const EVENT_SPEC_INTERRUPT: u32 = 0x0002;

/// Interrupt line of each root counter, in delivery order
const ROOT_COUNTER_LINES: [(u32, Irq); 4] = [
    (3, Irq::VBLANK),
    (0, Irq::TIMER0),
    (1, Irq::TIMER1),
    (2, Irq::TIMER2),
];

/// Which stand-in a trap word invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TrapKind {
    Exception = 0,
    TableA0 = 1,
    TableB0 = 2,
    TableC0 = 3,
    SoftCallReturn = 4,
}

impl TrapKind {
    /// The instruction word that triggers this trap
    pub const fn word(self) -> u32 {
        (HLE_TRAP_OPCODE << 26) | self as u32
    }

    /// Decode a trap word
    pub fn from_word(word: u32) -> Option<Self> {
        match word & 0x03FF_FFFF {
            0 => Some(Self::Exception),
            1 => Some(Self::TableA0),
            2 => Some(Self::TableB0),
            3 => Some(Self::TableC0),
            4 => Some(Self::SoftCallReturn),
            _ => None,
        }
    }
}

/// Kernel state kept by the BIOS stand-ins
#[derive(Debug, Clone)]
pub struct Bios {
    heap: Heap,
    events: Vec<Event>,
    rand_seed: u32,

    /// Jump buffer registered by HookEntryInt (0 = none)
    hook_entry_int: u32,

    /// Registers at the last interrupt, for ReturnFromException
    saved_context: Option<[u32; 35]>,

    /// Flags stored by ChangeClearRCnt
    clear_rcnt: [u32; 4],

    /// Pending putchar output
    tty: String,
}

impl Bios {
    pub fn new() -> Self {
        Self {
            heap: Heap::default(),
            events: Vec::new(),
            rand_seed: 0x2480_40B5,
            hook_entry_int: 0,
            saved_context: None,
            clear_rcnt: [1; 4],
            tty: String::new(),
        }
    }

    /// Plant the trap words and blank the ROM
    pub fn install(memory: &mut AddressSpace) -> Result<()> {
        let mut rom = vec![0u8; 0x184];
        rom[0x180..].copy_from_slice(&TrapKind::Exception.word().to_le_bytes());
        memory.load_bios(&rom)?;

        // j 0 ; nop
        memory.write::<u32>(0x8000_0000, 0x0800_0000);
        memory.write::<u32>(0x8000_0004, 0);

        memory.write::<u32>(0x8000_0080, TrapKind::Exception.word());
        memory.write::<u32>(0x8000_00A0, TrapKind::TableA0.word());
        memory.write::<u32>(0x8000_00B0, TrapKind::TableB0.word());
        memory.write::<u32>(0x8000_00C0, TrapKind::TableC0.word());
        memory.write::<u32>(SOFT_CALL_RETURN, TrapKind::SoftCallReturn.word());

        log::debug!("HLE BIOS installed");
        Ok(())
    }
}

impl Default for Bios {
    fn default() -> Self {
        Self::new()
    }
}

impl CPU {
    /// Run the stand-in selected by a trap word
    pub(super) fn hle_trap(&mut self, kind: TrapKind, bus: &mut Bus) -> Result<()> {
        let function = self.reg(Register::T1 as u8) & 0xFF;

        match kind {
            TrapKind::Exception => self.hle_exception(bus),
            TrapKind::TableA0 => {
                self.return_to_ra();
                self.call_a0(function, bus)
            }
            TrapKind::TableB0 => {
                self.return_to_ra();
                self.call_b0(function, bus)
            }
            TrapKind::TableC0 => {
                self.return_to_ra();
                self.call_c0(function, bus)
            }
            TrapKind::SoftCallReturn => {
                log::warn!("Soft call return reached outside a soft call");
                Ok(())
            }
        }
    }

    /// The exception vector: syscalls and interrupts
    fn hle_exception(&mut self, bus: &mut Bus) -> Result<()> {
        let epc = self.cop0.regs[COP0::EPC];

        match self.cop0.cause_code() {
            0 => self.hle_interrupt(epc, bus),
            8 => {
                if self.cop0.regs[COP0::CAUSE] & COP0::CAUSE_BD != 0 {
                    log::warn!("Syscall in a delay slot at 0x{:08X}; branch dropped", epc);
                }
                self.hle_syscall();
                self.regs[Self::PC] = epc.wrapping_add(4);
                self.cop0.pop_mode();
                Ok(())
            }
            code => {
                log::warn!(
                    "Unhandled exception code {} (EPC=0x{:08X}, BADA=0x{:08X})",
                    code,
                    epc,
                    self.cop0.regs[COP0::BADA]
                );
                self.regs[Self::PC] = epc.wrapping_add(4);
                self.cop0.pop_mode();
                Ok(())
            }
        }
    }

    fn hle_syscall(&mut self) {
        match self.reg(Register::A0 as u8) {
            0 => {}
            1 => {
                // EnterCritical
                self.cop0.regs[COP0::SR] &= !0x404;
                self.set_return(1);
            }
            2 => {
                // ExitCritical
                self.cop0.regs[COP0::SR] |= 0x404;
            }
            n => log::warn!("Unknown syscall {}", n),
        }
    }

    fn hle_interrupt(&mut self, epc: u32, bus: &mut Bus) -> Result<()> {
        self.bios.saved_context = Some(self.regs);
        let pending = bus.irq().pending();

        for (counter, line) in ROOT_COUNTER_LINES {
            if pending.contains(line) {
                self.deliver_event(RCNT_CLASS + counter, EVENT_SPEC_INTERRUPT, bus)?;
            }
        }

        bus.irq_mut().acknowledge(pending);

        if self.bios.hook_entry_int != 0 {
            let buffer = self.bios.hook_entry_int;
            self.longjmp(buffer, 1, bus);
            return Ok(());
        }

        self.regs[Self::PC] = epc;
        self.cop0.pop_mode();
        Ok(())
    }

    /// Run a guest function to completion
    ///
    /// All registers are restored afterwards except v0.
    pub(super) fn soft_call(&mut self, function: u32, bus: &mut Bus) -> Result<()> {
        let saved = self.regs;
        self.regs[Register::Ra as usize] = SOFT_CALL_RETURN;
        self.regs[Self::PC] = function;

        if !self.run_until(bus, SOFT_CALL_RETURN, SOFT_CALL_LIMIT)? {
            log::warn!("Soft call to 0x{:08X} did not return", function);
        }

        let v0 = self.regs[Register::V0 as usize];
        self.regs = saved;
        self.regs[Register::V0 as usize] = v0;
        Ok(())
    }

    // === Calling convention helpers ===

    /// Argument register a0-a3
    fn arg(&self, n: u8) -> u32 {
        self.reg(Register::A0 as u8 + n)
    }

    fn set_return(&mut self, value: u32) {
        self.set_reg(Register::V0 as u8, value);
    }

    fn return_to_ra(&mut self) {
        self.regs[Self::PC] = self.reg(Self::RA);
    }

    /// Read a NUL-terminated guest string (at most `limit` bytes)
    fn read_cstring(bus: &Bus, addr: u32, limit: usize) -> Vec<u8> {
        (0..limit as u32)
            .map(|i| bus.read::<u8>(addr.wrapping_add(i)))
            .take_while(|&b| b != 0)
            .collect()
    }
}
