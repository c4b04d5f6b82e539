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

//! MIPS R3000A CPU interpreter
//!
//! The interpreter runs one instruction per [`CPU::step`]. Branches and
//! jumps execute their delay slot inside the same step (see
//! [`CPU::do_branch`]) and then give the root counters and interrupt
//! controller a chance to run.
//!
//! # Register File
//!
//! All registers live in one flat array indexed by ABI number; HI, LO and
//! PC follow the 32 general purpose registers at 32, 33 and 34. Index 0
//! always reads as zero.
//!
//! # Example
//!
//! ```no_run
//! use psfrx::core::audio::NullSink;
//! use psfrx::core::bus::Bus;
//! use psfrx::core::cpu::{Register, CPU};
//! use psfrx::core::spu::{Spu, SpuBridge};
//!
//! let spu = SpuBridge::spawn(Spu::new(), Box::new(NullSink), 1024).unwrap();
//! let mut bus = Bus::new(60, spu);
//! let mut cpu = CPU::new();
//!
//! // addiu v0, zero, 42
//! bus.write::<u32>(0x8001_0000, 0x2402_002A).unwrap();
//! cpu.set_reg(Register::Pc as u8, 0x8001_0000);
//! cpu.step(&mut bus).unwrap();
//! assert_eq!(cpu.reg(Register::V0 as u8), 42);
//! ```

use crate::core::bus::Bus;
use crate::core::error::Result;

mod bios;
mod cop0;
pub mod decode;
pub mod hazard;
mod instructions;
#[cfg(test)]
mod tests;

pub use bios::{Bios, TrapKind, SOFT_CALL_RETURN};
pub use cop0::ExceptionCause;
use cop0::COP0;

/// Register names by ABI index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    Zero = 0,
    At,
    V0,
    V1,
    A0,
    A1,
    A2,
    A3,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    S0,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    T8,
    T9,
    K0,
    K1,
    Gp,
    Sp,
    Fp,
    Ra,
    Hi,
    Lo,
    Pc,
}

/// MIPS R3000A CPU
pub struct CPU {
    /// GPR 0-31, then HI, LO and PC
    regs: [u32; 35],

    /// System control coprocessor
    cop0: COP0,

    /// Set while the delay slot of a taken branch executes
    in_delay_slot: bool,

    /// Set by `exception`; lets a branch notice its delay slot trapped
    exception_taken: bool,

    /// Delay-slot load held back while a branch at the hazard target
    /// decides; committed before that branch's own delay slot
    deferred_load: Option<(u8, u32)>,

    /// Fast-forward the clock through `b .` idle loops
    dead_loop_skip: bool,

    /// HLE BIOS state
    bios: Bios,
}

impl CPU {
    /// High result register index
    pub const HI: usize = 32;
    /// Low result register index
    pub const LO: usize = 33;
    /// Program counter index
    pub const PC: usize = 34;
    /// Return address register
    pub const RA: u8 = 31;

    /// Reset vector
    const RESET_PC: u32 = 0xBFC0_0000;

    /// Create a CPU at the reset vector
    pub fn new() -> Self {
        let mut cpu = Self {
            regs: [0u32; 35],
            cop0: COP0::new(),
            in_delay_slot: false,
            exception_taken: false,
            deferred_load: None,
            dead_loop_skip: false,
            bios: Bios::new(),
        };
        cpu.regs[Self::PC] = Self::RESET_PC;
        cpu
    }

    /// Reset registers, COP0 and HLE BIOS state
    ///
    /// The dead-loop setting survives a reset.
    pub fn reset(&mut self) {
        self.regs = [0u32; 35];
        self.regs[Self::PC] = Self::RESET_PC;
        self.cop0.reset();
        self.in_delay_slot = false;
        self.exception_taken = false;
        self.deferred_load = None;
        self.bios = Bios::new();
    }

    /// Read a register by ABI index (0-34)
    ///
    /// Index 0 always reads 0.
    #[inline(always)]
    pub fn reg(&self, index: u8) -> u32 {
        if index == 0 {
            0
        } else {
            self.regs[index as usize]
        }
    }

    /// Write a register by ABI index (0-34)
    ///
    /// Writes to index 0 are ignored.
    #[inline(always)]
    pub fn set_reg(&mut self, index: u8, value: u32) {
        if index != 0 {
            self.regs[index as usize] = value;
        }
    }

    /// Current program counter
    #[inline(always)]
    pub fn pc(&self) -> u32 {
        self.regs[Self::PC]
    }

    /// Read a COP0 register
    pub fn cop0(&self, index: usize) -> u32 {
        self.cop0.regs[index & 0x1F]
    }

    /// Write a COP0 register
    pub fn set_cop0(&mut self, index: usize, value: u32) {
        self.cop0.regs[index & 0x1F] = value;
    }

    /// Whether the current instruction is a delay slot
    pub fn in_delay_slot(&self) -> bool {
        self.in_delay_slot
    }

    /// Enable or disable idle-loop fast-forwarding
    pub fn set_dead_loop_skip(&mut self, enabled: bool) {
        self.dead_loop_skip = enabled;
    }

    /// Fetch, decode and execute one instruction
    pub fn step(&mut self, bus: &mut Bus) -> Result<()> {
        let pc = self.regs[Self::PC];
        let instruction = bus.read::<u32>(pc);
        bus.tick();
        self.regs[Self::PC] = pc.wrapping_add(4);

        self.execute(instruction, bus)
    }

    /// Step until PC equals `pc` or `max_steps` instructions ran
    ///
    /// # Returns
    ///
    /// `true` if `pc` was reached
    pub fn run_until(&mut self, bus: &mut Bus, pc: u32, max_steps: u64) -> Result<bool> {
        for _ in 0..max_steps {
            if self.pc() == pc {
                return Ok(true);
            }
            self.step(bus)?;
        }
        Ok(self.pc() == pc)
    }

    /// Enter the exception vector
    ///
    /// EPC is the faulting instruction, or the branch before it when the
    /// fault happened in a delay slot.
    pub fn exception(&mut self, cause: ExceptionCause) {
        let faulting = self.pc().wrapping_sub(4);
        let epc = if self.in_delay_slot {
            faulting.wrapping_sub(4)
        } else {
            faulting
        };
        self.enter_exception(cause, epc, self.in_delay_slot);
    }

    fn enter_exception(&mut self, cause: ExceptionCause, epc: u32, delay_slot: bool) {
        let cause_reg = self.cop0.regs[COP0::CAUSE] & !(0x7C | COP0::CAUSE_BD);
        let bd = if delay_slot { COP0::CAUSE_BD } else { 0 };
        self.cop0.regs[COP0::CAUSE] = cause_reg | ((cause as u32) << 2) | bd;
        self.cop0.regs[COP0::EPC] = epc;
        self.cop0.push_mode();

        let handler = if self.cop0.regs[COP0::SR] & COP0::SR_BEV != 0 {
            0xBFC0_0180
        } else {
            0x8000_0080
        };

        log::trace!(
            "Exception {:?}: EPC=0x{:08X} BD={} -> 0x{:08X}",
            cause,
            epc,
            delay_slot,
            handler
        );

        self.regs[Self::PC] = handler;
        self.exception_taken = true;
    }

    /// Service counters and interrupts after a taken branch
    pub(super) fn branch_test(&mut self, bus: &mut Bus, idle_loop: bool) -> Result<()> {
        if bus.counters().deadline_reached() {
            bus.update_counters()?;
        }

        if bus.irq().is_pending() {
            self.cop0.regs[COP0::CAUSE] |= COP0::CAUSE_IP2;
            let sr = self.cop0.regs[COP0::SR];
            if sr & COP0::SR_INTERRUPTS == COP0::SR_INTERRUPTS {
                let epc = self.pc();
                self.enter_exception(ExceptionCause::Interrupt, epc, false);
                return Ok(());
            }
        } else {
            self.cop0.regs[COP0::CAUSE] &= !COP0::CAUSE_IP2;
        }

        if idle_loop && self.dead_loop_skip {
            bus.counters_mut().dead_loop_skip();
        }
        Ok(())
    }
}

impl Default for CPU {
    fn default() -> Self {
        Self::new()
    }
}
