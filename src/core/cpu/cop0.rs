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

/// Coprocessor 0 (System Control)
///
/// COP0 holds the status, cause and exception PC registers the interpreter
/// uses for exception delivery. The remaining registers are plain storage.
pub(super) struct COP0 {
    /// COP0 registers (32 registers)
    pub(super) regs: [u32; 32],
}

impl COP0 {
    /// Bad Virtual Address
    pub const BADA: usize = 8;
    /// Status Register
    pub const SR: usize = 12;
    /// Cause Register
    pub const CAUSE: usize = 13;
    /// Exception PC
    pub const EPC: usize = 14;
    /// Processor ID
    pub const PRID: usize = 15;

    /// SR bit 22: bootstrap exception vectors
    pub const SR_BEV: u32 = 1 << 22;
    /// SR bit 16: isolate cache (stores do not reach memory)
    pub const SR_ISC: u32 = 1 << 16;
    /// SR bits 0 and 10: interrupts enabled and hardware line 2 unmasked
    pub const SR_INTERRUPTS: u32 = 0x401;

    /// CAUSE bit 10: hardware interrupt pending
    pub const CAUSE_IP2: u32 = 1 << 10;
    /// CAUSE bit 31: exception taken in a branch delay slot
    pub const CAUSE_BD: u32 = 1 << 31;

    const SR_RESET: u32 = 0x1090_0000;
    const PRID_R3000A: u32 = 0x0000_0002;

    pub(super) fn new() -> Self {
        let mut cop0 = Self { regs: [0u32; 32] };
        cop0.reset();
        cop0
    }

    pub(super) fn reset(&mut self) {
        self.regs = [0u32; 32];
        self.regs[Self::SR] = Self::SR_RESET;
        self.regs[Self::PRID] = Self::PRID_R3000A;
    }

    /// Exception code field of CAUSE
    pub(super) fn cause_code(&self) -> u32 {
        (self.regs[Self::CAUSE] >> 2) & 0x1F
    }

    /// Push the KU/IE mode stack (current -> previous -> old)
    pub(super) fn push_mode(&mut self) {
        let sr = self.regs[Self::SR];
        self.regs[Self::SR] = (sr & !0x3F) | ((sr << 2) & 0x3F);
    }

    /// Pop the KU/IE mode stack, as RFE does
    pub(super) fn pop_mode(&mut self) {
        let sr = self.regs[Self::SR];
        self.regs[Self::SR] = (sr & !0x0F) | ((sr >> 2) & 0x0F);
    }
}

/// Exception cause codes for MIPS R3000A
///
/// These correspond to the exception codes stored in the CAUSE register
/// when a CPU exception occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ExceptionCause {
    /// Interrupt (external or internal)
    Interrupt = 0,
    /// Address error on load
    AddressErrorLoad = 4,
    /// Address error on store
    AddressErrorStore = 5,
    /// Bus error on instruction fetch
    BusErrorInstruction = 6,
    /// Bus error on data access
    BusErrorData = 7,
    /// Syscall instruction executed
    Syscall = 8,
    /// Breakpoint instruction executed
    Breakpoint = 9,
    /// Reserved or illegal instruction
    ReservedInstruction = 10,
    /// Coprocessor unusable
    CoprocessorUnusable = 11,
    /// Arithmetic overflow
    Overflow = 12,
}
