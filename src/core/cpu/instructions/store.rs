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

use super::super::cop0::COP0;
use super::super::decode::decode_i_type;
use super::super::{ExceptionCause, CPU};
use crate::core::bus::Bus;
use crate::core::error::Result;
use crate::core::memory::MemoryValue;

impl CPU {
    // === Store Instructions ===

    /// Effective address and value register
    #[inline(always)]
    fn store_operands(&self, instruction: u32) -> (u32, u32) {
        let (_, rs, rt, imm) = decode_i_type(instruction);
        (self.reg(rs).wrapping_add(imm as i16 as u32), self.reg(rt))
    }

    /// Write through the bus unless the data cache is isolated
    fn store<T: MemoryValue>(&mut self, bus: &mut Bus, addr: u32, value: T) -> Result<()> {
        if self.cop0.regs[COP0::SR] & COP0::SR_ISC != 0 {
            log::trace!("Store to 0x{:08X} dropped (cache isolated)", addr);
            return Ok(());
        }
        bus.write::<T>(addr, value)
    }

    fn store_address_error(&mut self, addr: u32) {
        self.cop0.regs[COP0::BADA] = addr;
        self.exception(ExceptionCause::AddressErrorStore);
    }

    /// SB: Store Byte
    pub(in crate::core::cpu) fn op_sb(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (addr, value) = self.store_operands(instruction);
        self.store(bus, addr, value as u8)
    }

    /// SH: Store Halfword
    ///
    /// The address must be 2-byte aligned.
    pub(in crate::core::cpu) fn op_sh(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (addr, value) = self.store_operands(instruction);
        if addr & 0x1 != 0 {
            self.store_address_error(addr);
            return Ok(());
        }
        self.store(bus, addr, value as u16)
    }

    /// SW: Store Word
    ///
    /// The address must be 4-byte aligned.
    pub(in crate::core::cpu) fn op_sw(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (addr, value) = self.store_operands(instruction);
        if addr & 0x3 != 0 {
            self.store_address_error(addr);
            return Ok(());
        }
        self.store(bus, addr, value)
    }

    /// SWL: Store Word Left
    ///
    /// Stores the upper end of rt into the bytes from `addr` down to the
    /// aligned word start.
    pub(in crate::core::cpu) fn op_swl(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (addr, value) = self.store_operands(instruction);
        let aligned = addr & !3;
        let memory = bus.read::<u32>(aligned);

        let merged = match addr & 3 {
            0 => (memory & 0xFFFF_FF00) | (value >> 24),
            1 => (memory & 0xFFFF_0000) | (value >> 16),
            2 => (memory & 0xFF00_0000) | (value >> 8),
            _ => value,
        };
        self.store(bus, aligned, merged)
    }

    /// SWR: Store Word Right
    ///
    /// Stores the lower end of rt into the bytes from `addr` up to the
    /// aligned word end.
    pub(in crate::core::cpu) fn op_swr(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (addr, value) = self.store_operands(instruction);
        let aligned = addr & !3;
        let memory = bus.read::<u32>(aligned);

        let merged = match addr & 3 {
            0 => value,
            1 => (memory & 0x0000_00FF) | (value << 8),
            2 => (memory & 0x0000_FFFF) | (value << 16),
            _ => (memory & 0x00FF_FFFF) | (value << 24),
        };
        self.store(bus, aligned, merged)
    }
}
