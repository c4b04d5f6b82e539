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

impl CPU {
    // === Load Instructions ===
    //
    // Loads complete immediately. The visible load delay is reproduced by
    // `do_branch` only where it matters, at branch targets.

    /// Effective address: rs + sign_extend(offset)
    #[inline(always)]
    fn load_address(&self, instruction: u32) -> (u8, u32) {
        let (_, rs, rt, imm) = decode_i_type(instruction);
        (rt, self.reg(rs).wrapping_add(imm as i16 as u32))
    }

    /// Raise AddressErrorLoad with BADA set
    fn load_address_error(&mut self, addr: u32) {
        self.cop0.regs[COP0::BADA] = addr;
        self.exception(ExceptionCause::AddressErrorLoad);
    }

    /// LB: Load Byte (sign-extended)
    pub(in crate::core::cpu) fn op_lb(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (rt, addr) = self.load_address(instruction);
        let value = bus.read::<u8>(addr) as i8 as i32 as u32;
        self.set_reg(rt, value);
        Ok(())
    }

    /// LBU: Load Byte Unsigned
    pub(in crate::core::cpu) fn op_lbu(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (rt, addr) = self.load_address(instruction);
        self.set_reg(rt, bus.read::<u8>(addr) as u32);
        Ok(())
    }

    /// LH: Load Halfword (sign-extended)
    ///
    /// The address must be 2-byte aligned.
    pub(in crate::core::cpu) fn op_lh(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (rt, addr) = self.load_address(instruction);
        if addr & 0x1 != 0 {
            self.load_address_error(addr);
            return Ok(());
        }
        let value = bus.read::<u16>(addr) as i16 as i32 as u32;
        self.set_reg(rt, value);
        Ok(())
    }

    /// LHU: Load Halfword Unsigned
    pub(in crate::core::cpu) fn op_lhu(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (rt, addr) = self.load_address(instruction);
        if addr & 0x1 != 0 {
            self.load_address_error(addr);
            return Ok(());
        }
        self.set_reg(rt, bus.read::<u16>(addr) as u32);
        Ok(())
    }

    /// LW: Load Word
    ///
    /// The address must be 4-byte aligned.
    pub(in crate::core::cpu) fn op_lw(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (rt, addr) = self.load_address(instruction);
        if addr & 0x3 != 0 {
            self.load_address_error(addr);
            return Ok(());
        }
        self.set_reg(rt, bus.read::<u32>(addr));
        Ok(())
    }

    /// LWL: Load Word Left
    ///
    /// Merges the bytes from `addr` down to the aligned word start into the
    /// upper end of rt.
    pub(in crate::core::cpu) fn op_lwl(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (rt, addr) = self.load_address(instruction);
        let word = bus.read::<u32>(addr & !3);
        let current = self.reg(rt);

        let value = match addr & 3 {
            0 => (current & 0x00FF_FFFF) | (word << 24),
            1 => (current & 0x0000_FFFF) | (word << 16),
            2 => (current & 0x0000_00FF) | (word << 8),
            _ => word,
        };
        self.set_reg(rt, value);
        Ok(())
    }

    /// LWR: Load Word Right
    ///
    /// Merges the bytes from `addr` up to the aligned word end into the
    /// lower end of rt.
    pub(in crate::core::cpu) fn op_lwr(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (rt, addr) = self.load_address(instruction);
        let word = bus.read::<u32>(addr & !3);
        let current = self.reg(rt);

        let value = match addr & 3 {
            0 => word,
            1 => (current & 0xFF00_0000) | (word >> 8),
            2 => (current & 0xFFFF_0000) | (word >> 16),
            _ => (current & 0xFFFF_FF00) | (word >> 24),
        };
        self.set_reg(rt, value);
        Ok(())
    }
}
