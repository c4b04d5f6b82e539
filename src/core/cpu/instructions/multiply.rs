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

use super::super::decode::decode_r_type;
use super::super::CPU;
use crate::core::error::Result;

impl CPU {
    // === Multiply / Divide Instructions ===

    /// MULT: HI:LO = rs * rt (signed 64-bit product)
    pub(in crate::core::cpu) fn op_mult(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, _, _, _) = decode_r_type(instruction);
        let product = (self.reg(rs) as i32 as i64) * (self.reg(rt) as i32 as i64);
        self.regs[Self::HI] = (product >> 32) as u32;
        self.regs[Self::LO] = product as u32;
        Ok(())
    }

    /// MULTU: HI:LO = rs * rt (unsigned 64-bit product)
    pub(in crate::core::cpu) fn op_multu(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, _, _, _) = decode_r_type(instruction);
        let product = self.reg(rs) as u64 * self.reg(rt) as u64;
        self.regs[Self::HI] = (product >> 32) as u32;
        self.regs[Self::LO] = product as u32;
        Ok(())
    }

    /// DIV: LO = rs / rt, HI = rs % rt (signed)
    ///
    /// Division by zero gives LO = -1 (or 1 for a negative dividend) and
    /// HI = rs. 0x80000000 / -1 gives LO = 0x80000000 and HI = 0.
    pub(in crate::core::cpu) fn op_div(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, _, _, _) = decode_r_type(instruction);
        let n = self.reg(rs) as i32;
        let d = self.reg(rt) as i32;

        let (lo, hi) = if d == 0 {
            (if n >= 0 { 0xFFFF_FFFF } else { 1 }, n as u32)
        } else if n == i32::MIN && d == -1 {
            (0x8000_0000, 0)
        } else {
            ((n / d) as u32, (n % d) as u32)
        };

        self.regs[Self::LO] = lo;
        self.regs[Self::HI] = hi;
        Ok(())
    }

    /// DIVU: LO = rs / rt, HI = rs % rt (unsigned)
    ///
    /// Division by zero gives LO = 0xFFFFFFFF and HI = rs.
    pub(in crate::core::cpu) fn op_divu(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, _, _, _) = decode_r_type(instruction);
        let n = self.reg(rs);
        let d = self.reg(rt);

        let (lo, hi) = match d {
            0 => (0xFFFF_FFFF, n),
            _ => (n / d, n % d),
        };

        self.regs[Self::LO] = lo;
        self.regs[Self::HI] = hi;
        Ok(())
    }

    pub(in crate::core::cpu) fn op_mfhi(&mut self, instruction: u32) -> Result<()> {
        let (_, _, rd, _, _) = decode_r_type(instruction);
        self.set_reg(rd, self.regs[Self::HI]);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_mthi(&mut self, instruction: u32) -> Result<()> {
        let (rs, _, _, _, _) = decode_r_type(instruction);
        self.regs[Self::HI] = self.reg(rs);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_mflo(&mut self, instruction: u32) -> Result<()> {
        let (_, _, rd, _, _) = decode_r_type(instruction);
        self.set_reg(rd, self.regs[Self::LO]);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_mtlo(&mut self, instruction: u32) -> Result<()> {
        let (rs, _, _, _, _) = decode_r_type(instruction);
        self.regs[Self::LO] = self.reg(rs);
        Ok(())
    }
}
