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

use super::super::decode::{decode_i_type, decode_r_type};
use super::super::CPU;
use crate::core::error::Result;

impl CPU {
    // === Logical Instructions ===

    pub(in crate::core::cpu) fn op_and(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, rd, _, _) = decode_r_type(instruction);
        self.set_reg(rd, self.reg(rs) & self.reg(rt));
        Ok(())
    }

    pub(in crate::core::cpu) fn op_or(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, rd, _, _) = decode_r_type(instruction);
        self.set_reg(rd, self.reg(rs) | self.reg(rt));
        Ok(())
    }

    pub(in crate::core::cpu) fn op_xor(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, rd, _, _) = decode_r_type(instruction);
        self.set_reg(rd, self.reg(rs) ^ self.reg(rt));
        Ok(())
    }

    pub(in crate::core::cpu) fn op_nor(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, rd, _, _) = decode_r_type(instruction);
        self.set_reg(rd, !(self.reg(rs) | self.reg(rt)));
        Ok(())
    }

    /// ANDI: rt = rs & zero_extend(imm)
    pub(in crate::core::cpu) fn op_andi(&mut self, instruction: u32) -> Result<()> {
        let (_, rs, rt, imm) = decode_i_type(instruction);
        self.set_reg(rt, self.reg(rs) & imm as u32);
        Ok(())
    }

    /// ORI: rt = rs | zero_extend(imm)
    pub(in crate::core::cpu) fn op_ori(&mut self, instruction: u32) -> Result<()> {
        let (_, rs, rt, imm) = decode_i_type(instruction);
        self.set_reg(rt, self.reg(rs) | imm as u32);
        Ok(())
    }

    /// XORI: rt = rs ^ zero_extend(imm)
    pub(in crate::core::cpu) fn op_xori(&mut self, instruction: u32) -> Result<()> {
        let (_, rs, rt, imm) = decode_i_type(instruction);
        self.set_reg(rt, self.reg(rs) ^ imm as u32);
        Ok(())
    }
}
