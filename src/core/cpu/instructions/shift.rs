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
    // === Shift Instructions ===

    pub(in crate::core::cpu) fn op_sll(&mut self, instruction: u32) -> Result<()> {
        let (_, rt, rd, shamt, _) = decode_r_type(instruction);
        self.set_reg(rd, self.reg(rt) << shamt);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_srl(&mut self, instruction: u32) -> Result<()> {
        let (_, rt, rd, shamt, _) = decode_r_type(instruction);
        self.set_reg(rd, self.reg(rt) >> shamt);
        Ok(())
    }

    pub(in crate::core::cpu) fn op_sra(&mut self, instruction: u32) -> Result<()> {
        let (_, rt, rd, shamt, _) = decode_r_type(instruction);
        self.set_reg(rd, ((self.reg(rt) as i32) >> shamt) as u32);
        Ok(())
    }

    /// SLLV: rd = rt << (rs & 0x1F)
    pub(in crate::core::cpu) fn op_sllv(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, rd, _, _) = decode_r_type(instruction);
        self.set_reg(rd, self.reg(rt) << (self.reg(rs) & 0x1F));
        Ok(())
    }

    pub(in crate::core::cpu) fn op_srlv(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, rd, _, _) = decode_r_type(instruction);
        self.set_reg(rd, self.reg(rt) >> (self.reg(rs) & 0x1F));
        Ok(())
    }

    pub(in crate::core::cpu) fn op_srav(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, rd, _, _) = decode_r_type(instruction);
        self.set_reg(rd, ((self.reg(rt) as i32) >> (self.reg(rs) & 0x1F)) as u32);
        Ok(())
    }
}
