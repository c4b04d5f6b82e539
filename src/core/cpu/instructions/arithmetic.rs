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
use super::super::{ExceptionCause, CPU};
use crate::core::error::Result;

impl CPU {
    // === Arithmetic Instructions ===

    /// ADD: rd = rs + rt, trapping on signed overflow
    ///
    /// On overflow rd is left untouched and an Overflow exception is
    /// raised.
    pub(in crate::core::cpu) fn op_add(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, rd, _, _) = decode_r_type(instruction);
        match (self.reg(rs) as i32).checked_add(self.reg(rt) as i32) {
            Some(value) => self.set_reg(rd, value as u32),
            None => self.exception(ExceptionCause::Overflow),
        }
        Ok(())
    }

    /// ADDU: rd = rs + rt (no trap)
    pub(in crate::core::cpu) fn op_addu(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, rd, _, _) = decode_r_type(instruction);
        self.set_reg(rd, self.reg(rs).wrapping_add(self.reg(rt)));
        Ok(())
    }

    /// SUB: rd = rs - rt, trapping on signed overflow
    pub(in crate::core::cpu) fn op_sub(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, rd, _, _) = decode_r_type(instruction);
        match (self.reg(rs) as i32).checked_sub(self.reg(rt) as i32) {
            Some(value) => self.set_reg(rd, value as u32),
            None => self.exception(ExceptionCause::Overflow),
        }
        Ok(())
    }

    /// SUBU: rd = rs - rt (no trap)
    pub(in crate::core::cpu) fn op_subu(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, rd, _, _) = decode_r_type(instruction);
        self.set_reg(rd, self.reg(rs).wrapping_sub(self.reg(rt)));
        Ok(())
    }

    /// ADDI: rt = rs + sign_extend(imm), trapping on signed overflow
    pub(in crate::core::cpu) fn op_addi(&mut self, instruction: u32) -> Result<()> {
        let (_, rs, rt, imm) = decode_i_type(instruction);
        match (self.reg(rs) as i32).checked_add(imm as i16 as i32) {
            Some(value) => self.set_reg(rt, value as u32),
            None => self.exception(ExceptionCause::Overflow),
        }
        Ok(())
    }

    /// ADDIU: rt = rs + sign_extend(imm) (no trap)
    pub(in crate::core::cpu) fn op_addiu(&mut self, instruction: u32) -> Result<()> {
        let (_, rs, rt, imm) = decode_i_type(instruction);
        self.set_reg(rt, self.reg(rs).wrapping_add(imm as i16 as u32));
        Ok(())
    }

    /// SLT: rd = (rs < rt) signed
    pub(in crate::core::cpu) fn op_slt(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, rd, _, _) = decode_r_type(instruction);
        let value = (self.reg(rs) as i32) < (self.reg(rt) as i32);
        self.set_reg(rd, value as u32);
        Ok(())
    }

    /// SLTU: rd = (rs < rt) unsigned
    pub(in crate::core::cpu) fn op_sltu(&mut self, instruction: u32) -> Result<()> {
        let (rs, rt, rd, _, _) = decode_r_type(instruction);
        let value = self.reg(rs) < self.reg(rt);
        self.set_reg(rd, value as u32);
        Ok(())
    }

    /// SLTI: rt = (rs < sign_extend(imm)) signed
    pub(in crate::core::cpu) fn op_slti(&mut self, instruction: u32) -> Result<()> {
        let (_, rs, rt, imm) = decode_i_type(instruction);
        let value = (self.reg(rs) as i32) < (imm as i16 as i32);
        self.set_reg(rt, value as u32);
        Ok(())
    }

    /// SLTIU: rt = (rs < sign_extend(imm)) unsigned
    ///
    /// The immediate is sign-extended first, then compared unsigned.
    pub(in crate::core::cpu) fn op_sltiu(&mut self, instruction: u32) -> Result<()> {
        let (_, rs, rt, imm) = decode_i_type(instruction);
        let value = self.reg(rs) < (imm as i16 as u32);
        self.set_reg(rt, value as u32);
        Ok(())
    }

    /// LUI: rt = imm << 16
    pub(in crate::core::cpu) fn op_lui(&mut self, instruction: u32) -> Result<()> {
        let (_, _, rt, imm) = decode_i_type(instruction);
        self.set_reg(rt, (imm as u32) << 16);
        Ok(())
    }
}
