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

//! CPU instruction implementations
//!
//! This module contains all MIPS R3000A instruction implementations,
//! organized by instruction type.

use super::decode::{decode, OperationKind};
use super::CPU;
use crate::core::bus::Bus;
use crate::core::error::Result;

mod arithmetic;
mod branch;
mod cop0;
mod cop2;
mod exception;
mod jump;
mod load;
mod logical;
mod multiply;
mod shift;
mod store;

impl CPU {
    /// Execute one decoded instruction
    pub(super) fn execute(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        use OperationKind::*;

        match decode(instruction) {
            Sll => self.op_sll(instruction),
            Srl => self.op_srl(instruction),
            Sra => self.op_sra(instruction),
            Sllv => self.op_sllv(instruction),
            Srlv => self.op_srlv(instruction),
            Srav => self.op_srav(instruction),
            Jr => self.op_jr(instruction, bus),
            Jalr => self.op_jalr(instruction, bus),
            Syscall => self.op_syscall(instruction),
            Break => self.op_break(instruction),
            Mfhi => self.op_mfhi(instruction),
            Mthi => self.op_mthi(instruction),
            Mflo => self.op_mflo(instruction),
            Mtlo => self.op_mtlo(instruction),
            Mult => self.op_mult(instruction),
            Multu => self.op_multu(instruction),
            Div => self.op_div(instruction),
            Divu => self.op_divu(instruction),
            Add => self.op_add(instruction),
            Addu => self.op_addu(instruction),
            Sub => self.op_sub(instruction),
            Subu => self.op_subu(instruction),
            And => self.op_and(instruction),
            Or => self.op_or(instruction),
            Xor => self.op_xor(instruction),
            Nor => self.op_nor(instruction),
            Slt => self.op_slt(instruction),
            Sltu => self.op_sltu(instruction),
            Bltz | Bgez | Bltzal | Bgezal => self.op_bcondz(instruction, bus),
            J => self.op_j(instruction, bus),
            Jal => self.op_jal(instruction, bus),
            Beq => self.op_beq(instruction, bus),
            Bne => self.op_bne(instruction, bus),
            Blez => self.op_blez(instruction, bus),
            Bgtz => self.op_bgtz(instruction, bus),
            Addi => self.op_addi(instruction),
            Addiu => self.op_addiu(instruction),
            Slti => self.op_slti(instruction),
            Sltiu => self.op_sltiu(instruction),
            Andi => self.op_andi(instruction),
            Ori => self.op_ori(instruction),
            Xori => self.op_xori(instruction),
            Lui => self.op_lui(instruction),
            Lb => self.op_lb(instruction, bus),
            Lh => self.op_lh(instruction, bus),
            Lwl => self.op_lwl(instruction, bus),
            Lw => self.op_lw(instruction, bus),
            Lbu => self.op_lbu(instruction, bus),
            Lhu => self.op_lhu(instruction, bus),
            Lwr => self.op_lwr(instruction, bus),
            Sb => self.op_sb(instruction, bus),
            Sh => self.op_sh(instruction, bus),
            Swl => self.op_swl(instruction, bus),
            Sw => self.op_sw(instruction, bus),
            Swr => self.op_swr(instruction, bus),
            Mfc0 => self.op_mfc0(instruction),
            Mtc0 => self.op_mtc0(instruction),
            Rfe => self.op_rfe(instruction),
            Cop2 | Lwc2 | Swc2 => self.op_cop2(instruction),
            HleTrap => self.op_hle_trap(instruction, bus),
            Unknown => {
                log::warn!(
                    "Unknown instruction 0x{:08X} at PC=0x{:08X}",
                    instruction,
                    self.pc().wrapping_sub(4)
                );
                Ok(())
            }
        }
    }
}
