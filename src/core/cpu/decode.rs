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

//! Instruction decoding
//!
//! A 32-bit word is decoded into an [`OperationKind`]; the operand fields
//! are pulled out of the raw word by the handlers themselves. Field
//! positions are fixed by the ISA: opcode in bits 31-26, funct in bits
//! 5-0, rs/rt/rd in bits 25-21/20-16/15-11.

/// Primary opcode reserved for HLE trap words
pub const HLE_TRAP_OPCODE: u32 = 0x3B;

/// Decode R-type instruction
///
/// Format: | op (6) | rs (5) | rt (5) | rd (5) | shamt (5) | funct (6) |
///
/// # Returns
///
/// Tuple of (rs, rt, rd, shamt, funct)
#[inline(always)]
pub(super) fn decode_r_type(instr: u32) -> (u8, u8, u8, u8, u8) {
    let rs = ((instr >> 21) & 0x1F) as u8;
    let rt = ((instr >> 16) & 0x1F) as u8;
    let rd = ((instr >> 11) & 0x1F) as u8;
    let shamt = ((instr >> 6) & 0x1F) as u8;
    let funct = (instr & 0x3F) as u8;
    (rs, rt, rd, shamt, funct)
}

/// Decode I-type instruction
///
/// Format: | op (6) | rs (5) | rt (5) | immediate (16) |
///
/// # Returns
///
/// Tuple of (op, rs, rt, imm)
#[inline(always)]
pub(super) fn decode_i_type(instr: u32) -> (u8, u8, u8, u16) {
    let op = ((instr >> 26) & 0x3F) as u8;
    let rs = ((instr >> 21) & 0x1F) as u8;
    let rt = ((instr >> 16) & 0x1F) as u8;
    let imm = (instr & 0xFFFF) as u16;
    (op, rs, rt, imm)
}

/// Decode J-type instruction
///
/// Format: | op (6) | target (26) |
///
/// # Returns
///
/// Tuple of (op, target)
#[inline(always)]
pub(super) fn decode_j_type(instr: u32) -> (u8, u32) {
    let op = ((instr >> 26) & 0x3F) as u8;
    let target = instr & 0x03FF_FFFF;
    (op, target)
}

/// Operation selected by an instruction word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    // SPECIAL
    Sll,
    Srl,
    Sra,
    Sllv,
    Srlv,
    Srav,
    Jr,
    Jalr,
    Syscall,
    Break,
    Mfhi,
    Mthi,
    Mflo,
    Mtlo,
    Mult,
    Multu,
    Div,
    Divu,
    Add,
    Addu,
    Sub,
    Subu,
    And,
    Or,
    Xor,
    Nor,
    Slt,
    Sltu,

    // BCOND
    Bltz,
    Bgez,
    Bltzal,
    Bgezal,

    // Primary
    J,
    Jal,
    Beq,
    Bne,
    Blez,
    Bgtz,
    Addi,
    Addiu,
    Slti,
    Sltiu,
    Andi,
    Ori,
    Xori,
    Lui,
    Lb,
    Lh,
    Lwl,
    Lw,
    Lbu,
    Lhu,
    Lwr,
    Sb,
    Sh,
    Swl,
    Sw,
    Swr,

    // Coprocessors
    Mfc0,
    Mtc0,
    Rfe,
    Cop2,
    Lwc2,
    Swc2,

    /// High-level-emulated BIOS entry point
    HleTrap,

    /// Anything the R3000A does not define
    Unknown,
}

impl OperationKind {
    /// Loads into a general purpose register
    pub fn is_load(self) -> bool {
        matches!(
            self,
            Self::Lb | Self::Lh | Self::Lwl | Self::Lw | Self::Lbu | Self::Lhu | Self::Lwr
        )
    }
}

/// Decode an instruction word
pub fn decode(instr: u32) -> OperationKind {
    use OperationKind::*;

    match instr >> 26 {
        0x00 => decode_special(instr),
        0x01 => {
            let rt = (instr >> 16) & 0x1F;
            let link = rt & 0x1E == 0x10;
            match (rt & 1 != 0, link) {
                (false, false) => Bltz,
                (true, false) => Bgez,
                (false, true) => Bltzal,
                (true, true) => Bgezal,
            }
        }
        0x02 => J,
        0x03 => Jal,
        0x04 => Beq,
        0x05 => Bne,
        0x06 => Blez,
        0x07 => Bgtz,
        0x08 => Addi,
        0x09 => Addiu,
        0x0A => Slti,
        0x0B => Sltiu,
        0x0C => Andi,
        0x0D => Ori,
        0x0E => Xori,
        0x0F => Lui,
        0x10 => match (instr >> 21) & 0x1F {
            0x00 => Mfc0,
            0x04 => Mtc0,
            0x10 if instr & 0x3F == 0x10 => Rfe,
            _ => Unknown,
        },
        0x12 => Cop2,
        0x20 => Lb,
        0x21 => Lh,
        0x22 => Lwl,
        0x23 => Lw,
        0x24 => Lbu,
        0x25 => Lhu,
        0x26 => Lwr,
        0x28 => Sb,
        0x29 => Sh,
        0x2A => Swl,
        0x2B => Sw,
        0x2E => Swr,
        0x32 => Lwc2,
        0x3A => Swc2,
        HLE_TRAP_OPCODE => HleTrap,
        _ => Unknown,
    }
}

fn decode_special(instr: u32) -> OperationKind {
    use OperationKind::*;

    match instr & 0x3F {
        0x00 => Sll,
        0x02 => Srl,
        0x03 => Sra,
        0x04 => Sllv,
        0x06 => Srlv,
        0x07 => Srav,
        0x08 => Jr,
        0x09 => Jalr,
        0x0C => Syscall,
        0x0D => Break,
        0x10 => Mfhi,
        0x11 => Mthi,
        0x12 => Mflo,
        0x13 => Mtlo,
        0x18 => Mult,
        0x19 => Multu,
        0x1A => Div,
        0x1B => Divu,
        0x20 => Add,
        0x21 => Addu,
        0x22 => Sub,
        0x23 => Subu,
        0x24 => And,
        0x25 => Or,
        0x26 => Xor,
        0x27 => Nor,
        0x2A => Slt,
        0x2B => Sltu,
        _ => Unknown,
    }
}
