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

//! Load-delay hazards at branch targets
//!
//! The interpreter performs loads immediately, so a load sitting in a
//! branch delay slot would become visible one instruction too early. When
//! the branch target touches the loaded register, the operand-use table
//! below tells [`CPU::do_branch`](super::CPU) how to replay the target so
//! that it observes the value the hardware pipeline would have given it.

use super::decode::{decode, OperationKind};

/// Register written by an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Destination {
    None,
    Rt,
    Rd,
    Ra,
}

/// Registers an operation reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct OperandUse {
    pub(super) reads_rs: bool,
    pub(super) reads_rt: bool,
    pub(super) writes: Destination,
}

impl OperandUse {
    const fn new(reads_rs: bool, reads_rt: bool, writes: Destination) -> Self {
        Self {
            reads_rs,
            reads_rt,
            writes,
        }
    }
}

/// How a branch target interacts with a delay-slot load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hazard {
    /// The target neither reads nor writes the register
    None,
    /// The target reads the register and must see its old value
    Reads,
    /// The target overwrites the register
    Writes,
    /// The target reads the old value and overwrites it; the load is lost
    ReadsAndWrites,
}

/// Operand-use table
pub(super) fn operand_use(kind: OperationKind) -> OperandUse {
    use Destination as D;
    use OperationKind::*;

    match kind {
        Sll | Srl | Sra => OperandUse::new(false, true, D::Rd),
        Sllv | Srlv | Srav | Add | Addu | Sub | Subu | And | Or | Xor | Nor | Slt | Sltu => {
            OperandUse::new(true, true, D::Rd)
        }
        Jr | Mthi | Mtlo => OperandUse::new(true, false, D::None),
        Jalr => OperandUse::new(true, false, D::Rd),
        Mfhi | Mflo => OperandUse::new(false, false, D::Rd),
        Mult | Multu | Div | Divu | Beq | Bne => OperandUse::new(true, true, D::None),
        Bltz | Bgez | Blez | Bgtz => OperandUse::new(true, false, D::None),
        Bltzal | Bgezal => OperandUse::new(true, false, D::Ra),
        Jal => OperandUse::new(false, false, D::Ra),
        Addi | Addiu | Slti | Sltiu | Andi | Ori | Xori => OperandUse::new(true, false, D::Rt),
        Lui | Mfc0 => OperandUse::new(false, false, D::Rt),
        Lb | Lh | Lw | Lbu | Lhu => OperandUse::new(true, false, D::Rt),
        Lwl | Lwr => OperandUse::new(true, true, D::Rt),
        Sb | Sh | Swl | Sw | Swr => OperandUse::new(true, true, D::None),
        Mtc0 => OperandUse::new(false, true, D::None),
        Lwc2 | Swc2 => OperandUse::new(true, false, D::None),
        J | Syscall | Break | Rfe | Cop2 | HleTrap | Unknown => {
            OperandUse::new(false, false, D::None)
        }
    }
}

/// Classify the instruction at a branch target against register `reg`
///
/// `reg` is the destination of the load in the delay slot and is never 0.
pub fn classify(target: u32, reg: u8) -> Hazard {
    let usage = operand_use(decode(target));
    let rs = ((target >> 21) & 0x1F) as u8;
    let rt = ((target >> 16) & 0x1F) as u8;
    let rd = ((target >> 11) & 0x1F) as u8;

    let reads = (usage.reads_rs && rs == reg) || (usage.reads_rt && rt == reg);
    let writes = match usage.writes {
        Destination::None => false,
        Destination::Rt => rt == reg,
        Destination::Rd => rd == reg,
        Destination::Ra => reg == 31,
    };

    match (reads, writes) {
        (false, false) => Hazard::None,
        (true, false) => Hazard::Reads,
        (false, true) => Hazard::Writes,
        (true, true) => Hazard::ReadsAndWrites,
    }
}
