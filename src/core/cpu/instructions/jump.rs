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

use super::super::decode::{decode_j_type, decode_r_type};
use super::super::CPU;
use crate::core::bus::Bus;
use crate::core::error::Result;

impl CPU {
    // === Jump Instructions ===

    /// J: jump within the current 256MB region
    pub(in crate::core::cpu) fn op_j(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (_, target) = decode_j_type(instruction);
        let target = (self.pc() & 0xF000_0000) | (target << 2);
        self.do_branch(target, bus)
    }

    /// JAL: jump and link
    ///
    /// ra = address after the delay slot
    pub(in crate::core::cpu) fn op_jal(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        self.set_reg(Self::RA, self.pc().wrapping_add(4));
        self.op_j(instruction, bus)
    }

    /// JR: jump to rs
    pub(in crate::core::cpu) fn op_jr(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (rs, _, _, _, _) = decode_r_type(instruction);
        let target = self.reg(rs);
        self.do_branch(target, bus)
    }

    /// JALR: jump to rs, rd = address after the delay slot
    ///
    /// rs is read before rd is written, so `jalr ra, ra` jumps to the old
    /// value.
    pub(in crate::core::cpu) fn op_jalr(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (rs, _, rd, _, _) = decode_r_type(instruction);
        let target = self.reg(rs);
        self.set_reg(rd, self.pc().wrapping_add(4));
        self.do_branch(target, bus)
    }
}
