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
    // === COP0 Instructions ===

    /// MFC0: rt = cop0[rd]
    pub(in crate::core::cpu) fn op_mfc0(&mut self, instruction: u32) -> Result<()> {
        let (_, rt, rd, _, _) = decode_r_type(instruction);
        let value = self.cop0.regs[rd as usize];
        self.set_reg(rt, value);
        Ok(())
    }

    /// MTC0: cop0[rd] = rt
    pub(in crate::core::cpu) fn op_mtc0(&mut self, instruction: u32) -> Result<()> {
        let (_, rt, rd, _, _) = decode_r_type(instruction);
        let value = self.reg(rt);
        log::trace!("MTC0 cop0r{} <- 0x{:08X}", rd, value);
        self.cop0.regs[rd as usize] = value;
        Ok(())
    }

    /// RFE: pop the KU/IE mode stack
    pub(in crate::core::cpu) fn op_rfe(&mut self, _instruction: u32) -> Result<()> {
        self.cop0.pop_mode();
        Ok(())
    }
}
