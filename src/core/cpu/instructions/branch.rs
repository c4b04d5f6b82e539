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

use super::super::decode::{decode, decode_i_type};
use super::super::hazard::{classify, Hazard};
use super::super::CPU;
use crate::core::bus::Bus;
use crate::core::error::Result;

impl CPU {
    // === Branch Instructions ===

    /// BLTZ / BGEZ / BLTZAL / BGEZAL
    ///
    /// Bit 0 of rt selects BGEZ over BLTZ; rt = 0x10/0x11 link. The link
    /// register is written whether or not the branch is taken.
    pub(in crate::core::cpu) fn op_bcondz(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (_, rs, rt, imm) = decode_i_type(instruction);
        let is_bgez = (rt & 0x01) != 0;
        let is_link = (rt & 0x1E) == 0x10;

        let test = (self.reg(rs) as i32) >= 0;
        let should_branch = if is_bgez { test } else { !test };

        if is_link {
            self.set_reg(Self::RA, self.pc().wrapping_add(4));
        }

        if should_branch {
            self.branch(imm, bus)?;
        }
        Ok(())
    }

    pub(in crate::core::cpu) fn op_beq(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (_, rs, rt, imm) = decode_i_type(instruction);
        if self.reg(rs) == self.reg(rt) {
            self.branch(imm, bus)?;
        }
        Ok(())
    }

    pub(in crate::core::cpu) fn op_bne(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (_, rs, rt, imm) = decode_i_type(instruction);
        if self.reg(rs) != self.reg(rt) {
            self.branch(imm, bus)?;
        }
        Ok(())
    }

    pub(in crate::core::cpu) fn op_blez(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (_, rs, _, imm) = decode_i_type(instruction);
        if (self.reg(rs) as i32) <= 0 {
            self.branch(imm, bus)?;
        }
        Ok(())
    }

    pub(in crate::core::cpu) fn op_bgtz(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        let (_, rs, _, imm) = decode_i_type(instruction);
        if (self.reg(rs) as i32) > 0 {
            self.branch(imm, bus)?;
        }
        Ok(())
    }

    /// Take a PC-relative branch
    ///
    /// PC already points at the delay slot; the offset is relative to it.
    fn branch(&mut self, imm: u16, bus: &mut Bus) -> Result<()> {
        let offset = ((imm as i16) as i32) << 2;
        let target = self.pc().wrapping_add(offset as u32);
        self.do_branch(target, bus)
    }

    /// Execute the delay slot, then transfer control to `target`
    ///
    /// A load in the delay slot is checked against the instruction at the
    /// target. Because loads complete immediately here, the target would
    /// otherwise observe the loaded value one instruction early:
    ///
    /// - [`Hazard::Reads`]: the target is executed right away with the
    ///   old register value, then the loaded value is written back. A
    ///   branch at the target commits the load before its delay slot.
    /// - [`Hazard::ReadsAndWrites`]: the load never becomes visible, so it
    ///   is skipped.
    /// - [`Hazard::Writes`] and [`Hazard::None`]: the load runs normally.
    pub(in crate::core::cpu) fn do_branch(&mut self, target: u32, bus: &mut Bus) -> Result<()> {
        // This branch sat at a hazard target and has already read its
        // operands, so the held-back load lands before our delay slot.
        if let Some((reg, value)) = self.deferred_load.take() {
            self.set_reg(reg, value);
        }

        let branch_pc = self.pc().wrapping_sub(4);
        let slot_pc = self.pc();
        let slot = bus.read::<u32>(slot_pc);
        bus.tick();
        self.regs[Self::PC] = slot_pc.wrapping_add(4);
        self.in_delay_slot = true;
        self.exception_taken = false;

        let rt = ((slot >> 16) & 0x1F) as u8;
        let hazard = if decode(slot).is_load() && rt != 0 {
            classify(bus.read::<u32>(target), rt)
        } else {
            Hazard::None
        };

        match hazard {
            Hazard::ReadsAndWrites => {
                log::trace!(
                    "Delay slot load at 0x{:08X} discarded by target 0x{:08X}",
                    slot_pc,
                    target
                );
            }
            Hazard::Reads => {
                let old = self.reg(rt);
                self.execute(slot, bus)?;

                if !self.exception_taken {
                    let new = self.reg(rt);
                    self.in_delay_slot = false;
                    self.regs[Self::PC] = target;

                    self.set_reg(rt, old);
                    self.deferred_load = Some((rt, new));
                    self.step(bus)?;
                    if let Some((reg, value)) = self.deferred_load.take() {
                        self.set_reg(reg, value);
                    }

                    return self.branch_test(bus, false);
                }
            }
            Hazard::Writes | Hazard::None => self.execute(slot, bus)?,
        }

        self.in_delay_slot = false;
        if self.exception_taken {
            return Ok(());
        }

        self.regs[Self::PC] = target;
        let idle_loop = target == branch_pc && slot == 0;
        self.branch_test(bus, idle_loop)
    }
}
