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

use super::super::bios::TrapKind;
use super::super::{ExceptionCause, CPU};
use crate::core::bus::Bus;
use crate::core::error::Result;

impl CPU {
    // === Exception Instructions ===

    /// SYSCALL: raise a system call exception (CAUSE = 0x20)
    pub(in crate::core::cpu) fn op_syscall(&mut self, _instruction: u32) -> Result<()> {
        self.exception(ExceptionCause::Syscall);
        Ok(())
    }

    /// BREAK: raise a breakpoint exception
    pub(in crate::core::cpu) fn op_break(&mut self, _instruction: u32) -> Result<()> {
        self.exception(ExceptionCause::Breakpoint);
        Ok(())
    }

    /// HLE trap word planted by the BIOS stand-in
    pub(in crate::core::cpu) fn op_hle_trap(&mut self, instruction: u32, bus: &mut Bus) -> Result<()> {
        match TrapKind::from_word(instruction) {
            Some(kind) => self.hle_trap(kind, bus),
            None => {
                log::warn!(
                    "Unknown HLE trap 0x{:08X} at PC=0x{:08X}",
                    instruction,
                    self.pc().wrapping_sub(4)
                );
                Ok(())
            }
        }
    }
}
