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

use super::super::CPU;
use crate::core::error::Result;

impl CPU {
    /// COP2 / LWC2 / SWC2
    ///
    /// Sound drivers do not use the geometry coprocessor; its operations
    /// are logged and skipped.
    pub(in crate::core::cpu) fn op_cop2(&mut self, instruction: u32) -> Result<()> {
        log::warn!(
            "GTE instruction 0x{:08X} at PC=0x{:08X} ignored",
            instruction,
            self.pc().wrapping_sub(4)
        );
        Ok(())
    }
}
