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

//! A0 table: the C library subset used by sound drivers

use std::cmp::Ordering;

use super::{Register, CPU};
use crate::core::bus::Bus;
use crate::core::error::Result;

/// Longest string the stand-ins will walk
const STRING_LIMIT: usize = 0x10000;

/// Registers saved by setjmp, in buffer order after ra/sp/fp
const SAVED_REGISTERS: [Register; 8] = [
    Register::S0,
    Register::S1,
    Register::S2,
    Register::S3,
    Register::S4,
    Register::S5,
    Register::S6,
    Register::S7,
];

impl CPU {
    pub(super) fn call_a0(&mut self, function: u32, bus: &mut Bus) -> Result<()> {
        log::trace!("A0:{:02X}", function);

        match function {
            0x13 => self.bios_setjmp(bus)?,
            0x14 => {
                let (buffer, value) = (self.arg(0), self.arg(1));
                self.longjmp(buffer, value, bus);
            }
            0x17 => self.bios_strcmp(bus),
            0x19 => self.bios_strcpy(bus)?,
            0x1B => {
                let len = Self::read_cstring(bus, self.arg(0), STRING_LIMIT).len();
                self.set_return(len as u32);
            }
            0x28 => {
                // bzero
                let (dst, len) = (self.arg(0), self.length(1));
                self.fill(bus, dst, 0, len)?;
                self.set_return(dst);
            }
            0x2A => self.bios_memcpy(bus)?,
            0x2B => {
                // memset
                let (dst, value, len) = (self.arg(0), self.arg(1) as u8, self.length(2));
                self.fill(bus, dst, value, len)?;
                self.set_return(dst);
            }
            0x2C => self.bios_memmove(bus)?,
            0x2F => {
                // rand
                self.bios.rand_seed = self
                    .bios
                    .rand_seed
                    .wrapping_mul(1_103_515_245)
                    .wrapping_add(12345);
                self.set_return((self.bios.rand_seed >> 16) & 0x7FFF);
            }
            0x30 => {
                // srand
                self.bios.rand_seed = self.arg(0);
            }
            0x33 => {
                let block = self.bios.heap.allocate(self.arg(0)).unwrap_or(0);
                self.set_return(block);
            }
            0x34 => {
                if !self.bios.heap.release(self.arg(0)) {
                    log::warn!("free: 0x{:08X} is not an allocated block", self.arg(0));
                }
            }
            0x39 => {
                let (start, size) = (self.arg(0), self.arg(1));
                self.bios.heap.init(start, size);
                log::debug!("InitHeap 0x{:08X} ({} bytes)", start, size);
            }
            0x3F => self.bios_printf(bus),
            0x44 => log::trace!("FlushCache"),
            _ => {
                log::warn!("Unimplemented BIOS call A0:{:02X}", function);
                self.set_return(0);
            }
        }
        Ok(())
    }

    // === setjmp / longjmp ===

    fn bios_setjmp(&mut self, bus: &mut Bus) -> Result<()> {
        let buffer = self.arg(0);
        let mut words = vec![
            self.reg(Register::Ra as u8),
            self.reg(Register::Sp as u8),
            self.reg(Register::Fp as u8),
        ];
        words.extend(SAVED_REGISTERS.iter().map(|&r| self.reg(r as u8)));
        words.push(self.reg(Register::Gp as u8));

        for (i, word) in words.into_iter().enumerate() {
            bus.write::<u32>(buffer + 4 * i as u32, word)?;
        }
        self.set_return(0);
        Ok(())
    }

    /// Restore a setjmp buffer and continue at its ra with v0 = `value`
    pub(super) fn longjmp(&mut self, buffer: u32, value: u32, bus: &Bus) {
        let word = |i: u32| bus.read::<u32>(buffer + 4 * i);

        let ra = word(0);
        self.set_reg(Register::Ra as u8, ra);
        self.set_reg(Register::Sp as u8, word(1));
        self.set_reg(Register::Fp as u8, word(2));
        for (i, &r) in SAVED_REGISTERS.iter().enumerate() {
            self.set_reg(r as u8, word(3 + i as u32));
        }
        self.set_reg(Register::Gp as u8, word(11));

        self.set_return(value);
        self.regs[Self::PC] = ra;
    }

    // === Strings ===

    fn bios_strcmp(&mut self, bus: &mut Bus) {
        let a = Self::read_cstring(bus, self.arg(0), STRING_LIMIT);
        let b = Self::read_cstring(bus, self.arg(1), STRING_LIMIT);
        let result = match a.cmp(&b) {
            Ordering::Less => -1i32,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        };
        self.set_return(result as u32);
    }

    fn bios_strcpy(&mut self, bus: &mut Bus) -> Result<()> {
        let (dst, src) = (self.arg(0), self.arg(1));
        let mut bytes = Self::read_cstring(bus, src, STRING_LIMIT);
        bytes.push(0);
        self.copy_out(bus, dst, &bytes)?;
        self.set_return(dst);
        Ok(())
    }

    // === Memory ===

    /// Byte count argument; negative lengths copy nothing
    fn length(&self, n: u8) -> u32 {
        (self.arg(n) as i32).max(0) as u32
    }

    fn bios_memcpy(&mut self, bus: &mut Bus) -> Result<()> {
        let (dst, src, len) = (self.arg(0), self.arg(1), self.length(2));
        for i in 0..len {
            let byte = bus.read::<u8>(src.wrapping_add(i));
            bus.write::<u8>(dst.wrapping_add(i), byte)?;
        }
        self.set_return(dst);
        Ok(())
    }

    fn bios_memmove(&mut self, bus: &mut Bus) -> Result<()> {
        let (dst, src, len) = (self.arg(0), self.arg(1), self.length(2));
        let bytes: Vec<u8> = (0..len)
            .map(|i| bus.read::<u8>(src.wrapping_add(i)))
            .collect();
        self.copy_out(bus, dst, &bytes)?;
        self.set_return(dst);
        Ok(())
    }

    fn fill(&self, bus: &mut Bus, dst: u32, value: u8, len: u32) -> Result<()> {
        for i in 0..len {
            bus.write::<u8>(dst.wrapping_add(i), value)?;
        }
        Ok(())
    }

    fn copy_out(&self, bus: &mut Bus, dst: u32, bytes: &[u8]) -> Result<()> {
        for (i, &byte) in bytes.iter().enumerate() {
            bus.write::<u8>(dst.wrapping_add(i as u32), byte)?;
        }
        Ok(())
    }

    // === printf ===

    /// Format a printf call and log it
    ///
    /// Arguments come from a1-a3 and then the caller's stack at sp+16.
    fn bios_printf(&mut self, bus: &mut Bus) {
        let format = Self::read_cstring(bus, self.arg(0), STRING_LIMIT);
        let sp = self.reg(Register::Sp as u8);
        let mut next_arg = 1u32;
        let mut arg = |cpu: &CPU| {
            let value = if next_arg < 4 {
                cpu.arg(next_arg as u8)
            } else {
                bus.read::<u32>(sp.wrapping_add(4 * next_arg))
            };
            next_arg += 1;
            value
        };

        let mut out = String::new();
        let mut chars = format.iter().copied();
        while let Some(c) = chars.next() {
            if c != b'%' {
                out.push(c as char);
                continue;
            }
            match chars.next() {
                Some(b'd') | Some(b'i') => out.push_str(&(arg(self) as i32).to_string()),
                Some(b'u') => out.push_str(&arg(self).to_string()),
                Some(b'x') => out.push_str(&format!("{:x}", arg(self))),
                Some(b'X') => out.push_str(&format!("{:X}", arg(self))),
                Some(b'c') => out.push(arg(self) as u8 as char),
                Some(b's') => {
                    let text = Self::read_cstring(bus, arg(self), STRING_LIMIT);
                    out.push_str(&String::from_utf8_lossy(&text));
                }
                Some(b'%') => out.push('%'),
                Some(other) => {
                    out.push('%');
                    out.push(other as char);
                }
                None => out.push('%'),
            }
        }

        log::info!("[tty] {}", out.trim_end_matches('\n'));
        self.set_return(out.len() as u32);
    }
}
