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

//! I/O port routing
//!
//! Every register in the hardware window is at most 32 bits wide. Reads
//! return the containing register shifted down to the accessed byte lane;
//! narrow writes are merged into the current register value first.

use super::Bus;
use crate::core::dma::TransferDirection;
use crate::core::error::Result;
use crate::core::interrupt::Irq;
use crate::core::memory::AddressSpace;
use crate::core::spu::registers::{
    voice_register, KEY_OFF_HIGH, KEY_OFF_LOW, KEY_ON_HIGH, KEY_ON_LOW, SPU_BASE, SPU_END,
    TRANSFER_FIFO, VOICE_COUNT, VOICE_LOOP_ADDRESS,
};
use crate::core::spu::SpuRequest;

impl Bus {
    /// Interrupt status register
    pub const I_STAT: u32 = 0x1F80_1070;
    /// Interrupt mask register
    pub const I_MASK: u32 = 0x1F80_1074;

    /// DMA channel 4 memory address
    pub const DMA4_MADR: u32 = 0x1F80_10C0;
    /// DMA channel 4 block control
    pub const DMA4_BCR: u32 = 0x1F80_10C4;
    /// DMA channel 4 channel control
    pub const DMA4_CHCR: u32 = 0x1F80_10C8;
    /// DMA control (priority / enable)
    pub const DPCR: u32 = 0x1F80_10F0;
    /// DMA interrupt register
    pub const DICR: u32 = 0x1F80_10F4;

    /// First root counter register
    pub const TIMER_BASE: u32 = 0x1F80_1100;
    /// Last root counter register byte
    pub const TIMER_END: u32 = 0x1F80_113F;

    /// Read a routed register
    ///
    /// # Returns
    ///
    /// `None` if `port` is not owned by a device
    pub(super) fn read_io_port(&self, port: u32, size: usize) -> Option<u32> {
        let shift = 8 * (port & 3);

        let value = match port & !3 {
            Self::I_STAT => self.irq.read_status() >> shift,
            Self::I_MASK => self.irq.read_mask() >> shift,
            Self::DMA4_MADR => self.dma.read_madr() >> shift,
            Self::DMA4_BCR => self.dma.read_bcr() >> shift,
            Self::DMA4_CHCR => self.dma.read_chcr() >> shift,
            Self::DPCR => self.dma.read_control() >> shift,
            Self::DICR => self.dma.read_interrupt() >> shift,
            Self::TIMER_BASE..=Self::TIMER_END => self.read_timer(port & !3) >> shift,
            SPU_BASE..=SPU_END => return Some(self.read_spu(port, size)),
            _ => return None,
        };

        log::trace!("I/O read{} 0x{:08X} -> 0x{:08X}", size * 8, port, value);
        Some(value)
    }

    /// Write a routed register
    ///
    /// # Returns
    ///
    /// `Ok(false)` if `port` is not owned by a device
    pub(super) fn write_io_port(&mut self, port: u32, value: u32, size: usize) -> Result<bool> {
        let reg = port & !3;

        match reg {
            Self::I_STAT => {
                // Zero bytes outside the access never clear anything
                let value = merge(0, value, port, size);
                self.irq.write_status(value);
            }
            Self::I_MASK => {
                let value = merge(self.irq.read_mask(), value, port, size);
                self.irq.write_mask(value);
            }
            Self::DMA4_MADR => {
                let value = merge(self.dma.read_madr(), value, port, size);
                self.dma.write_madr(value);
            }
            Self::DMA4_BCR => {
                let value = merge(self.dma.read_bcr(), value, port, size);
                self.dma.write_bcr(value);
            }
            Self::DMA4_CHCR => {
                let value = merge(self.dma.read_chcr(), value, port, size);
                if self.dma.write_chcr(value) {
                    self.run_spu_dma()?;
                }
            }
            Self::DPCR => {
                let value = merge(self.dma.read_control(), value, port, size);
                self.dma.write_control(value);
            }
            Self::DICR => {
                let value = merge(self.dma.read_interrupt() & 0x00FF_FFFF, value, port, size);
                self.dma.write_interrupt(value);
            }
            Self::TIMER_BASE..=Self::TIMER_END => {
                let value = merge(self.read_timer(reg), value, port, size);
                self.write_timer(reg, value);
            }
            SPU_BASE..=SPU_END => self.write_spu_access(port, value, size)?,
            _ => return Ok(false),
        }

        Ok(true)
    }

    fn read_timer(&self, reg: u32) -> u32 {
        let n = ((reg >> 4) & 3) as usize;
        match reg & 0xF {
            0x0 => self.counters.read_count(n),
            0x4 => self.counters.read_mode(n),
            0x8 => self.counters.read_target(n),
            _ => 0,
        }
    }

    fn write_timer(&mut self, reg: u32, value: u32) {
        let n = ((reg >> 4) & 3) as usize;
        match reg & 0xF {
            0x0 => self.counters.write_count(n, value),
            0x4 => self.counters.write_mode(n, value),
            0x8 => self.counters.write_target(n, value),
            _ => log::trace!("Write to unused counter register 0x{:08X}", reg),
        }
    }

    /// SPU registers are 16 bits wide: words split, bytes widen
    fn read_spu(&self, port: u32, size: usize) -> u32 {
        let spu = self.spu.lock();
        match size {
            4 => {
                let low = spu.read_register(port) as u32;
                let high = spu.read_register(port + 2) as u32;
                low | (high << 16)
            }
            _ => (spu.read_register(port & !1) as u32) >> (8 * (port & 1)),
        }
    }

    fn write_spu_access(&mut self, port: u32, value: u32, size: usize) -> Result<()> {
        match size {
            4 => {
                self.write_spu(port, value as u16)?;
                self.write_spu(port + 2, (value >> 16) as u16)
            }
            2 => self.write_spu(port, value as u16),
            _ => {
                let addr = port & !1;
                let old = self.spu.lock().read_register(addr) as u32;
                let merged = merge(old, value, port & 1, 1);
                self.write_spu(addr, merged as u16)
            }
        }
    }

    /// Write one SPU register
    ///
    /// Writes that change channel state first bring the audio up to the
    /// current cycle, then hand the change to the worker.
    fn write_spu(&mut self, addr: u32, value: u16) -> Result<()> {
        let offset = addr.wrapping_sub(SPU_BASE) & 0x1FE;

        match offset {
            KEY_ON_LOW | KEY_ON_HIGH | KEY_OFF_LOW | KEY_OFF_HIGH => {
                self.spu_run()?;
                self.spu.lock().write_register(addr, value);

                let first = if offset == KEY_ON_HIGH || offset == KEY_OFF_HIGH {
                    16
                } else {
                    0
                };
                let key_on = offset == KEY_ON_LOW || offset == KEY_ON_HIGH;

                for bit in 0..16 {
                    let voice = first + bit;
                    if value & (1 << bit) == 0 || voice >= VOICE_COUNT {
                        continue;
                    }
                    let request = if key_on {
                        SpuRequest::NoteOn(voice)
                    } else {
                        SpuRequest::NoteOff(voice)
                    };
                    self.spu.request(request)?;
                }
            }
            TRANSFER_FIFO => {
                self.spu_run()?;
                self.spu.lock().write_register(addr, value);
            }
            _ => match voice_register(offset) {
                Some((voice, VOICE_LOOP_ADDRESS)) => {
                    self.spu_run()?;
                    self.spu.lock().write_register(addr, value);
                    self.spu.request(SpuRequest::SetOffset(voice))?;
                }
                _ => self.spu.lock().write_register(addr, value),
            },
        }

        Ok(())
    }

    /// Carry out the programmed DMA4 transfer immediately
    fn run_spu_dma(&mut self) -> Result<()> {
        self.spu_run()?;

        let channel = self.dma.spu();
        let addr = channel.address();
        let words = channel.word_count();
        let direction = channel.direction();
        let len = (words * 4).min(AddressSpace::RAM_SIZE - addr as usize);

        log::debug!(
            "DMA4 {:?}: {} bytes at 0x{:08X}",
            direction,
            len,
            addr
        );

        match direction {
            TransferDirection::FromRam => {
                if let Some(data) = self.memory.slice(addr, len) {
                    self.spu.lock().write_dma4_memory(data);
                }
            }
            TransferDirection::ToRam => {
                if let Some(out) = self.memory.slice_mut(addr, len) {
                    self.spu.lock().read_dma4_memory(out);
                }
            }
        }

        if self.dma.complete(words) {
            self.irq.request(Irq::DMA);
        }
        Ok(())
    }
}

/// Merge a `size`-byte access at byte lane `port & 3` into `old`
fn merge(old: u32, value: u32, port: u32, size: usize) -> u32 {
    if size >= 4 {
        return value;
    }
    let shift = 8 * (port & 3);
    let mask = ((1u32 << (size * 8)) - 1) << shift;
    (old & !mask) | ((value << shift) & mask)
}
