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

//! Hardware register bus
//!
//! The interpreter reaches memory only through [`Bus`]. Plain accesses go
//! straight to the [`AddressSpace`]; accesses to the I/O part of the
//! hardware window are routed to the device that owns the register.
//!
//! # Routed Windows
//!
//! | Physical Address        | Device               |
//! |-------------------------|----------------------|
//! | 0x1F801070 / 0x1F801074 | Interrupt controller |
//! | 0x1F8010C0-0x1F8010CB   | DMA channel 4        |
//! | 0x1F8010F0 / 0x1F8010F4 | DMA control          |
//! | 0x1F801100-0x1F80113F   | Root counters        |
//! | 0x1F801C00-0x1F801DFF   | SPU                  |
//!
//! Everything else in the window is backed by plain memory.

use crate::core::dma::DmaController;
use crate::core::error::Result;
use crate::core::interrupt::InterruptController;
use crate::core::memory::{AddressSpace, MemoryValue};
use crate::core::spu::SpuBridge;
use crate::core::timer::RootCounter;

mod io_ports;
#[cfg(test)]
mod tests;

/// Memory plus every device the interpreter can address
pub struct Bus {
    memory: AddressSpace,
    irq: InterruptController,
    counters: RootCounter,
    dma: DmaController,
    spu: SpuBridge,
}

impl Bus {
    /// Build a bus around a running SPU worker
    ///
    /// The address space segment table is built here.
    ///
    /// # Arguments
    ///
    /// * `vsync_hz` - VSync pacer frequency (60 or 50)
    /// * `spu` - Bridge to the SPU worker thread
    pub fn new(vsync_hz: u32, spu: SpuBridge) -> Self {
        let mut memory = AddressSpace::new();
        memory.init();

        Self {
            memory,
            irq: InterruptController::new(),
            counters: RootCounter::new(vsync_hz),
            dma: DmaController::new(),
            spu,
        }
    }

    /// Reset memory and devices
    ///
    /// The SPU keeps its player settings (interpolation, reverb).
    pub fn reset(&mut self) {
        self.memory.reset();
        self.irq.reset();
        self.counters.reset();
        self.dma.reset();
        self.spu.lock().reset();
        log::debug!("Bus reset");
    }

    /// Typed read
    #[inline(always)]
    pub fn read<T: MemoryValue>(&self, addr: u32) -> T {
        if let Some(port) = self.memory.io_port(addr) {
            if let Some(value) = self.read_io_port(port, T::SIZE) {
                return T::from_u32(value);
            }
        }
        self.memory.read::<T>(addr)
    }

    /// Typed write
    ///
    /// Fails only if a routed SPU write needs the worker and the worker is
    /// gone.
    #[inline(always)]
    pub fn write<T: MemoryValue>(&mut self, addr: u32, value: T) -> Result<()> {
        if let Some(port) = self.memory.io_port(addr) {
            if self.write_io_port(port, value.to_u32(), T::SIZE)? {
                return Ok(());
            }
        }
        self.memory.write::<T>(addr, value);
        Ok(())
    }

    /// Advance the cycle clock by one instruction
    #[inline(always)]
    pub fn tick(&mut self) {
        self.counters.advance(1);
    }

    /// Fire due counters and deliver their interrupts
    pub fn update_counters(&mut self) -> Result<()> {
        self.counters.update(&mut self.irq, &mut self.spu)
    }

    /// Synthesize audio up to the current cycle
    pub fn spu_run(&mut self) -> Result<()> {
        self.counters.spu_run(&mut self.spu)
    }

    /// Stop the SPU worker after flushing pending audio
    pub fn shutdown(&mut self) -> Result<()> {
        self.spu.shutdown()
    }

    pub fn memory(&self) -> &AddressSpace {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut AddressSpace {
        &mut self.memory
    }

    pub fn irq(&self) -> &InterruptController {
        &self.irq
    }

    pub fn irq_mut(&mut self) -> &mut InterruptController {
        &mut self.irq
    }

    pub fn counters(&self) -> &RootCounter {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut RootCounter {
        &mut self.counters
    }

    pub fn dma(&self) -> &DmaController {
        &self.dma
    }

    pub fn spu(&self) -> &SpuBridge {
        &self.spu
    }

    pub fn spu_mut(&mut self) -> &mut SpuBridge {
        &mut self.spu
    }
}
