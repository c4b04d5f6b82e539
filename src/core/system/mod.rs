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

//! System integration
//!
//! [`System`] owns the interpreter, the bus (and through it the address
//! space, counters and SPU worker) and the HLE BIOS. It can be driven
//! synchronously with [`System::step`] / [`System::run_cycles`], or moved
//! onto its own CPU thread with [`System::execute`].
//!
//! # Example
//!
//! ```no_run
//! use psfrx::core::audio::WavSink;
//! use psfrx::core::config::PlayerConfig;
//! use psfrx::core::loader::LoadedImage;
//! use psfrx::core::system::System;
//!
//! let image = LoadedImage::from_file("song.exe")?;
//! let sink = WavSink::create("song.wav")?;
//! let mut system = System::new(PlayerConfig::default(), Box::new(sink))?;
//!
//! system.load_image(&image)?;
//! system.run_seconds(10)?;
//! system.finish()?;
//! # Ok::<(), psfrx::core::error::EmulatorError>(())
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::audio::SampleSink;
use super::bus::Bus;
use super::config::PlayerConfig;
use super::cpu::{Bios, Register, CPU};
use super::error::{EmulatorError, Result};
use super::loader::LoadedImage;
use super::spu::{Spu, SpuBridge, SpuMeter};
use super::timer::{BIAS, PSXCLK};

#[cfg(test)]
mod tests;

/// Instructions run between stop-flag checks on the CPU thread
const SLICE_STEPS: u32 = 4096;

/// The emulated console
pub struct System {
    cpu: CPU,
    bus: Bus,
    config: PlayerConfig,
    initialized: bool,
}

impl System {
    /// Build the bus, start the SPU worker and install the HLE BIOS
    ///
    /// # Arguments
    ///
    /// * `config` - Player settings
    /// * `sink` - Destination of the synthesized audio
    pub fn new(config: PlayerConfig, sink: Box<dyn SampleSink + Send>) -> Result<Self> {
        config.validate()?;

        let mut spu = Spu::new();
        spu.set_interpolation(config.interpolation);
        spu.set_reverb_enabled(config.reverb);
        let bridge = SpuBridge::spawn(spu, sink, config.ring_frames)?;

        let mut cpu = CPU::new();
        cpu.set_dead_loop_skip(config.dead_loop_skip);

        let mut system = Self {
            cpu,
            bus: Bus::new(config.vsync_hz, bridge),
            config,
            initialized: false,
        };
        system.init()?;
        Ok(system)
    }

    /// Build the segment table and plant the BIOS traps
    ///
    /// Calling this more than once is a no-op.
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.bus.memory_mut().init();
        Bios::install(self.bus.memory_mut())?;
        self.initialized = true;
        log::info!(
            "System initialized ({} Hz, {} interpolation, reverb {})",
            self.config.vsync_hz,
            self.config.interpolation,
            if self.config.reverb { "on" } else { "off" }
        );
        Ok(())
    }

    /// Reset the CPU, RAM and devices, then reinstall the BIOS
    pub fn reset(&mut self) -> Result<()> {
        self.cpu.reset();
        self.bus.reset();
        Bios::install(self.bus.memory_mut())?;
        self.initialized = true;
        log::info!("System reset");
        Ok(())
    }

    /// Copy an executable into RAM and seed the registers from its header
    pub fn load_image(&mut self, image: &LoadedImage) -> Result<()> {
        self.init()?;
        self.bus.memory_mut().load(image.load_address, &image.text);
        self.seed(image.pc, image.gp, image.sp);
        Ok(())
    }

    /// Seed PC, GP and SP (FP follows SP)
    pub fn seed(&mut self, pc: u32, gp: u32, sp: u32) {
        self.cpu.set_reg(Register::Pc as u8, pc);
        self.cpu.set_reg(Register::Gp as u8, gp);
        self.cpu.set_reg(Register::Sp as u8, sp);
        self.cpu.set_reg(Register::Fp as u8, sp);
        log::debug!(
            "Seeded PC=0x{:08X} GP=0x{:08X} SP=0x{:08X}",
            pc,
            gp,
            sp
        );
    }

    /// Execute one instruction (a taken branch includes its delay slot)
    pub fn step(&mut self) -> Result<()> {
        self.cpu.step(&mut self.bus)
    }

    /// Step until PC equals `pc` or `max_steps` instructions ran
    pub fn run_until(&mut self, pc: u32, max_steps: u64) -> Result<bool> {
        self.cpu.run_until(&mut self.bus, pc, max_steps)
    }

    /// Run at least `cycles` cycles of emulated time
    pub fn run_cycles(&mut self, cycles: u32) -> Result<()> {
        let start = self.bus.counters().cycle();
        while self.bus.counters().cycle().wrapping_sub(start) < cycles {
            self.cpu.step(&mut self.bus)?;
        }
        Ok(())
    }

    /// Run `seconds` of emulated time
    pub fn run_seconds(&mut self, seconds: u32) -> Result<()> {
        for second in 0..seconds {
            self.run_cycles(PSXCLK / BIAS)?;
            log::debug!("Emulated {} s", second + 1);
        }
        Ok(())
    }

    /// Flush audio up to the current cycle and stop the SPU worker
    pub fn finish(&mut self) -> Result<()> {
        if self.bus.spu().is_running() {
            self.bus.spu_run()?;
        }
        self.bus.shutdown()
    }

    /// Move the system onto a CPU thread
    ///
    /// The thread runs until [`Running::shutdown`] is called or an error
    /// stops it.
    pub fn execute(self) -> Result<Running> {
        let stop = Arc::new(AtomicBool::new(false));
        let meter = self.meter();
        let flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("cpu".to_string())
            .spawn(move || self.run_until_stopped(&flag))?;

        log::info!("CPU thread started");
        Ok(Running {
            stop,
            meter,
            handle: Some(handle),
        })
    }

    fn run_until_stopped(mut self, stop: &AtomicBool) -> Result<Self> {
        while !stop.load(Ordering::Acquire) {
            for _ in 0..SLICE_STEPS {
                if let Err(e) = self.cpu.step(&mut self.bus) {
                    log::error!("CPU thread stopped at PC=0x{:08X}: {}", self.cpu.pc(), e);
                    return Err(e);
                }
            }
        }
        Ok(self)
    }

    /// Metering handle for the SPU
    pub fn meter(&self) -> SpuMeter {
        self.bus.spu().meter()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CPU {
        &mut self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }
}

/// A system running on its CPU thread
pub struct Running {
    stop: Arc<AtomicBool>,
    meter: SpuMeter,
    handle: Option<JoinHandle<Result<System>>>,
}

impl Running {
    /// Metering handle for the SPU
    pub fn meter(&self) -> &SpuMeter {
        &self.meter
    }

    /// Whether the CPU thread is still running
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the CPU thread and take the system back
    ///
    /// Returns the error that stopped the thread, if one did.
    pub fn shutdown(mut self) -> Result<System> {
        self.join()
    }

    fn join(&mut self) -> Result<System> {
        self.stop.store(true, Ordering::Release);
        let handle = self
            .handle
            .take()
            .ok_or_else(|| EmulatorError::ThreadPanic("cpu thread already joined".to_string()))?;

        let result = handle
            .join()
            .map_err(|_| EmulatorError::ThreadPanic("cpu".to_string()))?;
        log::info!("CPU thread stopped");
        result
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.join() {
                log::warn!("CPU thread ended with an error: {}", e);
            }
        }
    }
}
