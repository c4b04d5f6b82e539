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

//! PSX Root Counters
//!
//! Four counters drive every time-dependent part of the player:
//!
//! - **Counter 0**: System clock or pixel clock
//! - **Counter 1**: System clock or horizontal blank
//! - **Counter 2**: System clock or system clock / 8
//! - **Counter 3**: Internal VSync pacer (60Hz or 50Hz), also paces audio
//!
//! Counters are not ticked one cycle at a time. Each keeps the cycle at
//! which it was last armed (`start_cycle`) and the number of cycles until
//! it next fires (`cycle`); the interpreter compares the global clock
//! against the nearest deadline on every branch.
//!
//! ## Register Layout
//!
//! Each hardware counter has 3 registers at 16-byte intervals:
//! - `0x1F801100 + (n * 0x10)`: Counter value (R/W)
//! - `0x1F801104 + (n * 0x10)`: Mode register (R/W)
//! - `0x1F801108 + (n * 0x10)`: Target value (R/W)
//!
//! ## Mode Register Format
//!
//! ```text
//! 9:     Clock source bit 1 (counter 2: system clock / 8)
//! 8:     Clock source bit 0 (counter 0: pixel clock, counter 1: hblank)
//! 7:     IRQ pulse/toggle
//! 6:     IRQ repeat mode (0=one-shot, 1=repeat)
//! 5:     IRQ on max value (0xFFFF)
//! 4:     IRQ on target
//! 3:     Reset counter to 0 when target reached
//! 0:     Sync enable (counter 2: stop counter)
//! ```
//!
//! ## Cycle accounting
//!
//! The interpreter charges one cycle per instruction while the hardware
//! needs roughly two, so every span is divided by [`BIAS`].

use bitflags::bitflags;

use crate::core::error::Result;
use crate::core::interrupt::{InterruptController, Irq};

#[cfg(test)]
mod tests;

/// CPU clock in Hz
pub const PSXCLK: u32 = 33_868_800;

/// Hardware cycles per interpreter cycle
pub const BIAS: u32 = 2;

/// Output sample rate in Hz
pub const SAMPLE_RATE: u32 = 44_100;

/// Interpreter cycles per output sample
pub const SAMPLE_PERIOD: u32 = PSXCLK / SAMPLE_RATE / BIAS;

/// Index of the VSync pacer
pub const VSYNC_COUNTER: usize = 3;

/// Marks a counter that never fires
const INACTIVE: u32 = u32::MAX;

/// Scanlines per frame used to derive the hblank rate
const SCANLINES: u32 = 262;

/// Approximate pixel clock divider relative to the hblank rate
const PIXELS_PER_LINE: u32 = 386;

bitflags! {
    /// Counter mode register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CounterMode: u32 {
        const SYNC_ENABLE = 1 << 0;
        const RESET_ON_TARGET = 1 << 3;
        const IRQ_ON_TARGET = 1 << 4;
        const IRQ_ON_MAX = 1 << 5;
        const IRQ_REPEAT = 1 << 6;
        const IRQ_TOGGLE = 1 << 7;
        const CLOCK_SOURCE_0 = 1 << 8;
        const CLOCK_SOURCE_1 = 1 << 9;
    }
}

/// Receives the number of whole sample periods to synthesize
///
/// Implemented by the SPU bridge; the root counter never talks to the SPU
/// any other way.
pub trait SamplePacer {
    /// Synthesize `periods` output samples
    fn synthesize(&mut self, periods: u32) -> Result<()>;
}

/// A single root counter
#[derive(Debug, Clone, Default)]
pub struct Counter {
    /// Counter value at `start_cycle`
    pub count: u32,
    /// Raw mode register
    pub mode: u32,
    /// Target value
    pub target: u32,
    /// Hardware cycles per count
    pub rate: u32,
    /// IRQ line raised when the counter fires
    pub irq: Irq,
    /// Global cycle at which the counter was last armed
    pub start_cycle: u32,
    /// Cycles from `start_cycle` until the counter fires
    pub cycle: u32,
}

impl Counter {
    fn mode_flags(&self) -> CounterMode {
        CounterMode::from_bits_truncate(self.mode)
    }
}

/// The four root counters plus the global cycle clock
pub struct RootCounter {
    counters: [Counter; 4],

    /// Global cycle clock, advanced once per executed instruction
    cycle: u32,

    /// Cycles from `next_counter_base` until the nearest deadline
    next_counter: u32,

    /// Clock value when `next_counter` was computed
    next_counter_base: u32,

    /// Clock value up to which audio has been synthesized
    spu_cycle: u32,

    /// VSync frequency in Hz
    vsync_hz: u32,
}

impl RootCounter {
    /// Create the counters for the given VSync frequency (60 or 50)
    pub fn new(vsync_hz: u32) -> Self {
        let mut rc = Self {
            counters: Default::default(),
            cycle: 0,
            next_counter: 0,
            next_counter_base: 0,
            spu_cycle: 0,
            vsync_hz: vsync_hz.max(1),
        };
        rc.reset();
        rc
    }

    /// Return every counter to its power-on state and rewind the clock
    pub fn reset(&mut self) {
        self.cycle = 0;
        self.spu_cycle = 0;
        self.counters = Default::default();

        for (n, irq) in [Irq::TIMER0, Irq::TIMER1, Irq::TIMER2].into_iter().enumerate() {
            self.counters[n].rate = 1;
            self.counters[n].irq = irq;
        }

        let vsync = &mut self.counters[VSYNC_COUNTER];
        vsync.rate = PSXCLK / self.vsync_hz;
        vsync.irq = Irq::VBLANK;
        vsync.mode = (CounterMode::RESET_ON_TARGET
            | CounterMode::IRQ_ON_TARGET
            | CounterMode::IRQ_REPEAT)
            .bits();
        vsync.target = 1;

        for n in 0..4 {
            self.rearm(n);
        }
        self.set();
    }

    /// Current value of the global cycle clock
    #[inline(always)]
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Advance the global cycle clock
    #[inline(always)]
    pub fn advance(&mut self, cycles: u32) {
        self.cycle = self.cycle.wrapping_add(cycles);
    }

    /// Inspect a counter
    pub fn counter(&self, n: usize) -> &Counter {
        &self.counters[n]
    }

    /// Write the count register
    pub fn write_count(&mut self, n: usize, value: u32) {
        self.counters[n].count = value & 0xFFFF;
        self.rearm(n);
        self.set();
        log::trace!("Counter {} count <- 0x{:04X}", n, value & 0xFFFF);
    }

    /// Write the mode register
    ///
    /// Selects the clock rate and resets the count.
    pub fn write_mode(&mut self, n: usize, value: u32) {
        let vsync_rate = self.counters[VSYNC_COUNTER].rate;
        let counter = &mut self.counters[n];
        counter.mode = value;
        counter.count = 0;

        let flags = counter.mode_flags();
        counter.rate = match n {
            0 if flags.contains(CounterMode::CLOCK_SOURCE_0) => {
                (vsync_rate / PIXELS_PER_LINE / SCANLINES).max(1)
            }
            1 if flags.contains(CounterMode::CLOCK_SOURCE_0) => (vsync_rate / SCANLINES).max(1),
            2 if flags.contains(CounterMode::CLOCK_SOURCE_1) => 8,
            _ => 1,
        };

        self.rearm(n);
        self.set();
        log::debug!(
            "Counter {} mode <- 0x{:04X} (rate {}, fires in {} cycles)",
            n,
            value,
            self.counters[n].rate,
            self.counters[n].cycle
        );
    }

    /// Write the target register
    pub fn write_target(&mut self, n: usize, value: u32) {
        self.counters[n].target = value & 0xFFFF;
        self.rearm(n);
        self.set();
        log::trace!("Counter {} target <- 0x{:04X}", n, value & 0xFFFF);
    }

    /// Read the current count
    pub fn read_count(&self, n: usize) -> u32 {
        let counter = &self.counters[n];
        let elapsed = self.cycle.wrapping_sub(counter.start_cycle);
        let ticks = BIAS as u64 * elapsed as u64 / counter.rate.max(1) as u64;
        counter.count.wrapping_add(ticks as u32) & 0xFFFF
    }

    /// Read the mode register
    pub fn read_mode(&self, n: usize) -> u32 {
        self.counters[n].mode
    }

    /// Read the target register
    pub fn read_target(&self, n: usize) -> u32 {
        self.counters[n].target
    }

    /// Cycles from the last arm until counter `n` fires
    pub fn cycles_until_fire(&self, n: usize) -> u32 {
        self.counters[n].cycle
    }

    /// Record the nearest counter deadline
    pub fn set(&mut self) {
        self.next_counter = 0x7FFF_FFFF;
        self.next_counter_base = self.cycle;

        for counter in &self.counters {
            if counter.cycle == INACTIVE {
                continue;
            }

            let elapsed = self.cycle.wrapping_sub(counter.start_cycle) as i64;
            let remaining = counter.cycle as i64 - elapsed;
            if remaining < 0 {
                self.next_counter = 0;
                break;
            }
            if remaining < self.next_counter as i64 {
                self.next_counter = remaining as u32;
            }
        }
    }

    /// Check whether the nearest counter deadline has passed
    #[inline(always)]
    pub fn deadline_reached(&self) -> bool {
        self.cycle.wrapping_sub(self.next_counter_base) >= self.next_counter
    }

    /// Fire every counter whose deadline has passed
    ///
    /// The VSync pacer additionally flushes pending audio through `pacer`.
    pub fn update(
        &mut self,
        irq: &mut InterruptController,
        pacer: &mut dyn SamplePacer,
    ) -> Result<()> {
        if self.elapsed(VSYNC_COUNTER) >= self.counters[VSYNC_COUNTER].cycle {
            self.rearm(VSYNC_COUNTER);
            irq.request(Irq::VBLANK);
            self.spu_run(pacer)?;
        }

        for n in 0..VSYNC_COUNTER {
            if self.elapsed(n) >= self.counters[n].cycle {
                self.fire(n, irq);
            }
        }

        self.set();
        Ok(())
    }

    /// Synthesize audio for every whole sample period elapsed since the
    /// last call
    pub fn spu_run(&mut self, pacer: &mut dyn SamplePacer) -> Result<()> {
        let periods = self.cycle.wrapping_sub(self.spu_cycle) / SAMPLE_PERIOD;
        if periods > 0 {
            self.spu_cycle = self
                .spu_cycle
                .wrapping_add(periods.wrapping_mul(SAMPLE_PERIOD));
            pacer.synthesize(periods)?;
        }
        Ok(())
    }

    /// Fast-forward the clock to the nearest counter deadline
    ///
    /// Called while the guest spins in an idle loop. The clock lands exactly
    /// on the deadline and never beyond it.
    pub fn dead_loop_skip(&mut self) {
        if !self.deadline_reached() {
            let deadline = self.next_counter_base.wrapping_add(self.next_counter);
            log::trace!(
                "Idle loop: skipping {} cycles",
                deadline.wrapping_sub(self.cycle)
            );
            self.cycle = deadline;
        }
    }

    fn elapsed(&self, n: usize) -> u32 {
        self.cycle.wrapping_sub(self.counters[n].start_cycle)
    }

    /// Recompute `cycle` for counter `n` from the current clock
    fn rearm(&mut self, n: usize) {
        let now = self.cycle;
        let counter = &mut self.counters[n];
        counter.start_cycle = now;

        let flags = counter.mode_flags();
        let stopped = n == 2 && flags.contains(CounterMode::SYNC_ENABLE);
        let armed = flags.intersects(CounterMode::IRQ_ON_TARGET | CounterMode::IRQ_ON_MAX);

        counter.cycle = if !stopped && armed {
            let span = if flags.contains(CounterMode::IRQ_ON_TARGET) {
                counter.target.wrapping_sub(counter.count) & 0xFFFF
            } else {
                0xFFFF - (counter.count & 0xFFFF)
            };
            let cycles = span as u64 * counter.rate as u64 / BIAS as u64;
            cycles.min((INACTIVE - 1) as u64) as u32
        } else {
            INACTIVE
        };
    }

    /// Reset counter `n`, raise its IRQ and disarm it unless repeating
    fn fire(&mut self, n: usize, irq: &mut InterruptController) {
        self.counters[n].count = 0;
        self.rearm(n);
        irq.request(self.counters[n].irq);

        if !self.counters[n]
            .mode_flags()
            .contains(CounterMode::IRQ_REPEAT)
        {
            self.counters[n].cycle = INACTIVE;
        }
        log::trace!("Counter {} fired at cycle {}", n, self.cycle);
    }
}

impl Default for RootCounter {
    fn default() -> Self {
        Self::new(60)
    }
}
