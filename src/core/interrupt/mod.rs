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

//! PSX Interrupt Controller
//!
//! ## Registers
//!
//! - **I_STAT** (0x1F801070): Interrupt status register (R/W)
//!   - Reading returns current interrupt flags
//!   - Writing a 1 to a bit that is also enabled in I_MASK clears it
//!
//! - **I_MASK** (0x1F801074): Interrupt mask register (R/W)
//!   - Controls which interrupts can reach the CPU
//!
//! ## Interrupt Sources (Bit Positions)
//!
//! ```text
//! Bit  | Source        | Raised by
//! -----|---------------|----------------------------------
//! 0    | VBLANK        | Root counter 3 (VSync pacer)
//! 3    | DMA           | DMA channel 4 completion
//! 4    | TIMER0        | Root counter 0
//! 5    | TIMER1        | Root counter 1
//! 6    | TIMER2        | Root counter 2
//! 9    | SPU           | SPU IRQ address match
//! ```

use bitflags::bitflags;

bitflags! {
    /// Interrupt lines as they appear in I_STAT and I_MASK
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Irq: u16 {
        const VBLANK = 1 << 0;
        const GPU = 1 << 1;
        const CDROM = 1 << 2;
        const DMA = 1 << 3;
        const TIMER0 = 1 << 4;
        const TIMER1 = 1 << 5;
        const TIMER2 = 1 << 6;
        const CONTROLLER = 1 << 7;
        const SIO = 1 << 8;
        const SPU = 1 << 9;
        const LIGHTPEN = 1 << 10;
    }
}

/// PlayStation Interrupt Controller
///
/// # Example
///
/// ```
/// use psfrx::core::interrupt::{InterruptController, Irq};
///
/// let mut ic = InterruptController::new();
///
/// ic.request(Irq::VBLANK);
/// ic.write_mask(Irq::VBLANK.bits() as u32);
/// assert!(ic.is_pending());
///
/// // Writing 1 to an enabled bit acknowledges it
/// ic.write_status(Irq::VBLANK.bits() as u32);
/// assert!(!ic.is_pending());
/// ```
#[derive(Debug, Default)]
pub struct InterruptController {
    /// I_STAT (0x1F801070)
    status: u16,

    /// I_MASK (0x1F801074)
    mask: u16,
}

impl InterruptController {
    /// Create a new interrupt controller with all lines clear and masked
    pub fn new() -> Self {
        Self { status: 0, mask: 0 }
    }

    /// Clear status and mask
    pub fn reset(&mut self) {
        self.status = 0;
        self.mask = 0;
    }

    /// Raise interrupt line(s)
    pub fn request(&mut self, irq: Irq) {
        self.status |= irq.bits();
        log::trace!("IRQ requested: {:?}, status=0x{:04X}", irq, self.status);
    }

    /// Clear interrupt line(s) unconditionally
    ///
    /// Used by the HLE exception handler, which acknowledges on behalf of
    /// the guest.
    pub fn acknowledge(&mut self, irq: Irq) {
        self.status &= !irq.bits();
        log::trace!("IRQ acknowledged, status=0x{:04X}", self.status);
    }

    /// Check if any unmasked interrupt is active
    pub fn is_pending(&self) -> bool {
        (self.status & self.mask) != 0
    }

    /// Lines that are both raised and enabled
    pub fn pending(&self) -> Irq {
        Irq::from_bits_truncate(self.status & self.mask)
    }

    /// Read I_STAT register
    pub fn read_status(&self) -> u32 {
        self.status as u32
    }

    /// Write I_STAT register
    ///
    /// Clears every bit that is set in both `value` and I_MASK:
    /// `status &= !(mask & value)`.
    pub fn write_status(&mut self, value: u32) {
        self.status &= !(self.mask & value as u16);
        log::trace!(
            "I_STAT write 0x{:04X}, status=0x{:04X}",
            value as u16,
            self.status
        );
    }

    /// Read I_MASK register
    pub fn read_mask(&self) -> u32 {
        self.mask as u32
    }

    /// Write I_MASK register
    pub fn write_mask(&mut self, value: u32) {
        self.mask = value as u16;
        log::debug!("IRQ mask set: 0x{:04X}", self.mask);
    }
}
