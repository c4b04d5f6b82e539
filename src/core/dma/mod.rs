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

//! DMA (Direct Memory Access) Controller
//!
//! Only channel 4 (SPU) carries data in a sound player; the other channels
//! are never started by sound drivers, so their registers are plain memory.
//!
//! # Registers
//!
//! | Address    | Register | Description                   |
//! |------------|----------|-------------------------------|
//! | 0x1F8010C0 | MADR     | SPU channel memory address    |
//! | 0x1F8010C4 | BCR      | SPU channel block control     |
//! | 0x1F8010C8 | CHCR     | SPU channel control           |
//! | 0x1F8010F0 | DPCR     | Channel priority and enable   |
//! | 0x1F8010F4 | DICR     | Interrupt enable and flags    |
//!
//! # Transfer Modes
//!
//! - **Mode 0** (Immediate): `BCR & 0xFFFF` words (0 means 0x10000)
//! - **Mode 1** (Block): block size times block count words
//!
//! The transfer itself is carried out by the bus, which owns both RAM and
//! the SPU; this module only keeps the register state.
//!
//! # References
//!
//! - [PSX-SPX: DMA Controller](http://problemkaputt.de/psx-spx.htm#dmacontroller)

#[cfg(test)]
mod tests;

/// Direction of a channel transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Device to RAM
    ToRam,
    /// RAM to device
    FromRam,
}

/// Single DMA channel register set
#[derive(Debug, Clone, Default)]
pub struct DmaChannel {
    /// Memory Address Register (MADR)
    base_address: u32,

    /// Block Control Register (BCR)
    ///
    /// - Bits 0-15: Block size (words)
    /// - Bits 16-31: Block count
    block_control: u32,

    /// Channel Control Register (CHCR)
    ///
    /// - Bit 0: Direction (0=to RAM, 1=from RAM)
    /// - Bits 9-10: Sync mode (0=immediate, 1=block)
    /// - Bit 24: Start/busy flag
    /// - Bit 28: Manual trigger
    channel_control: u32,
}

impl DmaChannel {
    const START_BUSY: u32 = 0x0100_0000;
    const TRIGGER: u32 = 0x1000_0000;

    /// Check if channel is active (bit 24 of CHCR)
    #[inline(always)]
    pub fn is_active(&self) -> bool {
        (self.channel_control & Self::START_BUSY) != 0
    }

    /// Transfer direction (bit 0 of CHCR)
    #[inline(always)]
    pub fn direction(&self) -> TransferDirection {
        if self.channel_control & 1 != 0 {
            TransferDirection::FromRam
        } else {
            TransferDirection::ToRam
        }
    }

    /// Synchronization mode (bits 9-10 of CHCR)
    #[inline(always)]
    pub fn sync_mode(&self) -> u32 {
        (self.channel_control >> 9) & 3
    }

    /// Word-aligned RAM address of the transfer
    pub fn address(&self) -> u32 {
        self.base_address & 0x001F_FFFC
    }

    /// Number of 32-bit words the programmed transfer moves
    pub fn word_count(&self) -> usize {
        let block_size = (self.block_control & 0xFFFF) as usize;
        let block_count = (self.block_control >> 16) as usize;

        match self.sync_mode() {
            0 if block_size == 0 => 0x10000,
            0 => block_size,
            _ => block_size * block_count,
        }
    }

    /// Clear start and trigger bits
    fn deactivate(&mut self) {
        log::trace!("DMA4 deactivated");
        self.channel_control &= !(Self::START_BUSY | Self::TRIGGER);
    }
}

/// DMA register file with the SPU channel
///
/// # Examples
///
/// ```
/// use psfrx::core::dma::DmaController;
///
/// let dma = DmaController::new();
/// assert_eq!(dma.read_control(), 0x07654321);
/// ```
#[derive(Debug, Clone)]
pub struct DmaController {
    spu: DmaChannel,

    /// DMA Control Register (DPCR) at 0x1F8010F0
    control: u32,

    /// DMA Interrupt Register (DICR) at 0x1F8010F4
    interrupt: u32,
}

impl DmaController {
    /// SPU channel number
    pub const CH_SPU: u32 = 4;

    /// DICR bit 23: master interrupt enable
    const MASTER_ENABLE: u32 = 1 << 23;

    /// DICR bit 31: master interrupt flag
    const MASTER_FLAG: u32 = 1 << 31;

    /// Create a controller with the default channel priority
    pub fn new() -> Self {
        Self {
            spu: DmaChannel::default(),
            control: 0x0765_4321,
            interrupt: 0,
        }
    }

    /// Return to power-on state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The SPU channel register set
    pub fn spu(&self) -> &DmaChannel {
        &self.spu
    }

    /// Read MADR
    pub fn read_madr(&self) -> u32 {
        self.spu.base_address
    }

    /// Write MADR
    pub fn write_madr(&mut self, value: u32) {
        self.spu.base_address = value & 0x00FF_FFFF;
        log::trace!("DMA4 MADR <- 0x{:08X}", value);
    }

    /// Read BCR
    pub fn read_bcr(&self) -> u32 {
        self.spu.block_control
    }

    /// Write BCR
    pub fn write_bcr(&mut self, value: u32) {
        self.spu.block_control = value;
        log::trace!("DMA4 BCR <- 0x{:08X}", value);
    }

    /// Read CHCR
    pub fn read_chcr(&self) -> u32 {
        self.spu.channel_control
    }

    /// Write CHCR
    ///
    /// # Returns
    ///
    /// `true` when the write starts a transfer that the caller must run
    /// and then finish with [`DmaController::complete`]
    pub fn write_chcr(&mut self, value: u32) -> bool {
        self.spu.channel_control = value;
        log::trace!("DMA4 CHCR <- 0x{:08X}", value);

        if self.spu.is_active() && self.control & Self::channel_enable_bit() == 0 {
            log::debug!("DMA4 started while disabled in DPCR");
        }
        self.spu.is_active()
    }

    /// Read DPCR
    pub fn read_control(&self) -> u32 {
        self.control
    }

    /// Write DPCR
    pub fn write_control(&mut self, value: u32) {
        self.control = value;
        log::trace!("DPCR <- 0x{:08X}", value);
    }

    /// Read DICR with the master flag recomputed
    pub fn read_interrupt(&self) -> u32 {
        let mut value = self.interrupt & 0x7FFF_FFFF;
        if self.irq_active() {
            value |= Self::MASTER_FLAG;
        }
        value
    }

    /// Write DICR
    ///
    /// Bits 0-23 are plain read/write; flag bits 24-30 are cleared by
    /// writing 1.
    pub fn write_interrupt(&mut self, value: u32) {
        let flags = self.interrupt & 0x7F00_0000;
        let cleared = flags & !(value & 0x7F00_0000);
        self.interrupt = (value & 0x00FF_FFFF) | cleared;
        log::trace!("DICR <- 0x{:08X}", value);
    }

    /// Finish the running SPU transfer
    ///
    /// Clears the start bit, advances MADR past a block-mode transfer and
    /// latches the channel completion flag when enabled in DICR.
    ///
    /// # Returns
    ///
    /// `true` if the completion should raise the DMA interrupt line
    pub fn complete(&mut self, words: usize) -> bool {
        if self.spu.sync_mode() == 1 {
            self.spu.base_address = (self.spu.base_address)
                .wrapping_add((words * 4) as u32)
                & 0x00FF_FFFF;
        }
        self.spu.deactivate();

        let enable = 1 << (16 + Self::CH_SPU);
        if self.interrupt & enable == 0 {
            return false;
        }
        self.interrupt |= 1 << (24 + Self::CH_SPU);
        log::debug!("DMA4 complete ({} words), flag latched", words);
        self.interrupt & Self::MASTER_ENABLE != 0
    }

    fn irq_active(&self) -> bool {
        let force = self.interrupt & (1 << 15) != 0;
        let enabled = (self.interrupt >> 16) & 0x7F;
        let flags = (self.interrupt >> 24) & 0x7F;
        force || (self.interrupt & Self::MASTER_ENABLE != 0 && enabled & flags != 0)
    }

    const fn channel_enable_bit() -> u32 {
        8 << (Self::CH_SPU * 4)
    }
}

impl Default for DmaController {
    fn default() -> Self {
        Self::new()
    }
}
