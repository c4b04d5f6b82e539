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

//! Segmented address space for the PlayStation 1
//!
//! All plain memory accesses made by the interpreter land here. Every
//! access is resolved through a 64KB-granularity segment table into one of
//! the owned region buffers.
//!
//! # Memory Map
//!
//! | Physical Address Range | Region         | Size   |
//! |------------------------|----------------|--------|
//! | 0x00000000-0x001FFFFF  | RAM            | 2MB    |
//! | 0x1F000000-0x1F00FFFF  | Parallel port  | 64KB   |
//! | 0x1F800000-0x1F8003FF  | Scratchpad     | 1KB    |
//! | 0x1F801000-0x1F802FFF  | I/O Ports      | 8KB    |
//! | 0x1FC00000-0x1FC7FFFF  | BIOS ROM       | 512KB  |
//!
//! # Example
//!
//! ```
//! use psfrx::core::memory::AddressSpace;
//!
//! let mut mem = AddressSpace::new();
//! mem.init();
//!
//! // Write to RAM via KSEG0
//! mem.write::<u32>(0x80000000, 0x12345678);
//!
//! // Read from same location via different segment (should mirror)
//! assert_eq!(mem.read::<u32>(0x00000000), 0x12345678);
//! assert_eq!(mem.read::<u32>(0xA0000000), 0x12345678);
//! ```

use crate::core::error::{EmulatorError, Result};

mod region;
#[cfg(test)]
mod tests;

pub use region::MemoryRegion;
use region::{build_segment_table, Segment};

/// Value types that can be moved through the address space
///
/// This trait is the single place where guest byte order is converted to
/// host byte order. The guest is little-endian, so the conversions are the
/// identity on little-endian hosts and a byte swap elsewhere.
pub trait MemoryValue: Copy + Default + std::fmt::Debug {
    /// Access width in bytes
    const SIZE: usize;

    /// Decode from guest (little-endian) bytes
    fn from_guest(bytes: &[u8]) -> Self;

    /// Encode into guest (little-endian) bytes
    fn to_guest(self, bytes: &mut [u8]);

    /// Zero-extend to a 32-bit bus value
    fn to_u32(self) -> u32;

    /// Truncate a 32-bit bus value
    fn from_u32(value: u32) -> Self;
}

macro_rules! impl_memory_value {
    ($ty:ty, $size:expr) => {
        impl MemoryValue for $ty {
            const SIZE: usize = $size;

            #[inline(always)]
            fn from_guest(bytes: &[u8]) -> Self {
                let mut raw = [0u8; $size];
                raw.copy_from_slice(&bytes[..$size]);
                <$ty>::from_le_bytes(raw)
            }

            #[inline(always)]
            fn to_guest(self, bytes: &mut [u8]) {
                bytes[..$size].copy_from_slice(&self.to_le_bytes());
            }

            #[inline(always)]
            fn to_u32(self) -> u32 {
                self as u32
            }

            #[inline(always)]
            fn from_u32(value: u32) -> Self {
                value as $ty
            }
        }
    };
}

impl_memory_value!(u8, 1);
impl_memory_value!(u16, 2);
impl_memory_value!(u32, 4);

/// Owned memory regions plus the segment table that reaches them
pub struct AddressSpace {
    /// Main RAM (2MB)
    ///
    /// Physical address: 0x00000000-0x001FFFFF
    ram: Vec<u8>,

    /// Parallel port window (64KB)
    ///
    /// Physical address: 0x1F000000-0x1F00FFFF
    parallel: Vec<u8>,

    /// Scratchpad and raw hardware register backing store
    ///
    /// Physical address: 0x1F800000-0x1F802FFF
    hardware: Vec<u8>,

    /// BIOS ROM (512KB)
    ///
    /// Physical address: 0x1FC00000-0x1FC7FFFF
    bios: Vec<u8>,

    /// Segment table, built once by `init`
    segments: Option<Box<[Segment]>>,
}

impl AddressSpace {
    /// RAM size (2MB)
    pub const RAM_SIZE: usize = 2 * 1024 * 1024;

    /// BIOS size (512KB)
    pub const BIOS_SIZE: usize = 512 * 1024;

    /// Parallel port window size (64KB)
    const PARALLEL_SIZE: usize = 64 * 1024;

    /// Scratchpad + I/O window size
    const HARDWARE_SIZE: usize = 0x3000;

    /// Create a new address space with zeroed regions
    ///
    /// The segment table is not built yet; call [`AddressSpace::init`]
    /// before the first access.
    pub fn new() -> Self {
        Self {
            ram: vec![0u8; Self::RAM_SIZE],
            parallel: vec![0u8; Self::PARALLEL_SIZE],
            hardware: vec![0u8; Self::HARDWARE_SIZE],
            bios: vec![0u8; Self::BIOS_SIZE],
            segments: None,
        }
    }

    /// Build the segment table
    ///
    /// Calling this more than once is a no-op.
    pub fn init(&mut self) {
        if self.segments.is_none() {
            self.segments = Some(build_segment_table());
            log::debug!("Address space segment table built");
        }
    }

    /// Check whether the segment table has been built
    pub fn is_initialized(&self) -> bool {
        self.segments.is_some()
    }

    /// Reset volatile memory
    ///
    /// Clears RAM, scratchpad, hardware backing store and the parallel
    /// port window. BIOS contents are preserved as they represent ROM.
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.parallel.fill(0);
        self.hardware.fill(0);
    }

    /// Copy a block of data into the address space
    ///
    /// The copy is split at every 64KB segment boundary, so a block may
    /// span several segments (and even several regions). Parts that land
    /// in unmapped segments are dropped with a warning.
    ///
    /// # Arguments
    ///
    /// * `addr` - Virtual start address
    /// * `data` - Bytes to copy
    pub fn load(&mut self, addr: u32, data: &[u8]) {
        let mut addr = addr;
        let mut remaining = data;

        while !remaining.is_empty() {
            let in_segment = 0x10000 - (addr & 0xFFFF) as usize;
            let chunk_len = in_segment.min(remaining.len());
            let (chunk, rest) = remaining.split_at(chunk_len);

            match self.locate(addr, chunk_len) {
                Some((region, offset)) => {
                    self.buffer_mut(region)[offset..offset + chunk_len].copy_from_slice(chunk);
                }
                None => {
                    log::warn!(
                        "Load of {} bytes to unmapped address 0x{:08X} dropped",
                        chunk_len,
                        addr
                    );
                }
            }

            addr = addr.wrapping_add(chunk_len as u32);
            remaining = rest;
        }
    }

    /// Install a BIOS ROM image
    ///
    /// # Returns
    ///
    /// - `Ok(())` if the image fits the 512KB ROM window
    /// - `Err(EmulatorError)` otherwise
    pub fn load_bios(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > Self::BIOS_SIZE {
            return Err(EmulatorError::LoaderError(format!(
                "BIOS image is {} bytes (at most {} allowed)",
                data.len(),
                Self::BIOS_SIZE
            )));
        }
        self.bios.fill(0);
        self.bios[..data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Typed read
    ///
    /// Reads from unmapped segments return 0.
    ///
    /// # Panics
    ///
    /// Panics if [`AddressSpace::init`] has not been called.
    #[inline(always)]
    pub fn read<T: MemoryValue>(&self, addr: u32) -> T {
        match self.locate(addr, T::SIZE) {
            Some((region, offset)) => T::from_guest(&self.buffer(region)[offset..]),
            None => {
                log::trace!("Unmapped read{} at 0x{:08X}", T::SIZE * 8, addr);
                T::default()
            }
        }
    }

    /// Typed write
    ///
    /// Writes to unmapped segments and to the BIOS ROM are ignored.
    ///
    /// # Panics
    ///
    /// Panics if [`AddressSpace::init`] has not been called.
    #[inline(always)]
    pub fn write<T: MemoryValue>(&mut self, addr: u32, value: T) {
        match self.locate(addr, T::SIZE) {
            Some((MemoryRegion::BIOS, _)) => {
                log::trace!("Ignoring write{} to BIOS at 0x{:08X}", T::SIZE * 8, addr);
            }
            Some((region, offset)) => value.to_guest(&mut self.buffer_mut(region)[offset..]),
            None => {
                log::trace!(
                    "Unmapped write{} at 0x{:08X} = {:?}",
                    T::SIZE * 8,
                    addr,
                    value
                );
            }
        }
    }

    /// Borrow a contiguous RAM range
    ///
    /// Used by DMA transfers. Returns `None` unless the whole range lies in
    /// main RAM.
    pub fn slice(&self, addr: u32, len: usize) -> Option<&[u8]> {
        match self.locate(addr, 1)? {
            (MemoryRegion::RAM, offset) if offset + len <= self.ram.len() => {
                Some(&self.ram[offset..offset + len])
            }
            _ => None,
        }
    }

    /// Mutably borrow a contiguous RAM range
    pub fn slice_mut(&mut self, addr: u32, len: usize) -> Option<&mut [u8]> {
        match self.locate(addr, 1)? {
            (MemoryRegion::RAM, offset) if offset + len <= self.ram.len() => {
                Some(&mut self.ram[offset..offset + len])
            }
            _ => None,
        }
    }

    /// Look up the segment table entry for an address
    #[inline(always)]
    fn segment(&self, addr: u32) -> Segment {
        let Some(table) = self.segments.as_deref() else {
            panic!("address space accessed at 0x{addr:08X} before init()");
        };
        table[(addr >> 16) as usize]
    }

    /// Bounds-checked translation from virtual address to buffer offset
    #[inline(always)]
    fn locate(&self, addr: u32, size: usize) -> Option<(MemoryRegion, usize)> {
        let segment = self.segment(addr);
        if segment.region == MemoryRegion::Unmapped {
            return None;
        }

        let offset = (segment.offset + (addr & segment.mask)) as usize;
        if offset + size <= self.buffer(segment.region).len() {
            Some((segment.region, offset))
        } else {
            None
        }
    }

    fn buffer(&self, region: MemoryRegion) -> &[u8] {
        match region {
            MemoryRegion::RAM => &self.ram,
            MemoryRegion::Parallel => &self.parallel,
            MemoryRegion::Hardware => &self.hardware,
            MemoryRegion::BIOS => &self.bios,
            MemoryRegion::Unmapped => &[],
        }
    }

    fn buffer_mut(&mut self, region: MemoryRegion) -> &mut [u8] {
        match region {
            MemoryRegion::RAM => &mut self.ram,
            MemoryRegion::Parallel => &mut self.parallel,
            MemoryRegion::Hardware => &mut self.hardware,
            MemoryRegion::BIOS => &mut self.bios,
            MemoryRegion::Unmapped => &mut [],
        }
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}
