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

//! Memory region identification and segment table construction
//!
//! The PlayStation 1 uses MIPS memory segments with different caching
//! behaviors. The address space resolves every access through a table of
//! 65536 segments (one per 64KB of virtual address space), so KUSEG, KSEG0
//! and KSEG1 mirrors of the same physical region share one buffer.

use super::AddressSpace;

/// Memory region identification
///
/// Used as the owner tag of each segment table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    /// Main RAM (2MB, mirrored four times in each segment)
    RAM,
    /// Parallel port / expansion region 1 (64KB window)
    Parallel,
    /// Scratchpad (1KB) followed by the hardware register window
    Hardware,
    /// BIOS ROM (512KB)
    BIOS,
    /// Unmapped region
    Unmapped,
}

/// One entry of the segment table
///
/// `offset` is the byte offset of the segment inside the owning region's
/// buffer; the low 16 address bits are masked with `mask` and added to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Segment {
    pub(super) region: MemoryRegion,
    pub(super) offset: u32,
    pub(super) mask: u32,
}

impl Segment {
    const UNMAPPED: Segment = Segment {
        region: MemoryRegion::Unmapped,
        offset: 0,
        mask: 0,
    };

    const fn new(region: MemoryRegion, offset: u32) -> Self {
        Self {
            region,
            offset,
            mask: 0xFFFF,
        }
    }
}

/// Segment base addresses for KUSEG, KSEG0 and KSEG1
const SEGMENT_BASES: [usize; 3] = [0x0000, 0x8000, 0xA000];

/// Number of 64KB segments covered by RAM and its mirrors (8MB)
const RAM_MIRROR_SEGMENTS: usize = 0x80;

/// Number of 64KB segments covered by the BIOS ROM
const BIOS_SEGMENTS: usize = 0x08;

/// Build the full segment table
pub(super) fn build_segment_table() -> Box<[Segment]> {
    let mut table = vec![Segment::UNMAPPED; 0x10000].into_boxed_slice();

    for base in SEGMENT_BASES {
        for i in 0..RAM_MIRROR_SEGMENTS {
            // 2MB of RAM repeats every 0x20 segments
            table[base + i] = Segment::new(MemoryRegion::RAM, ((i & 0x1F) as u32) << 16);
        }

        table[base + 0x1F00] = Segment::new(MemoryRegion::Parallel, 0);
        table[base + 0x1F80] = Segment::new(MemoryRegion::Hardware, 0);

        for i in 0..BIOS_SEGMENTS {
            table[base + 0x1FC0 + i] = Segment::new(MemoryRegion::BIOS, (i as u32) << 16);
        }
    }

    table
}

impl AddressSpace {
    /// Identify memory region for an address
    ///
    /// # Arguments
    ///
    /// * `vaddr` - Virtual address
    ///
    /// # Returns
    ///
    /// The memory region that owns the segment containing this address
    ///
    /// # Example
    ///
    /// ```
    /// use psfrx::core::memory::{AddressSpace, MemoryRegion};
    ///
    /// let mut mem = AddressSpace::new();
    /// mem.init();
    ///
    /// assert_eq!(mem.identify_region(0x00000000), MemoryRegion::RAM);
    /// assert_eq!(mem.identify_region(0x80600000), MemoryRegion::RAM);
    /// assert_eq!(mem.identify_region(0x1F801000), MemoryRegion::Hardware);
    /// assert_eq!(mem.identify_region(0xBFC00000), MemoryRegion::BIOS);
    /// assert_eq!(mem.identify_region(0x1FFF0000), MemoryRegion::Unmapped);
    /// ```
    pub fn identify_region(&self, vaddr: u32) -> MemoryRegion {
        self.segment(vaddr).region
    }

    /// Resolve the hardware register window
    ///
    /// Returns the canonical physical address (0x1F80xxxx) when `vaddr`
    /// falls inside the I/O part of the hardware window (offset 0x1000 and
    /// above); scratchpad accesses stay in plain memory.
    #[inline(always)]
    pub fn io_port(&self, vaddr: u32) -> Option<u32> {
        let segment = self.segment(vaddr);
        let offset = vaddr & 0xFFFF;
        if segment.region == MemoryRegion::Hardware && offset >= 0x1000 {
            Some(0x1F80_0000 | offset)
        } else {
            None
        }
    }
}
