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

//! First-fit allocator behind malloc/free
//!
//! The block list is kept on the host; guest memory only holds the
//! allocations themselves.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    addr: u32,
    size: u32,
    free: bool,
}

#[derive(Debug, Clone, Default)]
pub(super) struct Heap {
    blocks: Vec<Block>,
}

impl Heap {
    /// Replace the heap with one free block
    pub(super) fn init(&mut self, start: u32, size: u32) {
        let size = size & !3;
        self.blocks.clear();
        if size > 0 {
            self.blocks.push(Block {
                addr: start,
                size,
                free: true,
            });
        }
        log::debug!("Heap at 0x{:08X}, {} bytes", start, size);
    }

    /// Allocate `size` bytes, word aligned
    pub(super) fn allocate(&mut self, size: u32) -> Option<u32> {
        let size = size.max(1).checked_add(3)? & !3;
        let index = self
            .blocks
            .iter()
            .position(|b| b.free && b.size >= size)?;

        let block = &mut self.blocks[index];
        let addr = block.addr;
        block.free = false;

        if block.size > size {
            let rest = Block {
                addr: addr.wrapping_add(size),
                size: block.size - size,
                free: true,
            };
            block.size = size;
            self.blocks.insert(index + 1, rest);
        }

        Some(addr)
    }

    /// Free an allocation, merging it with free neighbours
    ///
    /// # Returns
    ///
    /// `false` if `addr` is not a live allocation
    pub(super) fn release(&mut self, addr: u32) -> bool {
        let Some(mut index) = self
            .blocks
            .iter()
            .position(|b| b.addr == addr && !b.free)
        else {
            return false;
        };

        self.blocks[index].free = true;

        if index + 1 < self.blocks.len() && self.blocks[index + 1].free {
            let next = self.blocks.remove(index + 1);
            self.blocks[index].size += next.size;
        }
        if index > 0 && self.blocks[index - 1].free {
            let current = self.blocks.remove(index);
            index -= 1;
            self.blocks[index].size += current.size;
        }

        true
    }

    /// Bytes still available in free blocks
    #[cfg(test)]
    pub(super) fn free_bytes(&self) -> u32 {
        self.blocks.iter().filter(|b| b.free).map(|b| b.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_splits_block() {
        let mut heap = Heap::default();
        heap.init(0x8010_0000, 0x100);

        assert_eq!(heap.allocate(5), Some(0x8010_0000));
        assert_eq!(heap.allocate(4), Some(0x8010_0008));
        assert_eq!(heap.free_bytes(), 0x100 - 12);
    }

    #[test]
    fn test_exhausted_heap() {
        let mut heap = Heap::default();
        heap.init(0x8010_0000, 0x10);
        assert_eq!(heap.allocate(0x10), Some(0x8010_0000));
        assert_eq!(heap.allocate(4), None);
    }

    #[test]
    fn test_release_coalesces() {
        let mut heap = Heap::default();
        heap.init(0x8010_0000, 0x30);
        let a = heap.allocate(0x10).unwrap();
        let b = heap.allocate(0x10).unwrap();
        let c = heap.allocate(0x10).unwrap();

        assert!(heap.release(a));
        assert!(heap.release(c));
        assert!(heap.release(b));
        assert_eq!(heap.free_bytes(), 0x30);
        assert_eq!(heap.allocate(0x30), Some(0x8010_0000));
    }

    #[test]
    fn test_double_free_rejected() {
        let mut heap = Heap::default();
        heap.init(0x8010_0000, 0x20);
        let a = heap.allocate(8).unwrap();
        assert!(heap.release(a));
        assert!(!heap.release(a));
        assert!(!heap.release(0x1234));
    }
}
