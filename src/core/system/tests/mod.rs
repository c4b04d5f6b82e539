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

//! System tests
//!
//! - `basic`: construction, init, reset, image loading
//! - `execution`: stepping, cycle budgets, the CPU thread

use super::*;
use crate::core::audio::{MemorySink, NullSink};


/// Entry point used by the test programs
const ENTRY: u32 = 0x8001_0000;

/// `beq $zero, $zero, -1`: branch to itself
const IDLE: u32 = 0x1000_FFFF;

fn config(dead_loop_skip: bool) -> PlayerConfig {
    PlayerConfig {
        dead_loop_skip,
        ring_frames: 64,
        ..PlayerConfig::default()
    }
}

fn quiet_system() -> System {
    System::new(config(true), Box::new(NullSink)).unwrap()
}

fn recording_system(dead_loop_skip: bool) -> (System, MemorySink) {
    let sink = MemorySink::new();
    let system = System::new(config(dead_loop_skip), Box::new(sink.clone())).unwrap();
    (system, sink)
}

/// Place `program` at [`ENTRY`] and point the CPU at it
fn load_program(system: &mut System, program: &[u32]) {
    for (i, &word) in program.iter().enumerate() {
        system
            .bus_mut()
            .write::<u32>(ENTRY + 4 * i as u32, word)
            .unwrap();
    }
    system.seed(ENTRY, 0, 0x801F_FFF0);
}

fn addiu(rt: Register, rs: Register, imm: i16) -> u32 {
    (0x09 << 26) | ((rs as u32) << 21) | ((rt as u32) << 16) | imm as u16 as u32
}

fn lui(rt: Register, imm: u16) -> u32 {
    (0x0F << 26) | ((rt as u32) << 16) | imm as u32
}

fn sw(rt: Register, base: Register, offset: i16) -> u32 {
    (0x2B << 26) | ((base as u32) << 21) | ((rt as u32) << 16) | offset as u16 as u32
}
