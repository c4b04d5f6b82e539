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

//! Test fixtures for common test scenarios

use psfrx::core::audio::{MemorySink, NullSink};
use psfrx::core::config::PlayerConfig;
use psfrx::core::system::System;

/// Entry point of the generated executables
pub const ENTRY: u32 = 0x8001_0000;

/// Region marker of European payloads
#[allow(dead_code)]
pub const EUROPE: &str = "Sony Computer Entertainment Inc. for Europe area";

/// Region marker of North American payloads
#[allow(dead_code)]
pub const NORTH_AMERICA: &str = "Sony Computer Entertainment Inc. for North America area";

/// Small rings so tests see output without long runs
#[allow(dead_code)]
pub fn test_config() -> PlayerConfig {
    PlayerConfig {
        ring_frames: 64,
        ..PlayerConfig::default()
    }
}

/// Build a PSX-EXE with `program` as its text
#[allow(dead_code)]
pub fn build_exe(program: &[u32], region: &str) -> Vec<u8> {
    let mut exe = vec![0u8; 0x800];
    exe[0..8].copy_from_slice(b"PS-X EXE");

    let text: Vec<u8> = program.iter().flat_map(|w| w.to_le_bytes()).collect();
    let mut put = |offset: usize, value: u32| {
        exe[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    };
    put(0x10, ENTRY);
    put(0x18, ENTRY);
    put(0x1C, text.len() as u32);
    put(0x30, 0x801F_FF00);

    exe[0x4C..0x4C + region.len()].copy_from_slice(region.as_bytes());
    exe.extend_from_slice(&text);
    exe
}

/// A system whose output is discarded
#[allow(dead_code)]
pub fn quiet_system() -> System {
    System::new(test_config(), Box::new(NullSink)).expect("Failed to create system")
}

/// A system recording its output into memory
#[allow(dead_code)]
pub fn recording_system(config: PlayerConfig) -> (System, MemorySink) {
    let sink = MemorySink::new();
    let system = System::new(config, Box::new(sink.clone())).expect("Failed to create system");
    (system, sink)
}

/// Place `program` at [`ENTRY`] and point the CPU at it
#[allow(dead_code)]
pub fn load_program(system: &mut System, program: &[u32]) {
    for (i, &word) in program.iter().enumerate() {
        system
            .bus_mut()
            .write::<u32>(ENTRY + 4 * i as u32, word)
            .expect("Failed to write to memory");
    }
    system.seed(ENTRY, 0, 0x801F_FF00);
}
