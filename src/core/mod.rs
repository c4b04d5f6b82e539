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

//! Core player components
//!
//! This module contains every hardware component the player emulates:
//! - CPU (MIPS R3000A interpreter with an HLE BIOS)
//! - Address space and hardware register bus
//! - Root counters (timing and audio pacing)
//! - Interrupt controller and the SPU DMA channel
//! - SPU (Sound Processing Unit) and its worker thread
//! - Audio sinks, configuration and the executable loader
//! - System integration

pub mod audio;
pub mod bus;
pub mod config;
pub mod cpu;
pub mod dma;
pub mod error;
pub mod interrupt;
pub mod loader;
pub mod memory;
pub mod spu;
pub mod system;
pub mod timer;

// Re-export commonly used types
pub use audio::{MemorySink, NullSink, SampleSink, WavSink};
pub use bus::Bus;
pub use config::PlayerConfig;
pub use cpu::CPU;
pub use error::{EmulatorError, Result};
pub use loader::LoadedImage;
pub use memory::AddressSpace;
pub use spu::{Interpolation, Spu, SpuBridge};
pub use system::{Running, System};
pub use timer::RootCounter;
