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

//! PlayStation Sound Format player core
//!
//! This library emulates the parts of a PlayStation 1 needed to play PSF
//! music: the MIPS R3000A CPU with a high-level BIOS, main memory, the root
//! counters and the SPU. The SPU runs on its own thread and hands finished
//! audio to a [`core::audio::SampleSink`].
//!
//! # Example
//!
//! ```
//! use psfrx::core::audio::MemorySink;
//! use psfrx::core::config::PlayerConfig;
//! use psfrx::core::system::System;
//!
//! let sink = MemorySink::new();
//! let mut system = System::new(PlayerConfig::default(), Box::new(sink.clone()))?;
//!
//! // Jump-to-self at the entry point keeps the CPU idle
//! system.bus_mut().memory_mut().write::<u32>(0x8001_0000, 0x1000_FFFF);
//! system.seed(0x8001_0000, 0, 0x801F_FFF0);
//!
//! system.run_cycles(100_000)?;
//! system.finish()?;
//! assert!(!sink.is_empty());
//! # Ok::<(), psfrx::core::error::EmulatorError>(())
//! ```

pub mod core;
