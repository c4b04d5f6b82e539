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

//! Bus tests
//!
//! - Plain memory fall-through
//! - Interrupt controller and root counter windows
//! - SPU register routing and key-on rendezvous
//! - DMA channel 4 transfers

use super::*;
use crate::core::audio::MemorySink;
use crate::core::spu::Spu;

mod basic;

/// Bus over a fresh SPU worker writing into an in-memory sink
fn test_bus() -> (Bus, MemorySink) {
    let sink = MemorySink::new();
    let bridge = SpuBridge::spawn(Spu::new(), Box::new(sink.clone()), 16).unwrap();
    (Bus::new(60, bridge), sink)
}
