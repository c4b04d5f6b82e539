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

//! Custom assertions for player testing

use psfrx::core::system::System;

/// Assert a guest word has the expected value
#[allow(dead_code)]
pub fn assert_guest_word(system: &System, addr: u32, expected: u32) {
    let actual = system.bus().read::<u32>(addr);
    assert_eq!(
        actual, expected,
        "Word at 0x{:08X} mismatch: expected 0x{:08X}, got 0x{:08X}",
        addr, expected, actual
    );
}

/// Assert that a block of samples is not silence
#[allow(dead_code)]
pub fn assert_audible(samples: &[i16]) {
    let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
    assert!(
        peak > 0,
        "Expected audible output in {} samples",
        samples.len()
    );
}
