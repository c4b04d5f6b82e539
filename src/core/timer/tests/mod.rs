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

//! Root counter tests
//!
//! - Register access and reset values
//! - Deadline computation and IRQ delivery
//! - Audio pacing and idle-loop skipping

use super::*;


/// Records every synthesize request
#[derive(Default)]
struct RecordingPacer {
    requests: Vec<u32>,
}

impl SamplePacer for RecordingPacer {
    fn synthesize(&mut self, periods: u32) -> Result<()> {
        self.requests.push(periods);
        Ok(())
    }
}

/// Advance the clock one cycle at a time, updating like the interpreter
fn run(rc: &mut RootCounter, irq: &mut InterruptController, pacer: &mut RecordingPacer, cycles: u32) {
    for _ in 0..cycles {
        rc.advance(1);
        if rc.deadline_reached() {
            rc.update(irq, pacer).unwrap();
        }
    }
}
