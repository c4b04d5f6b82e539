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

//! Reverb unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::core::spu::reverb::reg;

/// A single echo: input -> same-side reflection -> comb -> two delays
fn echo_registers() -> ReverbRegisters {
    let mut regs = ReverbRegisters {
        work_area: 0x1000,
        ..ReverbRegisters::default()
    };
    regs.regs[reg::V_LIN] = 0x7FFF;
    regs.regs[reg::V_IIR] = 0x4000;
    regs.regs[reg::V_COMB1] = 0x4000;
    regs.regs[reg::M_LSAME] = 0x10;
    regs.regs[reg::M_LCOMB1] = 0x10;
    regs.regs[reg::M_LAPF1] = 0x20;
    regs.regs[reg::M_LAPF2] = 0x30;
    regs.regs[reg::D_APF1] = 8;
    regs.regs[reg::D_APF2] = 8;
    regs
}

#[test]
fn test_impulse_echoes_then_decays() {
    let regs = echo_registers();
    let mut ram = vec![0u8; SPU_RAM_SIZE];
    let mut reverb = PsxReverb::new();

    let out: Vec<(i32, i32)> = (0..5000)
        .map(|i| {
            let input = if i == 0 { 0x4000 } else { 0 };
            reverb.process(&regs, &mut ram, input, input)
        })
        .collect();

    // Two 64-byte delay lines at half rate hold the echo back
    assert!(out[..100].iter().all(|&(l, _)| l == 0));
    assert!(out[100..400].iter().any(|&(l, _)| l > 0));
    assert!(out[4000..].iter().all(|&(l, _)| l == 0));
    assert!(out.iter().all(|&(_, r)| r == 0));
}

#[test]
fn test_output_held_for_two_samples() {
    let regs = echo_registers();
    let mut ram = vec![0u8; SPU_RAM_SIZE];
    let mut reverb = PsxReverb::new();

    let out: Vec<(i32, i32)> = (0..400)
        .map(|i| reverb.process(&regs, &mut ram, if i == 0 { 0x4000 } else { 0 }, 0))
        .collect();

    for i in (1..out.len() - 1).step_by(2) {
        assert_eq!(out[i], out[i + 1], "sample {}", i);
    }
}

#[test]
fn test_buffer_address_stays_in_work_area() {
    let mut regs = echo_registers();
    regs.work_area = 0xFFF0;
    let mut ram = vec![0u8; SPU_RAM_SIZE];
    let mut reverb = PsxReverb::new();

    for _ in 0..1000 {
        reverb.process(&regs, &mut ram, 0x1000, 0x1000);
        reverb.process(&regs, &mut ram, 0x1000, 0x1000);
        assert!(reverb.current() >= regs.base());
        assert!((reverb.current() as usize) < SPU_RAM_SIZE);
    }

    // Nothing below the work area is touched
    assert!(ram[..regs.base() as usize].iter().all(|&b| b == 0));
}

#[test]
fn test_reset_restarts_at_work_area() {
    let regs = echo_registers();
    let mut ram = vec![0u8; SPU_RAM_SIZE];
    let mut reverb = PsxReverb::new();

    for _ in 0..10 {
        reverb.process(&regs, &mut ram, 100, 100);
    }
    assert_eq!(reverb.current(), regs.base() + 10);

    reverb.reset();
    assert_eq!(reverb.current(), 0);
    assert_eq!(reverb.process(&regs, &mut ram, 0, 0), (0, 0));
}

fn reverb_spu() -> Spu {
    let mut spu = unmuted_spu();
    upload(&mut spu, 0x1000, &looping_wave_block());
    setup_voice(&mut spu, 0, 0x1000);

    let regs = echo_registers();
    for (i, &value) in regs.regs.iter().enumerate() {
        spu.write_register(SPU_BASE + REVERB_REGISTERS + 2 * i as u32, value);
    }
    spu.write_register(SPU_BASE + REVERB_WORK_AREA, regs.work_area);
    spu.write_register(SPU_BASE + REVERB_ON_LOW, 0x0001);
    spu.write_register(SPU_BASE + REVERB_DEPTH_LEFT, 0x7FFF);
    spu.write_register(
        SPU_BASE + CONTROL,
        (SpuControl::ENABLE | SpuControl::UNMUTE | SpuControl::REVERB_MASTER).bits(),
    );
    spu.key_on(0).unwrap();
    spu
}

#[test]
fn test_mixer_feeds_work_area() {
    let mut spu = reverb_spu();
    for _ in 0..40 {
        spu.mix_frame();
    }

    let base = 0x1000 * 8;
    assert!(spu.ram()[base..].iter().any(|&b| b != 0));
}

#[test]
fn test_reverb_disabled_leaves_work_area() {
    let mut spu = reverb_spu();
    spu.set_reverb_enabled(false);
    for _ in 0..40 {
        spu.mix_frame();
    }

    let base = 0x1000 * 8;
    assert!(spu.ram()[base..].iter().all(|&b| b == 0));
}

struct CountingReverb(Arc<AtomicUsize>);

impl ReverbUnit for CountingReverb {
    fn process(
        &mut self,
        _regs: &ReverbRegisters,
        _ram: &mut [u8],
        _left: i32,
        _right: i32,
    ) -> (i32, i32) {
        self.0.fetch_add(1, Ordering::Relaxed);
        (0, 0)
    }

    fn reset(&mut self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

#[test]
fn test_custom_reverb_unit() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut spu = reverb_spu();
    spu.set_reverb_unit(Box::new(CountingReverb(Arc::clone(&calls))));

    for _ in 0..10 {
        spu.mix_frame();
    }
    assert_eq!(calls.load(Ordering::Relaxed), 10);

    // Only runs under the master reverb switch
    spu.write_register(
        SPU_BASE + CONTROL,
        (SpuControl::ENABLE | SpuControl::UNMUTE).bits(),
    );
    for _ in 0..10 {
        spu.mix_frame();
    }
    assert_eq!(calls.load(Ordering::Relaxed), 10);

    spu.reset();
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}
