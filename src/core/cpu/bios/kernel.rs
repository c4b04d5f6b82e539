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

//! B0 / C0 tables: events, root counters, exception plumbing and TTY

use super::{COP0, CPU};
use crate::core::bus::Bus;
use crate::core::error::Result;
use crate::core::interrupt::Irq;
use crate::core::timer::VSYNC_COUNTER;

/// Handles returned by OpenEvent are `EVENT_HANDLE | index`
const EVENT_HANDLE: u32 = 0xF100_0000;

/// Maximum number of open events
const EVENT_SLOTS: usize = 32;

/// Event mode: soft-call the handler on delivery
const EVENT_MODE_CALLBACK: u32 = 0x1000;

/// Event mode: mark the event ready on delivery
const EVENT_MODE_READY: u32 = 0x2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) enum EventStatus {
    #[default]
    Unused,
    Waiting,
    Active,
    Ready,
}

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Event {
    class: u32,
    spec: u32,
    mode: u32,
    handler: u32,
    pub(super) status: EventStatus,
}

/// I_MASK bit of a root counter
fn counter_line(counter: usize) -> Irq {
    match counter {
        0 => Irq::TIMER0,
        1 => Irq::TIMER1,
        2 => Irq::TIMER2,
        _ => Irq::VBLANK,
    }
}

impl CPU {
    pub(super) fn call_b0(&mut self, function: u32, bus: &mut Bus) -> Result<()> {
        log::trace!("B0:{:02X}", function);

        match function {
            0x02 => self.bios_set_rcnt(bus),
            0x03 => self.bios_get_rcnt(bus),
            0x04 => self.bios_start_rcnt(bus, true),
            0x05 => self.bios_start_rcnt(bus, false),
            0x06 => self.bios_reset_rcnt(bus),
            0x07 => {
                let (class, spec) = (self.arg(0), self.arg(1));
                self.deliver_event(class, spec, bus)?;
            }
            0x08 => self.bios_open_event(),
            0x09 => self.update_event(EventStatus::Unused),
            0x0A => self.bios_wait_event(),
            0x0B => self.bios_test_event(),
            0x0C => self.update_event(EventStatus::Active),
            0x0D => self.update_event(EventStatus::Waiting),
            0x17 => self.bios_return_from_exception(),
            0x18 => {
                // SetDefaultExitFromException
                self.bios.hook_entry_int = 0;
            }
            0x19 => {
                // HookEntryInt
                self.bios.hook_entry_int = self.arg(0);
                log::debug!("HookEntryInt 0x{:08X}", self.arg(0));
            }
            0x3D => self.bios_putchar(self.arg(0) as u8),
            0x3F => {
                let text = Self::read_cstring(bus, self.arg(0), 1024);
                log::info!("[tty] {}", String::from_utf8_lossy(&text));
            }
            _ => {
                log::warn!("Unimplemented BIOS call B0:{:02X}", function);
                self.set_return(0);
            }
        }
        Ok(())
    }

    pub(super) fn call_c0(&mut self, function: u32, _bus: &mut Bus) -> Result<()> {
        log::trace!("C0:{:02X}", function);

        match function {
            0x0A => {
                // ChangeClearRCnt
                let counter = (self.arg(0) & 3) as usize;
                let old = self.bios.clear_rcnt[counter];
                self.bios.clear_rcnt[counter] = self.arg(1);
                self.set_return(old);
            }
            _ => {
                log::warn!("Unimplemented BIOS call C0:{:02X}", function);
                self.set_return(0);
            }
        }
        Ok(())
    }

    // === Events ===

    /// Deliver an event to every active matching listener
    pub(super) fn deliver_event(&mut self, class: u32, spec: u32, bus: &mut Bus) -> Result<()> {
        for index in 0..self.bios.events.len() {
            let event = self.bios.events[index];
            if event.status != EventStatus::Active || event.class != class || event.spec != spec {
                continue;
            }

            match event.mode {
                EVENT_MODE_CALLBACK if event.handler != 0 => {
                    self.soft_call(event.handler, bus)?;
                }
                EVENT_MODE_READY => self.bios.events[index].status = EventStatus::Ready,
                _ => {}
            }
        }
        Ok(())
    }

    fn event_index(&self, handle: u32) -> Option<usize> {
        let index = (handle & 0xFFFF) as usize;
        let valid = handle & 0xFFFF_0000 == EVENT_HANDLE
            && index < self.bios.events.len()
            && self.bios.events[index].status != EventStatus::Unused;
        valid.then_some(index)
    }

    fn bios_open_event(&mut self) {
        let event = Event {
            class: self.arg(0),
            spec: self.arg(1),
            mode: self.arg(2),
            handler: self.arg(3),
            status: EventStatus::Waiting,
        };

        let events = &mut self.bios.events;
        let slot = match events.iter().position(|e| e.status == EventStatus::Unused) {
            Some(slot) => slot,
            None if events.len() < EVENT_SLOTS => {
                events.push(Event::default());
                events.len() - 1
            }
            None => {
                log::warn!("OpenEvent: no free event slot");
                self.set_return(0xFFFF_FFFF);
                return;
            }
        };
        events[slot] = event;

        log::debug!(
            "OpenEvent class=0x{:08X} spec=0x{:04X} mode=0x{:04X} -> {}",
            event.class,
            event.spec,
            event.mode,
            slot
        );
        self.set_return(EVENT_HANDLE | slot as u32);
    }

    /// CloseEvent / EnableEvent / DisableEvent
    fn update_event(&mut self, status: EventStatus) {
        match self.event_index(self.arg(0)) {
            Some(index) => {
                self.bios.events[index].status = status;
                self.set_return(1);
            }
            None => {
                log::warn!("Invalid event handle 0x{:08X}", self.arg(0));
                self.set_return(0);
            }
        }
    }

    /// WaitEvent: consume a ready event
    fn bios_wait_event(&mut self) {
        self.bios_test_event();
    }

    /// TestEvent: 1 (and re-arm) if the event is ready
    fn bios_test_event(&mut self) {
        let ready = match self.event_index(self.arg(0)) {
            Some(index) if self.bios.events[index].status == EventStatus::Ready => {
                self.bios.events[index].status = EventStatus::Active;
                true
            }
            _ => false,
        };
        self.set_return(ready as u32);
    }

    // === Root counters ===

    /// SetRCnt(counter, target, mode)
    fn bios_set_rcnt(&mut self, bus: &mut Bus) {
        let counter = (self.arg(0) & 3) as usize;
        let target = self.arg(1);
        let flags = self.arg(2);

        if counter != VSYNC_COUNTER {
            let mut mode = 0;
            if flags & 0x1000 != 0 {
                mode |= 0x050;
            }
            if flags & 0x0100 != 0 {
                mode |= 0x008;
            }
            if flags & 0x0010 != 0 {
                mode |= 0x001;
            }
            if flags & 0x0001 != 0 {
                mode |= if counter == 2 { 0x200 } else { 0x100 };
            }

            let counters = bus.counters_mut();
            counters.write_target(counter, target);
            counters.write_mode(counter, mode);
        }
        self.set_return(1);
    }

    fn bios_get_rcnt(&mut self, bus: &mut Bus) {
        let counter = (self.arg(0) & 3) as usize;
        let value = if counter != VSYNC_COUNTER {
            bus.counters().read_count(counter)
        } else {
            0
        };
        self.set_return(value);
    }

    /// StartRCnt / StopRCnt: unmask or mask the counter's interrupt
    fn bios_start_rcnt(&mut self, bus: &mut Bus, start: bool) {
        let line = counter_line((self.arg(0) & 3) as usize).bits() as u32;
        let irq = bus.irq_mut();
        let mask = irq.read_mask();
        irq.write_mask(if start { mask | line } else { mask & !line });
        self.set_return(1);
    }

    fn bios_reset_rcnt(&mut self, bus: &mut Bus) {
        let counter = (self.arg(0) & 3) as usize;
        if counter != VSYNC_COUNTER {
            let counters = bus.counters_mut();
            counters.write_mode(counter, 0);
            counters.write_target(counter, 0);
            counters.write_count(counter, 0);
        }
        self.set_return(1);
    }

    // === Exception plumbing ===

    /// ReturnFromException: resume the context saved at the interrupt
    fn bios_return_from_exception(&mut self) {
        if let Some(context) = self.bios.saved_context.take() {
            self.regs = context;
        }

        let cause = self.cop0.regs[COP0::CAUSE];
        let mut epc = self.cop0.regs[COP0::EPC];
        if cause & COP0::CAUSE_BD != 0 {
            epc = epc.wrapping_add(4);
        }
        self.regs[Self::PC] = epc;
        self.cop0.pop_mode();
    }

    fn bios_putchar(&mut self, c: u8) {
        if c == b'\n' {
            log::info!("[tty] {}", self.bios.tty);
            self.bios.tty.clear();
        } else {
            self.bios.tty.push(c as char);
        }
        self.set_return(c as u32);
    }
}
