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

//! CPU <-> SPU rendezvous
//!
//! The SPU worker runs on its own thread and receives requests over a
//! one-slot channel. The CPU thread sends a request and waits for the
//! acknowledgment on a second one-slot channel before it continues, so:
//!
//! - no request is issued before the previous one has been acknowledged
//! - synthesis and channel state changes for one period never overlap
//! - `Shutdown` is seen at the next wake-up
//!
//! Register and DMA accesses from the CPU thread take the shared SPU lock
//! between rendezvous points, while the worker is idle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use flume::{Receiver, Sender};

use super::Spu;
use crate::core::audio::SampleSink;
use crate::core::error::{EmulatorError, Result};
use crate::core::timer::SamplePacer;

/// Work item for the SPU worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpuRequest {
    /// Synthesize this many output frames
    Samples(u32),
    /// Key on a voice
    NoteOn(usize),
    /// Key off a voice
    NoteOff(usize),
    /// Apply a voice's loop address register
    SetOffset(usize),
    /// Flush and stop
    Shutdown,
}

/// Read-only view of the running SPU for metering
#[derive(Clone)]
pub struct SpuMeter {
    spu: Arc<Mutex<Spu>>,
    frames: Arc<AtomicU64>,
}

impl SpuMeter {
    /// Visible envelope level of a voice (0..=1023)
    pub fn envelope_volume(&self, voice: usize) -> Result<u16> {
        self.spu
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .envelope_volume(voice)
    }

    /// Bitfield of voices currently sounding
    pub fn channel_on(&self) -> u32 {
        self.spu
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .channel_on()
    }

    /// Frames synthesized by the worker so far
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }
}

/// CPU-side handle of the SPU worker
pub struct SpuBridge {
    requests: Sender<SpuRequest>,
    acks: Receiver<()>,
    spu: Arc<Mutex<Spu>>,
    frames: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl SpuBridge {
    /// Move `spu` behind the shared lock and start the worker thread
    ///
    /// # Arguments
    ///
    /// * `spu` - SPU state to drive
    /// * `sink` - Destination of every completed ring
    /// * `ring_frames` - Stereo frames per ring
    pub fn spawn(spu: Spu, sink: Box<dyn SampleSink + Send>, ring_frames: usize) -> Result<Self> {
        let (requests, request_rx) = flume::bounded(1);
        let (ack_tx, acks) = flume::bounded(1);
        let spu = Arc::new(Mutex::new(spu));
        let frames = Arc::new(AtomicU64::new(0));
        let ring_frames = ring_frames.max(1);

        let worker = SpuWorker {
            spu: Arc::clone(&spu),
            frames: Arc::clone(&frames),
            sink,
            ring: Vec::with_capacity(ring_frames * 2),
            ring_frames,
            requests: request_rx,
            acks: ack_tx,
        };

        let handle = thread::Builder::new()
            .name("spu".to_string())
            .spawn(move || worker.run())?;

        log::info!("SPU worker started ({} frame ring)", ring_frames);

        Ok(Self {
            requests,
            acks,
            spu,
            frames,
            worker: Some(handle),
        })
    }

    /// Send a request and wait for its acknowledgment
    pub fn request(&mut self, request: SpuRequest) -> Result<()> {
        if self.worker.is_none() {
            return Err(EmulatorError::SpuDisconnected);
        }

        self.requests
            .send(request)
            .map_err(|_| EmulatorError::SpuDisconnected)?;
        self.acks.recv().map_err(|_| EmulatorError::SpuDisconnected)
    }

    /// Lock the shared SPU state
    ///
    /// Only call between rendezvous points; the worker holds the lock while
    /// it services a request.
    pub fn lock(&self) -> MutexGuard<'_, Spu> {
        self.spu.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Metering handle
    pub fn meter(&self) -> SpuMeter {
        SpuMeter {
            spu: Arc::clone(&self.spu),
            frames: Arc::clone(&self.frames),
        }
    }

    /// Whether the worker thread is still attached
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Flush pending audio, stop the worker and join it
    ///
    /// Calling this more than once is a no-op.
    pub fn shutdown(&mut self) -> Result<()> {
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };

        let delivered = self.requests.send(SpuRequest::Shutdown).is_ok() && self.acks.recv().is_ok();

        handle
            .join()
            .map_err(|_| EmulatorError::ThreadPanic("spu".to_string()))?;

        log::info!("SPU worker stopped");

        if delivered {
            Ok(())
        } else {
            Err(EmulatorError::SpuDisconnected)
        }
    }
}

impl SamplePacer for SpuBridge {
    fn synthesize(&mut self, periods: u32) -> Result<()> {
        if periods == 0 {
            return Ok(());
        }
        self.request(SpuRequest::Samples(periods))
    }
}

impl Drop for SpuBridge {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::warn!("SPU shutdown on drop failed: {}", e);
        }
    }
}

/// Worker-side state
struct SpuWorker {
    spu: Arc<Mutex<Spu>>,
    frames: Arc<AtomicU64>,
    sink: Box<dyn SampleSink + Send>,
    ring: Vec<i16>,
    ring_frames: usize,
    requests: Receiver<SpuRequest>,
    acks: Sender<()>,
}

impl SpuWorker {
    fn run(mut self) {
        while let Ok(request) = self.requests.recv() {
            let shutdown = request == SpuRequest::Shutdown;
            self.service(request);

            if self.acks.send(()).is_err() || shutdown {
                break;
            }
        }

        log::debug!("SPU worker loop exited");
    }

    fn service(&mut self, request: SpuRequest) {
        match request {
            SpuRequest::Samples(count) => self.synthesize(count),
            SpuRequest::NoteOn(voice) => self.voice_op(voice, Spu::key_on),
            SpuRequest::NoteOff(voice) => self.voice_op(voice, Spu::key_off),
            SpuRequest::SetOffset(voice) => self.voice_op(voice, Spu::set_offset),
            SpuRequest::Shutdown => {
                self.flush();
                if let Err(e) = self.sink.finish() {
                    log::error!("Sample sink failed to finish: {}", e);
                }
            }
        }
    }

    fn voice_op(&mut self, voice: usize, op: fn(&mut Spu, usize) -> Result<()>) {
        let mut spu = self.spu.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = op(&mut *spu, voice) {
            log::warn!("SPU request ignored: {}", e);
        }
    }

    fn synthesize(&mut self, count: u32) {
        for _ in 0..count {
            let (left, right) = {
                let mut spu = self.spu.lock().unwrap_or_else(PoisonError::into_inner);
                spu.mix_frame()
            };
            self.ring.push(left);
            self.ring.push(right);

            if self.ring.len() >= self.ring_frames * 2 {
                self.flush();
            }
        }

        self.frames.fetch_add(count as u64, Ordering::Release);
    }

    /// Hand the filled part of the ring to the sink
    fn flush(&mut self) {
        if self.ring.is_empty() {
            return;
        }

        if let Err(e) = self.sink.write(&self.ring) {
            log::error!("Sample sink write failed: {}", e);
        }
        self.ring.clear();
    }
}
