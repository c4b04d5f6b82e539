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

//! Audio sinks
//!
//! The SPU worker hands every completed ring of interleaved 16-bit stereo
//! samples (44100Hz) to a [`SampleSink`]. A sink may block; that is the
//! backpressure point of the synthesis pipeline.

use std::sync::{Arc, Mutex, PoisonError};

use crate::core::error::{EmulatorError, Result};

#[cfg(feature = "audio")]
mod backend;
mod wav;


#[cfg(feature = "audio")]
pub use backend::AudioBackend;
pub use wav::WavSink;

/// Output sample rate in Hz
pub const OUTPUT_RATE: u32 = 44_100;

/// Output channel count
pub const OUTPUT_CHANNELS: u16 = 2;

/// Consumer of synthesized audio
pub trait SampleSink {
    /// Accept a block of interleaved stereo samples
    fn write(&mut self, samples: &[i16]) -> Result<()>;

    /// Flush buffered output; called once when synthesis shuts down
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: SampleSink + ?Sized> SampleSink for Box<S> {
    fn write(&mut self, samples: &[i16]) -> Result<()> {
        (**self).write(samples)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SampleSink for NullSink {
    fn write(&mut self, _samples: &[i16]) -> Result<()> {
        Ok(())
    }
}

/// Sink that appends to a shared vector
///
/// Clones share the same buffer, so one clone can be handed to the SPU
/// worker while another is inspected.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    samples: Arc<Mutex<Vec<i16>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far
    pub fn samples(&self) -> Vec<i16> {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of samples (not frames) written so far
    pub fn len(&self) -> usize {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SampleSink for MemorySink {
    fn write(&mut self, samples: &[i16]) -> Result<()> {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(samples);
        Ok(())
    }
}

/// Sending half of a bounded sample stream
///
/// `write` blocks while the stream holds `capacity` unread blocks.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: flume::Sender<Vec<i16>>,
}

/// Pull-based receiving half of a sample stream
#[derive(Debug)]
pub struct SampleStream {
    receiver: flume::Receiver<Vec<i16>>,
}

/// Create a bounded sample stream holding at most `capacity` blocks
pub fn sample_stream(capacity: usize) -> (ChannelSink, SampleStream) {
    let (sender, receiver) = flume::bounded(capacity.max(1));
    (ChannelSink { sender }, SampleStream { receiver })
}

impl SampleSink for ChannelSink {
    fn write(&mut self, samples: &[i16]) -> Result<()> {
        self.sender
            .send(samples.to_vec())
            .map_err(|_| EmulatorError::Audio("sample stream receiver dropped".to_string()))
    }
}

impl SampleStream {
    /// Wait for the next block; `None` once every sender is gone
    pub fn next_block(&self) -> Option<Vec<i16>> {
        self.receiver.recv().ok()
    }

    /// Take a block if one is ready
    pub fn try_next_block(&self) -> Option<Vec<i16>> {
        self.receiver.try_recv().ok()
    }

    /// Number of blocks waiting
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl Iterator for SampleStream {
    type Item = Vec<i16>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_block()
    }
}
