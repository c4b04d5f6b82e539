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

//! Audio output backend using cpal
//!
//! The backend owns the device stream and a sample queue filled from the
//! player's [`super::SampleStream`]. cpal streams are not `Send` on every
//! platform, so the backend stays on the thread that created it and is fed
//! from there rather than acting as the SPU worker's sink directly.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use super::OUTPUT_RATE;
use crate::core::error::{EmulatorError, Result};

/// Audio output backend
///
/// # Example
///
/// ```no_run
/// use psfrx::core::audio::AudioBackend;
///
/// let mut audio = AudioBackend::new().unwrap();
/// audio.queue(&[100, 100, -100, -100]);
/// ```
pub struct AudioBackend {
    /// cpal audio output stream
    _stream: cpal::Stream,
    /// Queue of stereo frames (left, right) to be played
    queue: Arc<Mutex<VecDeque<(i16, i16)>>>,
    /// Sample rate of the output device
    sample_rate: u32,
}

impl AudioBackend {
    /// Open the default output device and start the playback stream
    ///
    /// # Errors
    ///
    /// Returns `EmulatorError::Audio` if:
    /// - No audio output device is available
    /// - The device is not stereo
    /// - The stream cannot be built or started
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EmulatorError::Audio("no audio output device available".into()))?;

        let config = device
            .default_output_config()
            .map_err(|e| EmulatorError::Audio(e.to_string()))?;
        let sample_rate = config.sample_rate().0;
        let channels = config.channels();
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        if channels != 2 {
            return Err(EmulatorError::Audio(format!(
                "device '{}' has {} channels, stereo required",
                name, channels
            )));
        }

        if sample_rate != OUTPUT_RATE {
            log::warn!(
                "Audio: device sample rate is {} Hz (expected {} Hz), pitch will be off",
                sample_rate,
                OUTPUT_RATE
            );
        }

        log::info!("Audio: using device '{}' at {} Hz", name, sample_rate);

        let queue = Arc::new(Mutex::new(VecDeque::new()));
        let consumer = Arc::clone(&queue);

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut queue = consumer.lock().unwrap_or_else(PoisonError::into_inner);

                    for frame in data.chunks_mut(2) {
                        let (left, right) = queue.pop_front().unwrap_or((0, 0));
                        frame[0] = left as f32 / 32768.0;
                        if let Some(r) = frame.get_mut(1) {
                            *r = right as f32 / 32768.0;
                        }
                    }
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| EmulatorError::Audio(e.to_string()))?;

        stream
            .play()
            .map_err(|e| EmulatorError::Audio(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            queue,
            sample_rate,
        })
    }

    /// Queue interleaved stereo samples for playback
    pub fn queue(&mut self, samples: &[i16]) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.extend(samples.chunks_exact(2).map(|f| (f[0], f[1])));
    }

    /// Number of stereo frames waiting to be played
    pub fn buffer_level(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Sample rate of the output device
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
