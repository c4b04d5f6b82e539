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

//! WAV file sink

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::{SampleSink, OUTPUT_CHANNELS, OUTPUT_RATE};
use crate::core::error::Result;

/// Sink writing 16-bit stereo PCM to a WAV file
pub struct WavSink {
    writer: Option<WavWriter<BufWriter<File>>>,
    samples: u64,
}

impl WavSink {
    /// Create (or truncate) a WAV file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let spec = WavSpec {
            channels: OUTPUT_CHANNELS,
            sample_rate: OUTPUT_RATE,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(path.as_ref(), spec)?;
        log::info!("Writing audio to {}", path.as_ref().display());

        Ok(Self {
            writer: Some(writer),
            samples: 0,
        })
    }

    /// Samples written so far
    pub fn samples_written(&self) -> u64 {
        self.samples
    }
}

impl SampleSink for WavSink {
    fn write(&mut self, samples: &[i16]) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            for &s in samples {
                writer.write_sample(s)?;
            }
            self.samples += samples.len() as u64;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
            log::info!("WAV finalized ({} samples)", self.samples);
        }
        Ok(())
    }
}

impl Drop for WavSink {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            log::error!("Failed to finalize WAV file: {}", e);
        }
    }
}
