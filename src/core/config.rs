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

//! Player configuration
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `PSFRX_*` environment variables. Command line flags are applied
//! last by the binary.
//!
//! ```toml
//! interpolation = "cubic"
//! reverb = false
//! dead_loop_skip = true
//! vsync_hz = 50
//! ring_frames = 2048
//! seconds = 120
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::core::error::{EmulatorError, Result};
use crate::core::spu::Interpolation;

/// Prefix of the environment overrides
pub const ENV_PREFIX: &str = "PSFRX_";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Voice interpolation filter
    pub interpolation: Interpolation,

    /// Run the reverb unit
    pub reverb: bool,

    /// Fast-forward the clock through guest idle loops
    pub dead_loop_skip: bool,

    /// VSync rate (60 NTSC, 50 PAL)
    pub vsync_hz: u32,

    /// Stereo frames per block handed to the sink
    pub ring_frames: usize,

    /// Playback length for file output
    pub seconds: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Gaussian,
            reverb: true,
            dead_loop_skip: true,
            vsync_hz: 60,
            ring_frames: 1024,
            seconds: 180,
        }
    }
}

impl PlayerConfig {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Defaults or `path`, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(std::env::vars())?;
        Ok(config)
    }

    /// Apply `PSFRX_*` overrides from `(key, value)` pairs
    ///
    /// Keys without the prefix are ignored, as are unknown `PSFRX_` keys
    /// (with a warning).
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref().trim();

            match name {
                "INTERPOLATION" => self.interpolation = value.parse()?,
                "REVERB" => self.reverb = parse_bool(key.as_ref(), value)?,
                "DEAD_LOOP_SKIP" => self.dead_loop_skip = parse_bool(key.as_ref(), value)?,
                "VSYNC_HZ" => self.vsync_hz = parse_number(key.as_ref(), value)?,
                "RING_FRAMES" => self.ring_frames = parse_number(key.as_ref(), value)?,
                "SECONDS" => self.seconds = parse_number(key.as_ref(), value)?,
                _ => {
                    log::warn!("Ignoring unknown setting {}", key.as_ref());
                    continue;
                }
            }
            log::debug!("{} = {}", key.as_ref(), value);
        }
        self.validate()
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.vsync_hz != 50 && self.vsync_hz != 60 {
            return Err(EmulatorError::Config(format!(
                "vsync_hz must be 50 or 60, got {}",
                self.vsync_hz
            )));
        }
        if self.ring_frames == 0 {
            return Err(EmulatorError::Config(
                "ring_frames must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(EmulatorError::Config(format!(
            "{} expects a boolean, got '{}'",
            key, value
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| EmulatorError::Config(format!("{} expects a number, got '{}'", key, value)))
}
