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

//! Sample interpolation filters
//!
//! Every voice keeps the last four fetched samples in a small ring
//! (`ring[3]` newest) plus the 16-bit fraction of its playback position.
//! The filters differ in how far behind the newest sample they sit:
//!
//! | Filter     | Output lies between     |
//! |------------|-------------------------|
//! | `none`     | newest sample           |
//! | `linear`   | `ring[2]` and `ring[3]` |
//! | `gaussian` | `ring[1]` and `ring[2]` |
//! | `cubic`    | `ring[1]` and `ring[2]` |
//!
//! All of them return the input unchanged for a constant input stream.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::core::error::EmulatorError;

/// Interpolation filter kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    None,
    Linear,
    #[default]
    Gaussian,
    Cubic,
}

impl Interpolation {
    /// Every filter kind
    pub const ALL: [Interpolation; 4] = [
        Interpolation::None,
        Interpolation::Linear,
        Interpolation::Gaussian,
        Interpolation::Cubic,
    ];

    /// Produce one output sample
    ///
    /// # Arguments
    ///
    /// * `ring` - The last four samples, oldest first
    /// * `fraction` - Position between samples (0..=0xFFFF)
    #[inline(always)]
    pub fn apply(self, ring: &[i32; 4], fraction: u32) -> i32 {
        let fraction = (fraction & 0xFFFF) as i64;

        match self {
            Interpolation::None => ring[3],
            Interpolation::Linear => {
                let (a, b) = (ring[2] as i64, ring[3] as i64);
                (a + (((b - a) * fraction) >> 16)) as i32
            }
            Interpolation::Gaussian => {
                let weights = &gaussian_table()[(fraction >> 8) as usize];
                let sum: i64 = weights
                    .iter()
                    .zip(ring.iter())
                    .map(|(&w, &s)| w as i64 * s as i64)
                    .sum();
                (sum >> 15) as i32
            }
            Interpolation::Cubic => cubic(ring, fraction),
        }
    }
}

impl FromStr for Interpolation {
    type Err = EmulatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Interpolation::None),
            "linear" => Ok(Interpolation::Linear),
            "gaussian" => Ok(Interpolation::Gaussian),
            "cubic" => Ok(Interpolation::Cubic),
            other => Err(EmulatorError::Config(format!(
                "unknown interpolation '{}' (expected none, linear, gaussian or cubic)",
                other
            ))),
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Interpolation::None => "none",
            Interpolation::Linear => "linear",
            Interpolation::Gaussian => "gaussian",
            Interpolation::Cubic => "cubic",
        };
        f.write_str(name)
    }
}

/// Newton forward-difference cubic through the four ring samples
///
/// The samples sit at x = 0..3; the output is taken at x = 1 + fraction.
fn cubic(ring: &[i32; 4], fraction: i64) -> i32 {
    const ONE: i64 = 0x10000;

    let [s0, s1, s2, s3] = ring.map(|s| s as i64);
    let d1 = s1 - s0;
    let d2 = s2 - 2 * s1 + s0;
    let d3 = s3 - 3 * s2 + 3 * s1 - s0;
    let x = ONE + fraction;

    // s0 + x(d1 + (x-1)/2 (d2 + (x-2)/3 d3))
    let mut acc = (d3 * (x - 2 * ONE) / 3) >> 16;
    acc += d2;
    acc = (acc * (x - ONE) / 2) >> 16;
    acc += d1;
    acc = (acc * x) >> 16;

    (s0 + acc).clamp(i16::MIN as i64, i16::MAX as i64) as i32
}

/// Number of fractional phases in the Gaussian table
const GAUSS_PHASES: usize = 256;

/// Sum of the four weights of every phase
const GAUSS_UNITY: i32 = 0x8000;

static GAUSSIAN_TABLE: OnceLock<[[i32; 4]; GAUSS_PHASES]> = OnceLock::new();

/// Four-tap Gaussian weights, one row per fraction phase
///
/// Sampled from a Gaussian with sigma 0.7 rather than the hardware ROM
/// table. Each row sums to exactly 0x8000.
pub fn gaussian_table() -> &'static [[i32; 4]; GAUSS_PHASES] {
    GAUSSIAN_TABLE.get_or_init(|| {
        const SIGMA: f64 = 0.7;
        let mut table = [[0i32; 4]; GAUSS_PHASES];

        for (phase, row) in table.iter_mut().enumerate() {
            let position = 1.0 + phase as f64 / GAUSS_PHASES as f64;
            let raw: Vec<f64> = (0..4)
                .map(|tap| {
                    let d = tap as f64 - position;
                    (-(d * d) / (2.0 * SIGMA * SIGMA)).exp()
                })
                .collect();
            let total: f64 = raw.iter().sum();

            for (weight, r) in row.iter_mut().zip(raw.iter()) {
                *weight = (r / total * GAUSS_UNITY as f64).round() as i32;
            }

            // Put the rounding residue on the heaviest tap
            let residue = GAUSS_UNITY - row.iter().sum::<i32>();
            let heaviest = if phase < GAUSS_PHASES / 2 { 1 } else { 2 };
            row[heaviest] += residue;
        }

        table
    })
}
