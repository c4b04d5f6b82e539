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

/// Player error types
use thiserror::Error;

/// Result type for player operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Main error type for the player core
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Loader error: {0}")]
    LoaderError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("WAV output error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Audio output error: {0}")]
    Audio(String),

    #[error("SPU worker is no longer running")]
    SpuDisconnected,

    #[error("Invalid voice index: {0} (valid range: 0-23)")]
    InvalidVoice(usize),

    #[error("Thread panicked: {0}")]
    ThreadPanic(String),
}
