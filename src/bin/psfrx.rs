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

//! psfrx - render or play a PSX-EXE music payload

use std::path::{Path, PathBuf};

use clap::Parser;
use log::{error, info};
use psfrx::core::audio::WavSink;
use psfrx::core::config::PlayerConfig;
use psfrx::core::error::Result;
use psfrx::core::loader::LoadedImage;
use psfrx::core::spu::Interpolation;
use psfrx::core::system::System;

/// PlayStation Sound Format player
#[derive(Parser)]
#[command(name = "psfrx")]
#[command(about = "PlayStation Sound Format player", long_about = None)]
struct Args {
    /// Path to the PSX-EXE payload
    exe: PathBuf,

    /// Path to a TOML config file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// WAV file to write (defaults to the payload name with .wav)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Seconds to render
    #[arg(short = 's', long)]
    seconds: Option<u32>,

    /// Voice interpolation (none, linear, gaussian, cubic)
    #[arg(short = 'i', long)]
    interpolation: Option<Interpolation>,

    /// VSync rate (50 or 60); defaults to the payload's region
    #[arg(long)]
    vsync: Option<u32>,

    /// Disable the reverb unit
    #[arg(long)]
    no_reverb: bool,

    /// Play through the default audio device (needs the `audio` feature)
    #[arg(short = 'p', long)]
    play: bool,
}

fn main() {
    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("psfrx v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let image = LoadedImage::from_file(&args.exe)?;
    let config = player_config(args, &image)?;

    if args.play {
        return play(config, &image);
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.exe.with_extension("wav"));
    render(config, &image, &output)
}

/// Config file and environment, then payload region, then flags
fn player_config(args: &Args, image: &LoadedImage) -> Result<PlayerConfig> {
    let mut config = PlayerConfig::load(args.config.as_deref())?;

    if let Some(hz) = image.vsync_hz {
        config.vsync_hz = hz;
    }
    if let Some(hz) = args.vsync {
        config.vsync_hz = hz;
    }
    if let Some(seconds) = args.seconds {
        config.seconds = seconds;
    }
    if let Some(interpolation) = args.interpolation {
        config.interpolation = interpolation;
    }
    if args.no_reverb {
        config.reverb = false;
    }

    config.validate()?;
    Ok(config)
}

fn render(config: PlayerConfig, image: &LoadedImage, output: &Path) -> Result<()> {
    let seconds = config.seconds;
    let sink = WavSink::create(output)?;
    let mut system = System::new(config, Box::new(sink))?;
    system.load_image(image)?;

    info!("Rendering {} s to {}", seconds, output.display());

    for second in 0..seconds {
        system.run_seconds(1)?;
        if (second + 1) % 10 == 0 {
            info!("Progress: {}/{} s", second + 1, seconds);
        }
    }

    let meter = system.meter();
    system.finish()?;

    info!(
        "Wrote {} frames to {}",
        meter.frames(),
        output.display()
    );
    Ok(())
}

#[cfg(feature = "audio")]
fn play(config: PlayerConfig, image: &LoadedImage) -> Result<()> {
    use psfrx::core::audio::{sample_stream, AudioBackend};
    use std::time::{Duration, Instant};

    let seconds = config.seconds;
    let high_water = config.ring_frames * 4;
    let (sink, stream) = sample_stream(4);

    let mut backend = AudioBackend::new()?;
    let mut system = System::new(config, Box::new(sink))?;
    system.load_image(image)?;

    info!("Playing for {} s", seconds);
    let running = system.execute()?;
    let deadline = Instant::now() + Duration::from_secs(u64::from(seconds));

    while Instant::now() < deadline && running.is_running() {
        if backend.buffer_level() >= high_water {
            std::thread::sleep(Duration::from_millis(5));
            continue;
        }
        match stream.next_block() {
            Some(block) => backend.queue(&block),
            None => break,
        }
    }

    // The SPU worker may be blocked on a full stream; closing it unblocks
    // the rendezvous so the CPU thread can see the stop flag
    drop(stream);
    let mut system = running.shutdown()?;
    system.finish()?;

    info!("Playback finished");
    Ok(())
}

#[cfg(not(feature = "audio"))]
fn play(_config: PlayerConfig, _image: &LoadedImage) -> Result<()> {
    Err(psfrx::core::error::EmulatorError::Audio(
        "built without the `audio` feature; use --output instead".to_string(),
    ))
}
