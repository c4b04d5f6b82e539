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

//! Worker rendezvous tests

use super::*;
use crate::core::audio::{sample_stream, MemorySink};
use crate::core::error::EmulatorError;
use crate::core::timer::SamplePacer;

fn spawn(ring_frames: usize) -> (SpuBridge, MemorySink) {
    let sink = MemorySink::new();
    let bridge = SpuBridge::spawn(unmuted_spu(), Box::new(sink.clone()), ring_frames).unwrap();
    (bridge, sink)
}

#[test]
fn test_samples_are_synthesized_in_order() {
    let (mut bridge, sink) = spawn(16);
    let meter = bridge.meter();

    for _ in 0..3 {
        bridge.request(SpuRequest::Samples(10)).unwrap();
    }
    assert_eq!(meter.frames(), 30);
    assert_eq!(bridge.lock().frames(), 30);

    // One full ring has been handed over
    assert_eq!(sink.len(), 32);

    bridge.shutdown().unwrap();
    assert_eq!(sink.len(), 60);
}

#[test]
fn test_note_requests_reach_the_worker() {
    let (mut bridge, _sink) = spawn(64);
    {
        let mut spu = bridge.lock();
        upload(&mut spu, 0x1000, &looping_wave_block());
        setup_voice(&mut spu, 3, 0x1000);
    }
    let meter = bridge.meter();

    bridge.request(SpuRequest::NoteOn(3)).unwrap();
    assert_eq!(meter.channel_on(), 1 << 3);

    bridge.request(SpuRequest::Samples(8)).unwrap();
    assert_eq!(meter.envelope_volume(3).unwrap(), 1023);

    bridge.request(SpuRequest::NoteOff(3)).unwrap();
    assert_eq!(bridge.lock().voice_phase(3).unwrap(), EnvelopePhase::Release);

    bridge.request(SpuRequest::Samples(2)).unwrap();
    assert_eq!(meter.channel_on(), 0);
}

#[test]
fn test_set_offset_request() {
    let (mut bridge, sink) = spawn(1);
    {
        let mut spu = bridge.lock();
        upload(&mut spu, 0x1000, &block(4, 0x03, &WAVE_NIBBLES.repeat(7)));
        upload(&mut spu, 0x2000, &block(4, 0x03, &[2; 28]));
        setup_voice(&mut spu, 0, 0x1000);
    }

    bridge.request(SpuRequest::NoteOn(0)).unwrap();
    bridge
        .lock()
        .write_register(SPU_BASE + VOICE_LOOP_ADDRESS, (0x2000 / 8) as u16);
    bridge.request(SpuRequest::SetOffset(0)).unwrap();
    bridge.request(SpuRequest::Samples(29)).unwrap();

    let samples = sink.samples();
    assert_eq!(samples[2 * 28], unity(512));
}

#[test]
fn test_invalid_voice_request_is_acknowledged() {
    let (mut bridge, _sink) = spawn(16);

    bridge.request(SpuRequest::NoteOn(VOICE_COUNT)).unwrap();
    bridge.request(SpuRequest::Samples(1)).unwrap();

    assert_eq!(bridge.meter().frames(), 1);
}

#[test]
fn test_requests_after_shutdown_fail() {
    let (mut bridge, _sink) = spawn(16);
    assert!(bridge.is_running());

    bridge.shutdown().unwrap();
    assert!(!bridge.is_running());
    assert!(matches!(
        bridge.request(SpuRequest::Samples(1)),
        Err(EmulatorError::SpuDisconnected)
    ));

    // Idempotent
    bridge.shutdown().unwrap();
}

#[test]
fn test_sample_pacer() {
    let (mut bridge, _sink) = spawn(16);
    let meter = bridge.meter();

    bridge.synthesize(0).unwrap();
    assert_eq!(meter.frames(), 0);

    bridge.synthesize(5).unwrap();
    assert_eq!(meter.frames(), 5);
}

#[test]
fn test_drop_flushes_pending_ring() {
    let sink = MemorySink::new();
    {
        let mut bridge = SpuBridge::spawn(Spu::new(), Box::new(sink.clone()), 1024).unwrap();
        bridge.request(SpuRequest::Samples(7)).unwrap();
        assert!(sink.is_empty());
    }
    assert_eq!(sink.len(), 14);
}

#[test]
fn test_streaming_sink() {
    let (sink, stream) = sample_stream(8);
    let mut bridge = SpuBridge::spawn(unmuted_spu(), Box::new(sink), 4).unwrap();

    bridge.request(SpuRequest::Samples(8)).unwrap();
    assert_eq!(stream.pending(), 2);

    let block = stream.try_next_block().unwrap();
    assert_eq!(block.len(), 8);

    bridge.shutdown().unwrap();
    assert_eq!(stream.pending(), 1);
}
