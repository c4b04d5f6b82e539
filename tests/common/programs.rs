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

//! Small guest programs

/// Store 0x1234 to 0x80020000, then idle
#[allow(dead_code)]
pub fn store_sentinel() -> Vec<u32> {
    vec![
        0x24081234, // ADDIU $t0, $zero, 0x1234
        0x3C098002, // LUI   $t1, 0x8002
        0xAD280000, // SW    $t0, 0($t1)
        0x1000FFFF, // BEQ   $zero, $zero, -1
        0x00000000, // NOP
    ]
}

/// Call the BIOS strlen on 0x80020000 and store the result at 0x80030000
#[allow(dead_code)]
pub fn strlen_call() -> Vec<u32> {
    vec![
        0x3C048002, // LUI   $a0, 0x8002
        0x2409001B, // ADDIU $t1, $zero, 0x1B   ; A0:1B strlen
        0x0C000028, // JAL   0xA0
        0x00000000, // NOP
        0x3C0A8003, // LUI   $t2, 0x8003
        0xAD420000, // SW    $v0, 0($t2)
        0x1000FFFF, // BEQ   $zero, $zero, -1
        0x00000000, // NOP
    ]
}

/// Key on voice 0 through the SPU register window, then idle
#[allow(dead_code)]
pub fn key_on_voice0() -> Vec<u32> {
    vec![
        0x3C081F80, // LUI   $t0, 0x1F80
        0x24090001, // ADDIU $t1, $zero, 1
        0xA5091D88, // SH    $t1, 0x1D88($t0)   ; KEY_ON_LOW
        0x1000FFFF, // BEQ   $zero, $zero, -1
        0x00000000, // NOP
    ]
}

/// Idle forever
#[allow(dead_code)]
pub fn idle() -> Vec<u32> {
    vec![
        0x1000FFFF, // BEQ   $zero, $zero, -1
        0x00000000, // NOP
    ]
}
