#![no_std]

// Portable logic for the BLE camera shutter remote.
//
// Everything here compiles for both the nRF firmware and host tooling: no
// standard library, no HAL types, collaborators injected through traits.

pub mod bench;
pub mod codec;
pub mod progress;
pub mod sequencer;
pub mod shooting;
