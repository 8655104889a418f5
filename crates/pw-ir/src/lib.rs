//! Core IR types for the polywave synthesizer.
//!
//! This crate defines the intermediate representation shared by the rest
//! of the workspace: the SMF header and retained MIDI messages on the
//! parsing side, and the envelope / LFO / synth-stage / patch types on
//! the synthesis side. Format parsers emit IR, and the playback engine
//! consumes IR.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod envelope;
mod header;
mod lfo;
mod message;
mod patch;
mod synth;
mod timeline;

pub use envelope::{Breakpoint, Envelope, MAX_STAGES};
pub use header::{SmfHeader, SmpteRate, TimeUnit};
pub use lfo::{Lfo, LfoShape};
pub use message::{status, MidiMessage, MAX_DATA};
pub use patch::Patch;
pub use synth::{SynthStage, WaveShape};
pub use timeline::{max_polyphony, merge_tracks};
