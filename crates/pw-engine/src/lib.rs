//! Playback engine for the polywave synthesizer.
//!
//! Steps voices through their patches one sample at a time and drives a
//! merged MIDI timeline, emitting one mixed mono block per inter-event
//! gap.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod player;
mod voice;

pub use player::{note_frequency, BlockSink, Player, VoiceKey, VoiceMap};
pub use voice::{Voice, VoiceState};
