//! Event-driven block renderer.
//!
//! Walks a merged message timeline, keeps the map of sounding voices,
//! and hands each inter-event sample block to a caller-supplied sink.
//! Events take effect at the block boundary after the block they close,
//! not sample-accurately within it.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use pw_ir::{max_polyphony, status, MidiMessage, Patch, SmfHeader};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::voice::Voice;

/// Voice-map key: (channel, note number).
pub type VoiceKey = (u8, u8);

/// Sounding voices, ordered so mixing is deterministic.
pub type VoiceMap<'a> = BTreeMap<VoiceKey, Voice<'a>>;

/// Consumer of rendered sample blocks.
///
/// Invoked inline once per inter-event block, together with the voices
/// that sounded during it. The slice is reused for the next block, so
/// copy it out if it must be kept.
pub trait BlockSink {
    fn on_block(&mut self, samples: &[f32], voices: &VoiceMap<'_>);
}

/// Microseconds per quarter note at 120 BPM.
const DEFAULT_TEMPO: u32 = 500_000;

/// MIDI channel reserved for percussion, routed to the last patch.
const DRUM_CHANNEL: u8 = 9;

const A4_FREQUENCY: f32 = 440.0;
const A4_NOTE: f32 = 69.0;

/// Equal-temperament frequency of a MIDI note number, A4 = 440 Hz.
pub fn note_frequency(note: u8) -> f32 {
    A4_FREQUENCY * libm::exp2f((note as f32 - A4_NOTE) / 12.0)
}

/// Plays a merged timeline into a sink. The block buffer and the noise
/// PRNG live here, so one player can render several files back to back;
/// reseed with [`Player::with_seed`] for reproducible noise.
pub struct Player {
    sample_rate: f32,
    rng: ChaCha8Rng,
    buffer: Vec<f32>,
}

impl Player {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_seed(sample_rate, 0)
    }

    pub fn with_seed(sample_rate: f32, seed: u64) -> Self {
        Self {
            sample_rate,
            rng: ChaCha8Rng::seed_from_u64(seed),
            buffer: Vec::new(),
        }
    }

    /// Drive a merged message timeline through the voice engine.
    ///
    /// For every non-zero delta time, `⌊ms · sample_rate / 1000⌋` samples
    /// are rendered, mixed across all sounding voices, and pushed to the
    /// sink; dead voices are evicted after each block. Then the message
    /// itself is applied: tempo changes retune the clock, program
    /// changes re-route their channel, note on/off spawn and release
    /// voices. There is no final flush after the last message.
    pub fn play<'p>(
        &mut self,
        messages: &[MidiMessage],
        header: &SmfHeader,
        patches: &'p [Patch],
        sink: &mut dyn BlockSink,
    ) {
        let max_voices = max_polyphony(messages);
        let mut voices: VoiceMap<'p> = BTreeMap::new();
        let mut programs: BTreeMap<u8, u8> = BTreeMap::new();
        let mut usec_per_qnote = DEFAULT_TEMPO;

        for msg in messages {
            if msg.delta_time > 0 {
                let ms = header.milliseconds(msg.delta_time, usec_per_qnote);
                let count = (ms * self.sample_rate / 1000.0) as usize;
                self.buffer.clear();
                self.buffer.resize(count, 0.0);
                for voice in voices.values_mut() {
                    voice.render_into(&mut self.buffer, self.sample_rate, max_voices, &mut self.rng);
                }
                sink.on_block(&self.buffer, &voices);
                voices.retain(|_, voice| voice.is_alive());
            }

            match msg.kind() {
                status::TEMPO => {
                    if let Some(tempo) = msg.tempo_micros() {
                        usec_per_qnote = tempo;
                    }
                }
                status::PROGRAM => {
                    programs.insert(msg.channel(), msg.program());
                }
                status::NOTE_ON | status::NOTE_OFF => {
                    let key = (msg.channel(), msg.note());
                    if msg.is_note_on() {
                        // Duplicate key steals the sounding voice
                        if let Some(patch) = select_patch(patches, &programs, msg.channel()) {
                            voices.insert(key, Voice::new(patch, note_frequency(msg.note())));
                        }
                    } else if let Some(voice) = voices.get_mut(&key) {
                        // Note-off, or the velocity-0 note-on idiom.
                        // Eviction waits for the next rendered block.
                        voice.release();
                    }
                }
                _ => {}
            }
        }
    }
}

/// Channel 9 is percussion and always plays the last patch; any other
/// channel follows its program change, falling back to patch 0 when the
/// program is unset or out of range.
fn select_patch<'p>(
    patches: &'p [Patch],
    programs: &BTreeMap<u8, u8>,
    channel: u8,
) -> Option<&'p Patch> {
    if channel == DRUM_CHANNEL {
        return patches.last();
    }
    let index = programs.get(&channel).copied().unwrap_or(0) as usize;
    patches.get(index).or_else(|| patches.first())
}
