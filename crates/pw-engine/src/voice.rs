//! A sounding voice: per-note state stepped through a patch's stages.

use core::f32::consts::TAU;

use pw_ir::Patch;
use rand_chacha::ChaCha8Rng;

/// Mutable synthesis state of one voice.
#[derive(Clone, Copy, Debug)]
pub struct VoiceState {
    /// Position in the patch's phase domain `[0, 2π·stages)`.
    pub phase: f32,
    /// Previous output sample; feeds the noise shape and the mixer.
    pub previous: f32,
    /// Wall-clock seconds since note start, drives the LFOs.
    pub time: f32,
    /// Seconds since the last active/release transition.
    pub elapsed: f32,
    /// Key still held.
    pub active: bool,
}

impl Default for VoiceState {
    fn default() -> Self {
        Self {
            phase: 0.0,
            previous: 0.0,
            time: 0.0,
            elapsed: 0.0,
            active: true,
        }
    }
}

/// One sounding note. Borrows its patch for the play session; the patch
/// bank must outlive every voice spawned from it.
#[derive(Clone, Debug)]
pub struct Voice<'a> {
    patch: &'a Patch,
    frequency: f32,
    alive: bool,
    state: VoiceState,
}

impl<'a> Voice<'a> {
    pub fn new(patch: &'a Patch, frequency: f32) -> Self {
        Self {
            patch,
            frequency,
            alive: true,
            state: VoiceState::default(),
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn state(&self) -> &VoiceState {
        &self.state
    }

    /// Whether the voice still produces audible output. Updated by
    /// [`Voice::render_into`]; dead voices are evicted by the player.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Key up: switch the envelopes onto their release segment.
    pub fn release(&mut self) {
        self.state.active = false;
        self.state.elapsed = 0.0;
    }

    /// Advance by one sample. The new sample lands in `state.previous`;
    /// returns the selected stage's aliveness at the advanced time.
    fn step(&mut self, sample_rate: f32, rng: &mut ChaCha8Rng) -> bool {
        let (index, sub_phase) = self.patch.locate(self.state.phase);
        let stage = &self.patch.stages()[index];

        let amplitude = stage.amplitude(self.state.time, self.state.elapsed, self.state.active);
        let param = stage.wave_param(self.state.elapsed, self.state.active);
        let delta_semi = stage.pitch_delta(self.state.time, self.state.elapsed, self.state.active);
        let sample = stage.shape.eval(sub_phase, param, self.state.previous, rng) * amplitude;

        let effective = self.frequency * libm::exp2f(delta_semi / 12.0);
        let dt = 1.0 / sample_rate;
        self.state.phase = libm::fmodf(
            self.state.phase + TAU * effective * dt,
            self.patch.phase_period(),
        );
        self.state.time += dt;
        self.state.elapsed += dt;
        self.state.previous = sample;

        stage.is_alive(self.state.elapsed, self.state.active)
    }

    /// Mix this voice into `buffer`, scaled by `1 / max_voices` so a full
    /// chord cannot clip.
    pub fn render_into(
        &mut self,
        buffer: &mut [f32],
        sample_rate: f32,
        max_voices: usize,
        rng: &mut ChaCha8Rng,
    ) {
        let scale = 1.0 / max_voices as f32;
        for slot in buffer.iter_mut() {
            self.alive = self.step(sample_rate, rng);
            *slot += self.state.previous * scale;
        }
    }
}
