//! A single voice stage: three envelopes, two LFOs, and a waveshape.

use core::f32::consts::TAU;

use rand::Rng;

use crate::envelope::Envelope;
use crate::lfo::{Lfo, LfoShape};

/// Audio-rate waveshape selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveShape {
    /// Crossfade between a sine and a rising saw; the wave parameter is
    /// the saw fraction.
    SinSaw,
    /// Sine whose frequency is scaled by the wave parameter, damped over
    /// each period. Parameter 1 is a plain decaying sine per cycle.
    ResonantSaw,
    /// One-pole low-passed uniform noise; the wave parameter is the
    /// filter coefficient (1 = white, → 0 = darker).
    Noise,
}

impl WaveShape {
    /// Evaluate at `phase` ∈ `[0, 2π)` with wave parameter `param` and
    /// the voice's previous output sample. Noise draws from `rng`.
    pub fn eval<R: Rng>(self, phase: f32, param: f32, previous: f32, rng: &mut R) -> f32 {
        match self {
            WaveShape::SinSaw => {
                let sine = LfoShape::Sine.eval(phase);
                let saw = LfoShape::SawUp.eval(phase);
                sine + (saw - sine) * param
            }
            WaveShape::ResonantSaw => {
                let sine = libm::sinf(phase * param);
                sine * (1.0 - libm::fmodf(phase / TAU, 1.0))
            }
            WaveShape::Noise => {
                let next: f32 = rng.gen();
                previous + (next - previous) * param
            }
        }
    }
}

/// One stage of a patch: amplitude, wave-parameter, and pitch envelopes
/// (dca / dcw / dco), pitch and amplitude LFOs, and the waveshape that
/// turns the lot into samples.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthStage {
    /// Amplitude envelope; also decides when the voice is dead.
    pub dca: Envelope,
    /// Wave-parameter envelope.
    pub dcw: Envelope,
    /// Pitch-delta envelope, in semitones.
    pub dco: Envelope,
    /// Modulates pitch, added to the dco output.
    pub vibrato: Lfo,
    /// Modulates amplitude around 1.
    pub tremolo: Lfo,
    pub shape: WaveShape,
}

impl SynthStage {
    /// Pitch offset in semitones at wall-clock `time` seconds.
    pub fn pitch_delta(&self, time: f32, elapsed: f32, active: bool) -> f32 {
        self.dco.amplitude(elapsed, active) + self.vibrato.value(time * TAU)
    }

    /// Amplitude, tremolo applied multiplicatively around unity.
    pub fn amplitude(&self, time: f32, elapsed: f32, active: bool) -> f32 {
        self.dca.amplitude(elapsed, active) * (1.0 + self.tremolo.value(time * TAU))
    }

    pub fn wave_param(&self, elapsed: f32, active: bool) -> f32 {
        self.dcw.amplitude(elapsed, active)
    }

    /// A stage is heard for as long as its amplitude envelope lives.
    pub fn is_alive(&self, elapsed: f32, active: bool) -> bool {
        self.dca.is_alive(elapsed, active)
    }
}

impl Default for SynthStage {
    fn default() -> Self {
        Self {
            dca: Envelope::constant(1.0),
            dcw: Envelope::constant(0.0),
            dco: Envelope::constant(0.0),
            vibrato: Lfo::silence(),
            tremolo: Lfo::silence(),
            shape: WaveShape::ResonantSaw,
        }
    }
}
