//! Low-frequency modulation sources.

use core::f32::consts::{PI, TAU};

/// Modulation-rate waveform kernels, pure functions of phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoShape {
    Sine,
    SawUp,
    SawDown,
    Triangle,
    #[default]
    Zero,
}

impl LfoShape {
    /// Evaluate at a phase in radians.
    ///
    /// `Triangle` is only defined on `[0, 2π)`; [`Lfo::value`] normalises
    /// its argument into that range before calling here.
    pub fn eval(self, phase: f32) -> f32 {
        match self {
            LfoShape::Sine => libm::sinf(phase),
            LfoShape::SawUp => saw_up(phase),
            LfoShape::SawDown => -saw_up(phase),
            LfoShape::Triangle => {
                let p = phase / PI;
                p.min(2.0 - p) * 2.0 - 1.0
            }
            LfoShape::Zero => 0.0,
        }
    }
}

/// Rising sawtooth: -1 at phase 0, +1 just before 2π.
fn saw_up(phase: f32) -> f32 {
    libm::fmodf(phase / PI, 2.0) - 1.0
}

/// A modulation source: `dc + depth · shape(offset + phase · frequency)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Lfo {
    /// Cycles per unit phase (Hz when driven with 2π·seconds).
    pub frequency: f32,
    pub depth: f32,
    pub shape: LfoShape,
    /// Starting phase in radians.
    pub offset: f32,
    /// Constant bias added to the scaled waveform.
    pub dc: f32,
}

impl Lfo {
    /// The do-nothing modulator: zero depth, zero shape, zero bias.
    pub const fn silence() -> Self {
        Self {
            frequency: 0.0,
            depth: 0.0,
            shape: LfoShape::Zero,
            offset: 0.0,
            dc: 0.0,
        }
    }

    /// Evaluate at `phase` radians. The kernel argument is reduced into
    /// `[0, 2π)` so every shape sees its defined domain.
    pub fn value(&self, phase: f32) -> f32 {
        let arg = self.offset + phase * self.frequency;
        let mut wrapped = libm::fmodf(arg, TAU);
        if wrapped < 0.0 {
            wrapped += TAU;
        }
        self.dc + self.depth * self.shape.eval(wrapped)
    }
}
