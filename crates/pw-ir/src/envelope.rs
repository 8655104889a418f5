//! Piecewise-linear envelopes with a sustain stage and derived release.
//!
//! Envelopes are stateless: the current stage is derived from elapsed
//! time on every call, so one envelope can be shared by any number of
//! voices.

use arrayvec::ArrayVec;

/// Maximum breakpoints per envelope, enforced by the patch reader.
pub const MAX_STAGES: usize = 16;

/// A breakpoint: seconds from the previous point, and the value there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Breakpoint {
    pub duration: f32,
    pub amplitude: f32,
}

/// An ordered breakpoint sequence. While a note is active, the walk is
/// pinned at the sustain stage; on release it continues from there and
/// dies out after the summed post-sustain durations.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    points: ArrayVec<Breakpoint, MAX_STAGES>,
    sustain: usize,
    release_time: f32,
}

impl Envelope {
    /// Build from `(duration, amplitude)` pairs and a sustain index.
    ///
    /// An empty slice yields the constant-1 envelope; the sustain index
    /// is clamped into range. At most [`MAX_STAGES`] pairs are kept.
    pub fn from_points(points: &[(f32, f32)], sustain: usize) -> Self {
        let mut stages: ArrayVec<Breakpoint, MAX_STAGES> = ArrayVec::new();
        for &(duration, amplitude) in points.iter().take(MAX_STAGES) {
            stages.push(Breakpoint {
                duration,
                amplitude,
            });
        }
        if stages.is_empty() {
            stages.push(Breakpoint {
                duration: 0.0,
                amplitude: 1.0,
            });
        }
        let sustain = sustain.min(stages.len() - 1);
        let release_time = stages[sustain + 1..].iter().map(|p| p.duration).sum();
        Self {
            points: stages,
            sustain,
            release_time,
        }
    }

    /// A single-point envelope that always reports `value`.
    pub fn constant(value: f32) -> Self {
        Self::from_points(&[(0.0, value)], 0)
    }

    pub fn points(&self) -> &[Breakpoint] {
        &self.points
    }

    pub fn sustain_index(&self) -> usize {
        self.sustain
    }

    /// Total duration of the stages after the sustain stage.
    pub fn release_time(&self) -> f32 {
        self.release_time
    }

    /// Amplitude at `elapsed` seconds into the active span (key down) or
    /// the release span (key up).
    pub fn amplitude(&self, mut elapsed: f32, active: bool) -> f32 {
        if self.points.len() == 1 {
            return self.points[0].amplitude;
        }
        let mut stage = if active { 0 } else { self.sustain };
        let last = if active {
            self.sustain + 1
        } else {
            self.points.len()
        };
        while stage + 1 < last && elapsed >= self.points[stage + 1].duration {
            stage += 1;
            elapsed -= self.points[stage].duration;
        }
        if active && stage == self.sustain {
            return self.points[stage].amplitude;
        }
        if stage + 1 == last {
            return 0.0;
        }
        let pre = self.points[stage].amplitude;
        let post = self.points[stage + 1].amplitude;
        let interval = self.points[stage + 1].duration;
        pre + (post - pre) * (elapsed / interval)
    }

    /// Whether a voice driven by this envelope can still be heard.
    pub fn is_alive(&self, elapsed: f32, active: bool) -> bool {
        active || elapsed < self.release_time
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::constant(1.0)
    }
}
