//! SMF header fields and tick-to-wall-clock conversion.

const USEC_TO_MSEC: f32 = 0.001;
const SEC_TO_MSEC: f32 = 1000.0;

/// How the header's division field subdivides time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    /// Ticks subdivide a quarter note; tempo meta events set its length.
    QuarterNote,
    /// Ticks subdivide an SMPTE frame; wall-clock, independent of tempo.
    Smpte(SmpteRate),
}

/// SMPTE frame rates representable in an SMF division field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmpteRate {
    Fps24,
    Fps25,
    /// Tagged 29 in the file; runs at 29.97 frames per second.
    DropFrame30,
    Fps30,
}

impl SmpteRate {
    /// Map the frame-rate magnitude stored in the division field.
    pub fn from_frame_tag(tag: u8) -> Option<Self> {
        match tag {
            24 => Some(SmpteRate::Fps24),
            25 => Some(SmpteRate::Fps25),
            29 => Some(SmpteRate::DropFrame30),
            30 => Some(SmpteRate::Fps30),
            _ => None,
        }
    }

    pub fn frames_per_second(self) -> f32 {
        match self {
            SmpteRate::Fps24 => 24.0,
            SmpteRate::Fps25 => 25.0,
            SmpteRate::DropFrame30 => 29.97,
            SmpteRate::Fps30 => 30.0,
        }
    }
}

/// The MThd chunk: file format, track count, and time division.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SmfHeader {
    /// SMF format: 0 (single track), 1 (parallel tracks), 2 (sequential).
    pub format: u16,
    /// Number of MTrk chunks that follow.
    pub ntrks: u16,
    /// Ticks per quarter note, or per SMPTE frame. Never zero.
    pub ticks_per_unit: u16,
    pub unit: TimeUnit,
}

impl SmfHeader {
    /// Convert a tick count to milliseconds under the current tempo.
    ///
    /// `usec_per_qnote` only matters for quarter-note divisions; SMPTE
    /// divisions are wall-clock and ignore it.
    pub fn milliseconds(&self, ticks: u32, usec_per_qnote: u32) -> f32 {
        let units = ticks as f32 / self.ticks_per_unit as f32;
        match self.unit {
            TimeUnit::QuarterNote => usec_per_qnote as f32 * units * USEC_TO_MSEC,
            TimeUnit::Smpte(rate) => units / rate.frames_per_second() * SEC_TO_MSEC,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qnote_header(ticks_per_unit: u16) -> SmfHeader {
        SmfHeader {
            format: 1,
            ntrks: 1,
            ticks_per_unit,
            unit: TimeUnit::QuarterNote,
        }
    }

    #[test]
    fn quarter_note_at_default_tempo() {
        // 480 ticks/qnote, 500000 µs/qnote: one quarter note = 500 ms
        let header = qnote_header(480);
        assert!((header.milliseconds(480, 500_000) - 500.0).abs() < 1e-3);
    }

    #[test]
    fn quarter_note_partial_tick_span() {
        // 240 ticks at division 480 and 120 BPM = 250 ms
        let header = qnote_header(480);
        assert!((header.milliseconds(240, 500_000) - 250.0).abs() < 1e-3);
    }

    #[test]
    fn quarter_note_respects_tempo() {
        // 1_000_000 µs/qnote = 60 BPM: a quarter note lasts a second
        let header = qnote_header(96);
        assert!((header.milliseconds(96, 1_000_000) - 1000.0).abs() < 1e-2);
    }

    #[test]
    fn smpte_ignores_tempo() {
        let header = SmfHeader {
            format: 0,
            ntrks: 1,
            ticks_per_unit: 40,
            unit: TimeUnit::Smpte(SmpteRate::Fps25),
        };
        // 1000 ticks = 25 frames = exactly one second
        let ms = header.milliseconds(1000, 500_000);
        assert_eq!(ms, 1000.0);
        assert_eq!(ms, header.milliseconds(1000, 120_000));
    }

    #[test]
    fn smpte_drop_frame_rate() {
        let header = SmfHeader {
            format: 0,
            ntrks: 1,
            ticks_per_unit: 4,
            unit: TimeUnit::Smpte(SmpteRate::DropFrame30),
        };
        // 4 ticks = one frame = 1000 / 29.97 ms
        let ms = header.milliseconds(4, 500_000);
        assert!((ms - 1000.0 / 29.97).abs() < 1e-3);
    }

    #[test]
    fn frame_tag_mapping() {
        assert_eq!(SmpteRate::from_frame_tag(24), Some(SmpteRate::Fps24));
        assert_eq!(SmpteRate::from_frame_tag(29), Some(SmpteRate::DropFrame30));
        assert_eq!(SmpteRate::from_frame_tag(28), None);
    }
}
