//! Patch definition text format.
//!
//! A bank is a nest of `!`-terminated lists, whitespace-insensitive and
//! tolerant of any punctuation as a separator:
//!
//! ```text
//! A 0,0 0.01,1' 0.3,0 !   amplitude envelope, ' marks the sustain pair
//! W 0,0.5 !               wave-parameter envelope
//! O 0,0 !                 pitch envelope (semitones)
//! V 5,0.3,0 !             vibrato: freq, depth, shape id, [offset, [dc]]
//! T 2,0.1,0 !             tremolo
//! F0                      waveshape id (0 sin/saw, 1 resonant, 2 noise)
//! !                       end of synth stage
//! !                       end of patch
//! !                       end of bank
//! ```

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use pw_ir::{Envelope, Lfo, LfoShape, Patch, SynthStage, WaveShape, MAX_STAGES};

use crate::FormatError;

/// Parse a whole patch bank.
pub fn parse_patches(text: &str) -> Result<Vec<Patch>, FormatError> {
    let mut scanner = Scanner::new(text);
    let mut patches = Vec::new();
    loop {
        match scanner.peek_char() {
            None | Some(b'!') => return Ok(patches),
            Some(c) if is_separator(c) => scanner.bump(),
            Some(_) => patches.push(patch(&mut scanner)?),
        }
    }
}

/// Serialise a patch bank back into the text grammar.
///
/// Parsing the output reproduces the input patches exactly (float
/// formatting round-trips).
pub fn write_patches(patches: &[Patch]) -> String {
    let mut out = String::new();
    for patch in patches {
        for stage in patch.stages() {
            write_envelope(&mut out, 'A', &stage.dca);
            write_envelope(&mut out, 'W', &stage.dcw);
            write_envelope(&mut out, 'O', &stage.dco);
            write_lfo(&mut out, 'V', &stage.vibrato);
            write_lfo(&mut out, 'T', &stage.tremolo);
            out.push_str(&format!("F{}\n", wave_shape_to_id(stage.shape)));
            out.push_str("!\n");
        }
        out.push_str("!\n");
    }
    out.push('!');
    out
}

fn patch(scanner: &mut Scanner) -> Result<Patch, FormatError> {
    let mut stages = Vec::new();
    loop {
        match scanner.peek_char() {
            None => return Err(FormatError::MalformedPatch("unterminated patch")),
            Some(b'!') => {
                scanner.bump();
                return Ok(Patch::new(stages));
            }
            Some(c) if is_separator(c) => scanner.bump(),
            Some(_) => stages.push(synth_stage(scanner)?),
        }
    }
}

fn synth_stage(scanner: &mut Scanner) -> Result<SynthStage, FormatError> {
    let mut stage = SynthStage::default();
    loop {
        let tag = scanner.next_char()?;
        match tag {
            b'!' => return Ok(stage),
            b'A' => stage.dca = envelope(scanner)?,
            b'W' => stage.dcw = envelope(scanner)?,
            b'O' => stage.dco = envelope(scanner)?,
            b'V' => stage.vibrato = lfo(scanner)?,
            b'T' => stage.tremolo = lfo(scanner)?,
            b'F' => stage.shape = wave_shape_from_id(scanner.number()? as i32)?,
            c if is_separator(c) => {}
            _ => return Err(FormatError::MalformedPatch("unknown synth field tag")),
        }
    }
}

/// `duration,amplitude` pairs; `'` after a pair marks it as the sustain
/// stage, `!` terminates.
fn envelope(scanner: &mut Scanner) -> Result<Envelope, FormatError> {
    let mut points: Vec<(f32, f32)> = Vec::new();
    let mut sustain = 0;
    loop {
        let duration = scanner.number()?;
        scanner.delimiter()?;
        let amplitude = scanner.number()?;
        points.push((duration, amplitude));
        if points.len() > MAX_STAGES {
            return Err(FormatError::MalformedPatch("too many envelope stages"));
        }

        let mut delim = scanner.delimiter()?;
        if delim == b'\'' {
            sustain = points.len() - 1;
            delim = scanner.delimiter()?;
        }
        if delim == b'!' {
            return Ok(Envelope::from_points(&points, sustain));
        }
    }
}

/// `frequency,depth[,shape_id[,offset[,dc]]]`, `!` terminates early.
/// Fields left unwritten keep the silent-LFO defaults (shape `Zero`).
fn lfo(scanner: &mut Scanner) -> Result<Lfo, FormatError> {
    let mut lfo = Lfo::silence();
    lfo.frequency = scanner.number()?;
    scanner.delimiter()?;
    lfo.depth = scanner.number()?;
    if scanner.delimiter()? == b'!' {
        return Ok(lfo);
    }
    lfo.shape = lfo_shape_from_id(scanner.number()? as i32)?;
    if scanner.delimiter()? == b'!' {
        return Ok(lfo);
    }
    lfo.offset = scanner.number()?;
    if scanner.delimiter()? == b'!' {
        return Ok(lfo);
    }
    lfo.dc = scanner.number()?;
    if !scanner.at_end() {
        scanner.delimiter()?;
    }
    Ok(lfo)
}

fn write_envelope(out: &mut String, tag: char, envelope: &Envelope) {
    out.push(tag);
    for (index, point) in envelope.points().iter().enumerate() {
        out.push_str(&format!(" {},{}", point.duration, point.amplitude));
        if index == envelope.sustain_index() {
            out.push('\'');
        }
    }
    out.push_str(" !\n");
}

fn write_lfo(out: &mut String, tag: char, lfo: &Lfo) {
    out.push(tag);
    out.push_str(&format!(
        " {},{},{},{},{} !\n",
        lfo.frequency,
        lfo.depth,
        lfo_shape_to_id(lfo.shape),
        lfo.offset,
        lfo.dc
    ));
}

fn lfo_shape_from_id(id: i32) -> Result<LfoShape, FormatError> {
    match id {
        0 => Ok(LfoShape::Sine),
        1 => Ok(LfoShape::SawUp),
        2 => Ok(LfoShape::SawDown),
        3 => Ok(LfoShape::Triangle),
        4 => Ok(LfoShape::Zero),
        _ => Err(FormatError::MalformedPatch("unknown LFO shape id")),
    }
}

fn lfo_shape_to_id(shape: LfoShape) -> u32 {
    match shape {
        LfoShape::Sine => 0,
        LfoShape::SawUp => 1,
        LfoShape::SawDown => 2,
        LfoShape::Triangle => 3,
        LfoShape::Zero => 4,
    }
}

fn wave_shape_from_id(id: i32) -> Result<WaveShape, FormatError> {
    match id {
        0 => Ok(WaveShape::SinSaw),
        1 => Ok(WaveShape::ResonantSaw),
        2 => Ok(WaveShape::Noise),
        _ => Err(FormatError::MalformedPatch("unknown waveshape id")),
    }
}

fn wave_shape_to_id(shape: WaveShape) -> u32 {
    match shape {
        WaveShape::SinSaw => 0,
        WaveShape::ResonantSaw => 1,
        WaveShape::Noise => 2,
    }
}

/// Anything that cannot start a number, a tag, a sustain marker, or a
/// terminator acts as a separator.
fn is_separator(c: u8) -> bool {
    !c.is_ascii_alphanumeric() && !matches!(c, b'!' | b'\'' | b'-' | b'+' | b'.')
}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn skip_whitespace(&mut self) {
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.bytes.len()
    }

    /// Next non-whitespace byte, without consuming it.
    fn peek_char(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn next_char(&mut self) -> Result<u8, FormatError> {
        self.peek_char()
            .inspect(|_| self.pos += 1)
            .ok_or(FormatError::MalformedPatch("unexpected end of input"))
    }

    /// True when the next token is a number.
    fn number_ready(&mut self) -> bool {
        matches!(self.peek_char(), Some(c) if c.is_ascii_digit() || c == b'-' || c == b'+' || c == b'.')
    }

    /// Consume one delimiter. A directly following number counts as an
    /// implicit delimiter and is left in place (returned as 0).
    fn delimiter(&mut self) -> Result<u8, FormatError> {
        if self.number_ready() {
            return Ok(0);
        }
        self.next_char()
    }

    fn number(&mut self) -> Result<f32, FormatError> {
        self.skip_whitespace();
        let start = self.pos;
        if matches!(self.bytes.get(self.pos), Some(b'-') | Some(b'+')) {
            self.pos += 1;
        }
        while matches!(self.bytes.get(self.pos), Some(b'0'..=b'9') | Some(b'.')) {
            self.pos += 1;
        }
        let text = core::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| FormatError::MalformedPatch("expected a number"))?;
        text.parse::<f32>()
            .map_err(|_| FormatError::MalformedPatch("expected a number"))
    }
}
