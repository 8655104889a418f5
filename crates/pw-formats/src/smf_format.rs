//! Standard MIDI File decoder.
//!
//! Parses the MThd header chunk and MTrk track chunks into retained
//! [`MidiMessage`] lists. Only note on/off, program change, tempo, and
//! end-of-track events are retained; every other event is still decoded
//! so the byte cursor stays honest, and its delta time folds into the
//! next retained message.

use alloc::vec::Vec;

use pw_ir::{status, MidiMessage, SmfHeader, SmpteRate, TimeUnit};

use crate::FormatError;

/// Required MThd chunk payload length.
const HEADER_LENGTH: u32 = 6;

/// Longest legal variable-length quantity (4 × 7 bits, 28-bit values).
const MAX_VARLEN_BYTES: usize = 4;

/// A parsed SMF: the header plus one retained-message list per track.
#[derive(Clone, Debug, PartialEq)]
pub struct SmfFile {
    pub header: SmfHeader,
    pub tracks: Vec<Vec<MidiMessage>>,
}

/// Parse a complete SMF byte stream: header chunk, then `ntrks` tracks.
pub fn load_smf(data: &[u8]) -> Result<SmfFile, FormatError> {
    let (header, mut consumed) = parse_header(data)?;
    let mut tracks = Vec::with_capacity(header.ntrks as usize);
    for _ in 0..header.ntrks {
        let (track, used) = parse_track(&data[consumed..])?;
        consumed += used;
        tracks.push(track);
    }
    Ok(SmfFile { header, tracks })
}

/// Parse an MThd chunk from the start of `data`.
///
/// Returns the header and the number of bytes consumed.
pub fn parse_header(data: &[u8]) -> Result<(SmfHeader, usize), FormatError> {
    let mut cursor = Cursor::new(data);
    if cursor.take(4)? != b"MThd" {
        return Err(FormatError::BadMagic);
    }
    if cursor.read_u32_be()? != HEADER_LENGTH {
        return Err(FormatError::BadHeaderLength);
    }
    let format = cursor.read_u16_be()?;
    let ntrks = cursor.read_u16_be()?;
    let division = cursor.read_u16_be()?;
    let (unit, ticks_per_unit) = decode_division(division)?;
    Ok((
        SmfHeader {
            format,
            ntrks,
            ticks_per_unit,
            unit,
        },
        cursor.pos,
    ))
}

/// Split the division field. The top bit selects SMPTE: a negative frame
/// rate in the high byte and sub-frame ticks in the low byte; otherwise
/// the whole field is ticks per quarter note.
fn decode_division(division: u16) -> Result<(TimeUnit, u16), FormatError> {
    if division & 0x8000 != 0 {
        // Two's-complement magnitude of the high byte
        let frame_tag = (((!division) >> 8) as u8 & 0x3F) + 1;
        let rate = SmpteRate::from_frame_tag(frame_tag).ok_or(FormatError::BadDivision)?;
        let ticks = division & 0x00FF;
        if ticks == 0 {
            return Err(FormatError::BadDivision);
        }
        Ok((TimeUnit::Smpte(rate), ticks))
    } else if division == 0 {
        Err(FormatError::BadDivision)
    } else {
        Ok((TimeUnit::QuarterNote, division))
    }
}

/// Parse one MTrk chunk from the start of `data`.
///
/// Returns the retained messages and the number of bytes consumed. The
/// last retained message is always end-of-track.
pub fn parse_track(data: &[u8]) -> Result<(Vec<MidiMessage>, usize), FormatError> {
    let mut cursor = Cursor::new(data);
    if cursor.take(4)? != b"MTrk" {
        return Err(FormatError::BadMagic);
    }
    let mut remaining = cursor.read_u32_be()? as i64;
    let mut track: Vec<MidiMessage> = Vec::new();
    let mut running_status: u16 = 0;
    let mut delta_time: u32 = 0;

    while remaining > 0 {
        let (delta, delta_len) = cursor.read_varlen()?;
        remaining -= delta_len as i64;
        delta_time += delta;

        let first = cursor.read_u8()?;
        remaining -= 1;

        if first == 0xFF {
            let subtype = cursor.read_u8()?;
            remaining -= 1;
            let (length, length_bytes) = cursor.read_varlen()?;
            remaining -= length_bytes as i64;
            let payload = cursor.take(length as usize)?;
            remaining -= length as i64;

            let meta = 0xFF00 | subtype as u16;
            if meta == status::END_OF_TRACK || meta == status::TEMPO {
                track.push(MidiMessage::new(delta_time, meta, payload));
                delta_time = 0;
            }
            if meta == status::END_OF_TRACK && remaining > 0 {
                return Err(FormatError::PrematureEndOfTrack);
            }
        } else {
            let mut payload = [0u8; 2];
            let mut have = 0usize;
            let status_word = if first & 0x80 != 0 {
                running_status = first as u16;
                first as u16
            } else {
                // Running status: the byte just read is already data.
                payload[0] = first;
                have = 1;
                running_status
            };
            let width = match status_word & 0xF0 {
                s if s == status::PROGRAM || s == status::CHANNEL_PRESSURE => 1,
                _ => 2,
            };
            while have < width {
                payload[have] = cursor.read_u8()?;
                have += 1;
                remaining -= 1;
            }
            let kind = status_word & 0xF0;
            if kind == status::NOTE_OFF || kind == status::NOTE_ON || kind == status::PROGRAM {
                track.push(MidiMessage::new(delta_time, status_word, &payload[..width]));
                delta_time = 0;
            }
        }
    }

    match track.last() {
        Some(last) if last.status == status::END_OF_TRACK => Ok((track, cursor.pos)),
        _ => Err(FormatError::MissingEndOfTrack),
    }
}

/// Bounds-checked reader over a byte slice.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_u8(&mut self) -> Result<u8, FormatError> {
        let byte = *self.data.get(self.pos).ok_or(FormatError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_u16_be(&mut self) -> Result<u16, FormatError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32_be(&mut self) -> Result<u32, FormatError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], FormatError> {
        let end = self.pos.checked_add(count).ok_or(FormatError::UnexpectedEof)?;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(FormatError::UnexpectedEof)?;
        self.pos = end;
        Ok(slice)
    }

    /// Read a variable-length quantity: 7-bit groups, MSB-first, the
    /// final byte has its high bit clear. Returns (value, bytes read).
    fn read_varlen(&mut self) -> Result<(u32, usize), FormatError> {
        let mut value: u32 = 0;
        for count in 1..=MAX_VARLEN_BYTES {
            let byte = self.read_u8()?;
            value = (value << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                return Ok((value, count));
            }
        }
        Err(FormatError::BadVarLen)
    }
}
