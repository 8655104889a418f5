//! Format readers for the polywave synthesizer.
//!
//! Parses Standard MIDI Files and patch definition text into the IR.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod patch_format;
mod smf_format;

pub use patch_format::{parse_patches, write_patches};
pub use smf_format::{load_smf, parse_header, parse_track, SmfFile};

/// Error type for format parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatError {
    /// A chunk tag was not the expected magic bytes
    BadMagic,
    /// MThd chunk length was not 6
    BadHeaderLength,
    /// Unusable division field (zero ticks, or an unknown SMPTE rate)
    BadDivision,
    /// A variable-length quantity ran past 4 bytes
    BadVarLen,
    /// Input ended mid-chunk or mid-event
    UnexpectedEof,
    /// Track data ended without an end-of-track meta event
    MissingEndOfTrack,
    /// End-of-track arrived with track bytes still remaining
    PrematureEndOfTrack,
    /// Patch text did not match the grammar
    MalformedPatch(&'static str),
}
