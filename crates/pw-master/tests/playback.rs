//! Integration: build SMF bytes in code → parse → merge → render → verify.

use pw_formats::{parse_patches, FormatError};
use pw_ir::Patch;
use pw_master::{render_smf, samples_to_wav};

const SAMPLE_RATE: f32 = 44100.0;

/// Two patches: a sine voice with a 200 ms release tail, and a noise
/// patch for the drum channel.
const PATCH_BANK: &str = "
    A 0,0 0.01,1' 0.2,0 !
    W 0,0 !
    F0
    !
    !
    A 0,1' 0.05,0 !
    W 0,0.5 !
    F2
    !
    !
    !
";

fn patches() -> Vec<Patch> {
    parse_patches(PATCH_BANK).unwrap()
}

// --- SMF byte builders ---

fn vlq(mut value: u32) -> Vec<u8> {
    let mut bytes = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        bytes.insert(0, (value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    bytes
}

fn event(delta: u32, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vlq(delta);
    bytes.extend_from_slice(payload);
    bytes
}

fn note_on(delta: u32, channel: u8, note: u8) -> Vec<u8> {
    event(delta, &[0x90 | channel, note, 64])
}

fn note_off(delta: u32, channel: u8, note: u8) -> Vec<u8> {
    event(delta, &[0x80 | channel, note, 0])
}

fn tempo(delta: u32, micros: u32) -> Vec<u8> {
    event(
        delta,
        &[
            0xFF,
            0x51,
            0x03,
            (micros >> 16) as u8,
            (micros >> 8) as u8,
            micros as u8,
        ],
    )
}

fn end_of_track(delta: u32) -> Vec<u8> {
    event(delta, &[0xFF, 0x2F, 0x00])
}

fn track(events: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = events.concat();
    let mut bytes = b"MTrk".to_vec();
    bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&body);
    bytes
}

fn file(format: u16, division: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = b"MThd".to_vec();
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&format.to_be_bytes());
    bytes.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&division.to_be_bytes());
    for track in tracks {
        bytes.extend_from_slice(track);
    }
    bytes
}

/// Format-1 file at division 480: a conductor track and one note track.
fn two_track_file() -> Vec<u8> {
    let conductor = track(&[tempo(0, 500_000), end_of_track(960)]);
    let notes = track(&[
        note_on(0, 0, 69),
        note_off(480, 0, 69),
        end_of_track(480),
    ]);
    file(1, 480, &[conductor, notes])
}

// --- Rendering ---

#[test]
fn two_track_file_renders_expected_length() {
    let samples = render_smf(&two_track_file(), SAMPLE_RATE, &patches()).unwrap();
    // Two 500 ms gaps at 120 BPM
    assert_eq!(samples.len(), 44100);
}

#[test]
fn rendered_audio_is_not_silent() {
    let samples = render_smf(&two_track_file(), SAMPLE_RATE, &patches()).unwrap();
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    assert!(peak > 0.1, "peak {} too low", peak);
}

#[test]
fn output_stays_within_unit_range() {
    let samples = render_smf(&two_track_file(), SAMPLE_RATE, &patches()).unwrap();
    for (i, sample) in samples.iter().enumerate() {
        assert!(
            (-1.0..=1.0).contains(sample),
            "sample {} out of range: {}",
            i,
            sample
        );
    }
}

#[test]
fn release_tail_sounds_after_note_off() {
    let samples = render_smf(&two_track_file(), SAMPLE_RATE, &patches()).unwrap();
    // The second 22050-sample block lies after note-off; the 200 ms
    // release tail should still be audible at its start.
    let tail = &samples[22050..22050 + 4000];
    assert!(tail.iter().any(|s| s.abs() > 0.01));
    // Well past the release time everything is silent
    let silence = &samples[22050 + 10000..];
    assert!(silence.iter().all(|s| s.abs() < 1e-4));
}

#[test]
fn tempo_change_compresses_time() {
    let fast = track(&[
        tempo(0, 250_000),
        note_on(0, 0, 69),
        note_off(480, 0, 69),
        end_of_track(480),
    ]);
    let samples = render_smf(&file(0, 480, &[fast]), SAMPLE_RATE, &patches()).unwrap();
    // 250 ms per 480-tick gap at double speed
    assert_eq!(samples.len(), 22050);
}

#[test]
fn smpte_division_is_wall_clock() {
    // -25 fps, 40 ticks per frame: 1000 ticks = 1 second
    let notes = track(&[note_on(0, 0, 60), end_of_track(1000)]);
    let samples = render_smf(&file(0, 0xE728, &[notes]), SAMPLE_RATE, &patches()).unwrap();
    assert_eq!(samples.len(), 44100);
}

#[test]
fn drum_channel_uses_noise_patch() {
    let drums = track(&[note_on(0, 9, 40), end_of_track(480)]);
    let samples = render_smf(&file(0, 480, &[drums]), SAMPLE_RATE, &patches()).unwrap();
    assert!(samples.iter().any(|s| s.abs() > 0.01));
}

#[test]
fn noise_renders_identically_per_default_seed() {
    let drums = track(&[note_on(0, 9, 40), end_of_track(120)]);
    let bytes = file(0, 480, &[drums]);
    let first = render_smf(&bytes, SAMPLE_RATE, &patches()).unwrap();
    let second = render_smf(&bytes, SAMPLE_RATE, &patches()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn chord_mix_does_not_clip() {
    let chord = track(&[
        note_on(0, 0, 60),
        note_on(0, 0, 64),
        note_on(0, 0, 67),
        note_off(480, 0, 60),
        note_off(0, 0, 64),
        note_off(0, 0, 67),
        end_of_track(480),
    ]);
    let samples = render_smf(&file(0, 480, &[chord]), SAMPLE_RATE, &patches()).unwrap();
    assert!(samples.iter().all(|s| s.abs() <= 1.0));
}

#[test]
fn parse_errors_propagate() {
    let mut bytes = two_track_file();
    bytes[0] = b'X';
    assert_eq!(
        render_smf(&bytes, SAMPLE_RATE, &patches()),
        Err(FormatError::BadMagic)
    );
}

// --- WAV output ---

#[test]
fn render_encodes_to_wav() {
    let samples = render_smf(&two_track_file(), SAMPLE_RATE, &patches()).unwrap();
    let wav = samples_to_wav(&samples, SAMPLE_RATE as u32);
    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(wav.len(), 44 + samples.len() * 2);
}
