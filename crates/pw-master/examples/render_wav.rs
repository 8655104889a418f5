//! Renders a MIDI file through a patch bank into a WAV file.
//!
//! Usage:
//!   cargo run --example render_wav -- song.mid patches.txt output.wav

use std::{env, fs};

use pw_formats::parse_patches;
use pw_master::{render_smf, write_wav};

const SAMPLE_RATE: f32 = 44100.0;

fn main() {
    let args: Vec<String> = env::args().collect();
    let (midi_path, patch_path, wav_path) = match (args.get(1), args.get(2), args.get(3)) {
        (Some(m), Some(p), Some(w)) => (m, p, w),
        _ => {
            eprintln!("Usage: render_wav <song.mid> <patches.txt> <output.wav>");
            std::process::exit(1);
        }
    };

    let midi_bytes = fs::read(midi_path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", midi_path, e);
        std::process::exit(1);
    });
    let patch_text = fs::read_to_string(patch_path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", patch_path, e);
        std::process::exit(1);
    });

    let patches = parse_patches(&patch_text).unwrap_or_else(|e| {
        eprintln!("Failed to parse patches: {:?}", e);
        std::process::exit(1);
    });
    println!("Patches: {}", patches.len());

    let samples = render_smf(&midi_bytes, SAMPLE_RATE, &patches).unwrap_or_else(|e| {
        eprintln!("Failed to render MIDI: {:?}", e);
        std::process::exit(1);
    });
    println!(
        "Rendered {} samples ({:.1}s)",
        samples.len(),
        samples.len() as f64 / SAMPLE_RATE as f64
    );

    let file = fs::File::create(wav_path).unwrap_or_else(|e| {
        eprintln!("Failed to create {}: {}", wav_path, e);
        std::process::exit(1);
    });
    let mut writer = std::io::BufWriter::new(file);
    write_wav(&mut writer, &samples, SAMPLE_RATE as u32).unwrap_or_else(|e| {
        eprintln!("Failed to write WAV: {}", e);
        std::process::exit(1);
    });

    println!("Wrote {}", wav_path);
}
