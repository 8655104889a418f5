//! Parse-merge-play glue over raw SMF bytes.

use log::{debug, info};
use pw_engine::{BlockSink, Player, VoiceMap};
use pw_formats::{load_smf, FormatError};
use pw_ir::{max_polyphony, merge_tracks, Patch};

/// Parse an SMF byte stream, merge its tracks, and play the merged
/// timeline into `sink` at `sample_rate`.
pub fn play_smf(
    bytes: &[u8],
    sample_rate: f32,
    patches: &[Patch],
    sink: &mut dyn BlockSink,
) -> Result<(), FormatError> {
    let smf = load_smf(bytes)?;
    let merged = merge_tracks(&smf.tracks);
    info!(
        "playing {} track(s), {} merged events, max polyphony {}",
        smf.tracks.len(),
        merged.len(),
        max_polyphony(&merged)
    );

    let mut player = Player::new(sample_rate);
    player.play(&merged, &smf.header, patches, sink);
    Ok(())
}

/// Render an SMF byte stream into a single mono sample vector.
pub fn render_smf(
    bytes: &[u8],
    sample_rate: f32,
    patches: &[Patch],
) -> Result<Vec<f32>, FormatError> {
    let mut sink = Collect { samples: Vec::new() };
    play_smf(bytes, sample_rate, patches, &mut sink)?;
    debug!(
        "rendered {} samples ({:.2}s)",
        sink.samples.len(),
        sink.samples.len() as f32 / sample_rate
    );
    Ok(sink.samples)
}

/// Sink that concatenates every block.
struct Collect {
    samples: Vec<f32>,
}

impl BlockSink for Collect {
    fn on_block(&mut self, samples: &[f32], _voices: &VoiceMap<'_>) {
        self.samples.extend_from_slice(samples);
    }
}
