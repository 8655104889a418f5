//! Merged-timeline construction and analysis over retained messages.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use crate::message::MidiMessage;

/// k-way merge of per-track delta timelines into one stream.
///
/// Each emitted message's `delta_time` is re-based to the previously
/// emitted message on the merged timeline. Simultaneous events keep
/// track order (ties break toward the lowest track index), so the merge
/// is deterministic.
pub fn merge_tracks(tracks: &[Vec<MidiMessage>]) -> Vec<MidiMessage> {
    let mut merged = Vec::with_capacity(tracks.iter().map(Vec::len).sum());
    let mut cursors: Vec<usize> = tracks.iter().map(|_| 0).collect();
    // Absolute tick of each track's current, not-yet-emitted message.
    let mut next_tick: Vec<u64> = tracks
        .iter()
        .map(|track| track.first().map_or(u64::MAX, |m| m.delta_time as u64))
        .collect();
    let mut last_tick: u64 = 0;

    loop {
        let mut source: Option<usize> = None;
        for (track_no, &cursor) in cursors.iter().enumerate() {
            if cursor < tracks[track_no].len()
                && source.map_or(true, |best| next_tick[track_no] < next_tick[best])
            {
                source = Some(track_no);
            }
        }
        let Some(track_no) = source else {
            return merged;
        };

        let message = &tracks[track_no][cursors[track_no]];
        let abs_tick = next_tick[track_no];
        merged.push(MidiMessage {
            delta_time: (abs_tick - last_tick) as u32,
            ..message.clone()
        });
        last_tick = abs_tick;

        cursors[track_no] += 1;
        if let Some(next) = tracks[track_no].get(cursors[track_no]) {
            next_tick[track_no] = abs_tick + next.delta_time as u64;
        }
    }
}

/// Greatest number of simultaneously sounding `(channel, note)` keys in
/// a merged stream, used to scale voice amplitudes against clipping.
///
/// Velocity-0 note-ons count as note-offs, the same convention the
/// player applies, and releasing an unknown key is ignored. Never less
/// than 1.
pub fn max_polyphony(messages: &[MidiMessage]) -> usize {
    let mut sounding: BTreeSet<(u8, u8)> = BTreeSet::new();
    let mut peak = 1;
    for msg in messages {
        if msg.is_note_on() {
            sounding.insert((msg.channel(), msg.note()));
        } else if msg.is_note_off() {
            sounding.remove(&(msg.channel(), msg.note()));
        }
        peak = peak.max(sounding.len());
    }
    peak
}
