//! Segment consolidation — turns raw, overlapping candidates into a clean,
//! ordered, non-overlapping segment list.
//!
//! Three sequential stages, each independently testable:
//!
//! 1. `validate` — drop too-short segments and edge artifacts.
//! 2. `group_by_proximity` — discard isolated blips whose group carries
//!    too little total voice, tolerating short gaps inside real bursts.
//! 3. `merge_close` — fuse segments separated by sub-threshold silence.
//!
//! Grouping works on absolute timestamps, never on window indices: the
//! overlap scheme routinely places logically-adjacent speech into
//! different windows, and only time-based proximity survives that.

use super::{DetectorConfig, VoiceSegment};

/// Stage 1: validation.
///
/// Drops segments shorter than the minimum duration and segments touching
/// the recording edges (within `edge_margin`), which are usually decoder
/// warm-up clicks or trailing artifacts rather than speech.
pub fn validate(
    segments: Vec<VoiceSegment>,
    audio_duration: f64,
    config: &DetectorConfig,
) -> Vec<VoiceSegment> {
    segments
        .into_iter()
        .filter(|seg| seg.duration >= config.min_segment_duration)
        .filter(|seg| {
            seg.start > config.edge_margin && seg.end < audio_duration - config.edge_margin
        })
        .collect()
}

/// Stage 2: proximity grouping.
///
/// Sorts by start time and walks the list accumulating groups: a segment
/// joins the current group when its start is within `proximity_gap` of the
/// previous segment's end. Groups whose summed duration falls below half
/// of `min_total_voice_duration` are discarded wholesale — isolated,
/// low-confidence blips — while segments of surviving groups pass through
/// unchanged. A single surviving segment bypasses the group filter; the
/// final acceptance floor in the report builder still applies to it.
pub fn group_by_proximity(
    mut segments: Vec<VoiceSegment>,
    config: &DetectorConfig,
) -> Vec<VoiceSegment> {
    if segments.len() <= 1 {
        return segments;
    }

    segments.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut groups: Vec<Vec<VoiceSegment>> = Vec::new();
    let mut current: Vec<VoiceSegment> = vec![segments[0]];

    for seg in segments.into_iter().skip(1) {
        let last = current[current.len() - 1];
        if seg.start - last.end <= config.proximity_gap {
            current.push(seg);
        } else {
            groups.push(std::mem::replace(&mut current, vec![seg]));
        }
    }
    groups.push(current);

    let min_group_duration = config.min_total_voice_duration * 0.5;
    groups
        .into_iter()
        .filter(|group| group.iter().map(|seg| seg.duration).sum::<f64>() >= min_group_duration)
        .flatten()
        .collect()
}

/// Stage 3: merge-close.
///
/// Sorts by start time and scans left to right, merging a segment into the
/// previous output segment when the gap between them is at most
/// `min_silence_duration`; the previous segment's end extends to the later
/// of the two ends. The result is sorted and non-overlapping.
pub fn merge_close(mut segments: Vec<VoiceSegment>, config: &DetectorConfig) -> Vec<VoiceSegment> {
    if segments.is_empty() {
        return segments;
    }

    segments.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<VoiceSegment> = Vec::with_capacity(segments.len());
    merged.push(segments[0]);

    for seg in segments.into_iter().skip(1) {
        let last_idx = merged.len() - 1;
        let last = &mut merged[last_idx];
        let gap = seg.start - last.end;
        if gap <= config.min_silence_duration {
            last.end = last.end.max(seg.end);
            last.duration = last.end - last.start;
        } else {
            merged.push(seg);
        }
    }

    merged
}
