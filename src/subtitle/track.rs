//! Time-indexed cue lookup for playback.

use super::{srt, Cue};

/// An immutable, time-indexed cue sequence for one loaded media item.
///
/// Lookup runs on every playback time-update event, so it must stay cheap:
/// a binary search over start times finds the candidate region, and a
/// prefix maximum of end times bounds the backward scan through overlapping
/// cues. With the first-match tie-break this returns exactly what a linear
/// first-match scan would, in O(log n + k) for overlap depth k.
#[derive(Debug, Clone)]
pub struct SubtitleTrack {
    cues: Vec<Cue>,
    /// `max_end[i]` = max end time over `cues[0..=i]`.
    max_end: Vec<f64>,
}

impl SubtitleTrack {
    /// Build a track from an already-parsed cue sequence. Cues are expected
    /// in non-decreasing start-time order, as the parser produces them.
    pub fn new(cues: Vec<Cue>) -> Self {
        let mut max_end = Vec::with_capacity(cues.len());
        let mut running = f64::NEG_INFINITY;
        for cue in &cues {
            running = running.max(cue.end_time);
            max_end.push(running);
        }
        Self { cues, max_end }
    }

    /// Parse SRT text straight into a track.
    pub fn parse(srt_text: &str) -> Self {
        Self::new(srt::parse_srt(srt_text))
    }

    /// The cue active at playback time `t`, if any.
    ///
    /// If multiple cues overlap `t` the first in sequence order wins, which
    /// well-formed files never exercise but keeps results deterministic.
    pub fn cue_at(&self, t: f64) -> Option<&Cue> {
        // First cue with start_time > t; everything at or before the
        // partition point could contain t.
        let p = self.cues.partition_point(|c| c.start_time <= t);
        let mut found: Option<usize> = None;
        for i in (0..p).rev() {
            if self.max_end[i] < t {
                // No cue at or before i reaches t.
                break;
            }
            if self.cues[i].contains(t) {
                found = Some(i);
            }
        }
        found.map(|i| &self.cues[i])
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Largest cue end time, or 0 for an empty track. Stands in for the
    /// media duration when none is supplied.
    pub fn total_duration(&self) -> f64 {
        self.max_end.last().copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(entries: &[(f64, f64, &str)]) -> SubtitleTrack {
        SubtitleTrack::new(
            entries.iter()
                .enumerate()
                .map(|(i, &(s, e, t))| Cue::new(i as u32 + 1, s, e, t))
                .collect(),
        )
    }

    /// Reference implementation: the linear first-match scan.
    fn linear_cue_at<'a>(cues: &'a [Cue], t: f64) -> Option<&'a Cue> {
        cues.iter().find(|c| c.contains(t))
    }

    #[test]
    fn test_basic_lookup() {
        let track = track(&[(0.0, 2.0, "Hello"), (2.5, 4.0, "World")]);
        assert_eq!(track.cue_at(1.0).unwrap().text, "Hello");
        assert!(track.cue_at(2.2).is_none());
        assert_eq!(track.cue_at(2.5).unwrap().text, "World");
    }

    #[test]
    fn test_inclusive_bounds() {
        let track = track(&[(1.0, 2.0, "only")]);
        assert!(track.cue_at(1.0).is_some());
        assert!(track.cue_at(2.0).is_some());
        assert!(track.cue_at(0.999).is_none());
        assert!(track.cue_at(2.001).is_none());
    }

    #[test]
    fn test_overlap_first_match_wins() {
        let track = track(&[(0.0, 10.0, "long"), (2.0, 4.0, "nested"), (5.0, 6.0, "late")]);
        assert_eq!(track.cue_at(3.0).unwrap().text, "long");
        assert_eq!(track.cue_at(5.5).unwrap().text, "long");
    }

    #[test]
    fn test_empty_track() {
        let track = SubtitleTrack::new(Vec::new());
        assert!(track.cue_at(0.0).is_none());
        assert_eq!(track.total_duration(), 0.0);
        assert!(track.is_empty());
    }

    #[test]
    fn test_matches_linear_scan() {
        let track = track(&[
            (0.0, 3.0, "a"),
            (1.0, 2.0, "b"),
            (2.5, 8.0, "c"),
            (4.0, 5.0, "d"),
            (9.0, 10.0, "e"),
        ]);
        let mut t = -1.0;
        while t < 11.0 {
            let expected = linear_cue_at(track.cues(), t).map(|c| c.index);
            let actual = track.cue_at(t).map(|c| c.index);
            assert_eq!(actual, expected, "diverged from linear scan at t={}", t);
            t += 0.125;
        }
    }

    #[test]
    fn test_total_duration() {
        let track = track(&[(0.0, 12.0, "a"), (3.0, 5.0, "b")]);
        assert_eq!(track.total_duration(), 12.0);
    }
}
