//! SubRip (.srt) parsing and formatting.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::Cue;

/// Timing line: `HH:MM:SS,mmm --> HH:MM:SS,mmm`.
fn timing_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{2}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2}):(\d{2}):(\d{2}),(\d{3})")
            .expect("SRT timing regex is valid")
    })
}

/// Parse the full text of an SRT file into an ordered cue sequence.
///
/// Blocks are separated by blank lines. A block needs at least three lines:
/// a sequence number (ignored; indices are reassigned 1-based from parse
/// order), the timing line, and one or more text lines joined with single
/// spaces. A block whose timing line does not match is skipped silently —
/// one bad block never aborts the parse.
///
/// Known limitation: a block whose text itself contains a blank line is
/// split at that blank line and truncated by the three-line minimum. This is
/// accepted behavior, not worth a stateful parser for subtitle input.
pub fn parse_srt(input: &str) -> Vec<Cue> {
    let normalized = input.replace("\r\n", "\n");
    let mut cues = Vec::new();

    for block in normalized.trim().split("\n\n") {
        let lines: Vec<&str> = block.split('\n').collect();
        if lines.len() < 3 {
            continue;
        }
        let Some(caps) = timing_line().captures(lines[1]) else {
            debug!("skipping subtitle block with malformed timing line: {:?}", lines[1]);
            continue;
        };

        let field = |i: usize| -> f64 { caps[i].parse::<u32>().unwrap_or(0) as f64 };
        let start_time = field(1) * 3600.0 + field(2) * 60.0 + field(3) + field(4) / 1000.0;
        let end_time = field(5) * 3600.0 + field(6) * 60.0 + field(7) + field(8) / 1000.0;
        let text = lines[2..].join(" ");

        cues.push(Cue::new(cues.len() as u32 + 1, start_time, end_time, text));
    }

    cues
}

/// Format a cue sequence as SRT text.
///
/// Cues are re-indexed 1-based in sequence order regardless of their stored
/// indices. Round-trips through [`parse_srt`] to the millisecond.
pub fn format_srt(cues: &[Cue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(cue.start_time, ','),
            format_timestamp(cue.end_time, ','),
            cue.text
        ));
    }
    out
}

/// Format seconds as `HH:MM:SS<sep>mmm`. SRT uses a comma separator, WebVTT
/// a dot.
pub(crate) fn format_timestamp(seconds: f64, sep: char) -> String {
    let total_millis = (seconds * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;
    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, secs, sep, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:04,000\nHello there\n\n2\n00:00:04,500 --> 00:00:08,000\nGeneral Kenobi";

    #[test]
    fn test_parse_two_blocks() {
        let cues = parse_srt(SAMPLE);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].index, 1);
        assert_eq!(cues[0].start_time, 1.0);
        assert_eq!(cues[0].end_time, 4.0);
        assert_eq!(cues[0].text, "Hello there");
        assert_eq!(cues[1].start_time, 4.5);
        assert_eq!(cues[1].end_time, 8.0);
        assert_eq!(cues[1].text, "General Kenobi");
    }

    #[test]
    fn test_parse_multiline_text_joined_with_spaces() {
        let input = "1\n00:00:01,000 --> 00:00:02,000\nfirst line\nsecond line";
        let cues = parse_srt(input);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "first line second line");
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let input = format!("\n\n  \n{}\n\n\n", SAMPLE.trim());
        // Leading blank lines leave an all-whitespace first block, which
        // fails the three-line minimum and is dropped.
        let cues = parse_srt(input.trim());
        assert_eq!(cues.len(), 2);
    }

    #[test]
    fn test_malformed_timing_block_skipped() {
        let input = "1\nnot a timing line\nText\n\n2\n00:00:04,500 --> 00:00:08,000\nKept";
        let cues = parse_srt(input);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Kept");
        // Index reassigned from parse order, not carried from the source.
        assert_eq!(cues[0].index, 1);
    }

    #[test]
    fn test_crlf_input() {
        let input = SAMPLE.replace('\n', "\r\n");
        assert_eq!(parse_srt(&input).len(), 2);
    }

    #[test]
    fn test_indices_reassigned_sequentially() {
        let input = "17\n00:00:01,000 --> 00:00:02,000\nA\n\n99\n00:00:03,000 --> 00:00:04,000\nB";
        let cues = parse_srt(input);
        assert_eq!(cues[0].index, 1);
        assert_eq!(cues[1].index, 2);
    }

    #[test]
    fn test_timestamp_formatting() {
        assert_eq!(format_timestamp(3661.0, ','), "01:01:01,000");
        assert_eq!(format_timestamp(1.5, ','), "00:00:01,500");
        assert_eq!(format_timestamp(0.0, ','), "00:00:00,000");
        assert_eq!(format_timestamp(4.5, '.'), "00:00:04.500");
    }

    #[test]
    fn test_round_trip_millisecond_precision() {
        let cues = vec![
            Cue::new(1, 0.001, 2.999, "Hello"),
            Cue::new(2, 3661.25, 3665.75, "World"),
        ];
        let reparsed = parse_srt(&format_srt(&cues));
        assert_eq!(reparsed.len(), 2);
        for (a, b) in cues.iter().zip(&reparsed) {
            assert!((a.start_time - b.start_time).abs() < 0.0005);
            assert!((a.end_time - b.end_time).abs() < 0.0005);
            assert_eq!(a.text, b.text);
        }
    }
}
