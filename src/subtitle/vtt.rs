//! WebVTT (.vtt) export.

use super::srt::format_timestamp;
use super::Cue;

/// Format a cue sequence as WebVTT text: the literal `WEBVTT` header, a
/// blank line, then 1-based re-indexed cue blocks with dot-decimal
/// millisecond timing.
pub fn format_vtt(cues: &[Cue]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(cue.start_time, '.'),
            format_timestamp(cue.end_time, '.'),
            cue.text
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_timing() {
        let cues = vec![Cue::new(1, 1.0, 4.0, "Hello there")];
        let vtt = format_vtt(&cues);
        assert!(vtt.starts_with("WEBVTT\n\n"));
        assert!(vtt.contains("00:00:01.000 --> 00:00:04.000"));
        assert!(vtt.contains("Hello there"));
    }

    #[test]
    fn test_reindexes_from_one() {
        let cues = vec![Cue::new(42, 0.0, 1.0, "A"), Cue::new(7, 2.0, 3.0, "B")];
        let vtt = format_vtt(&cues);
        assert!(vtt.contains("1\n00:00:00.000"));
        assert!(vtt.contains("2\n00:00:02.000"));
    }

    #[test]
    fn test_millisecond_precision() {
        let cues = vec![Cue::new(1, 4.5, 8.125, "x")];
        let vtt = format_vtt(&cues);
        assert!(vtt.contains("00:00:04.500 --> 00:00:08.125"));
    }
}
