//! SubRip (SRT) transcript parsing.
//!
//! An SRT transcript is a sequence of blocks: a numeric sequence line, a
//! `HH:MM:SS,mmm --> HH:MM:SS,mmm` time range, and one or more text lines.
//! The parser is line-oriented and tolerates missing sequence numbers and
//! multi-line text blocks.

mod sentence;

pub use sentence::{assemble_sentences, Sentence};

use serde::{Deserialize, Serialize};

/// A single subtitle line with its enclosing time range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Text of this subtitle line.
    pub text: String,
    /// Start of the enclosing time range (HH:MM:SS,mmm).
    pub start_time: String,
    /// End of the enclosing time range (HH:MM:SS,mmm).
    pub end_time: String,
}

/// Parse SRT transcript text into an ordered sequence of frames.
///
/// Rules, applied line by line after trimming: empty lines are skipped,
/// all-digit lines are sequence numbers and skipped, lines containing
/// `-->` update the current time range, anything else becomes a frame
/// with the current range. A malformed time range is skipped and the
/// last valid range is retained.
pub fn parse_srt(transcript_text: &str) -> Vec<Frame> {
    if transcript_text.is_empty() {
        return Vec::new();
    }

    let mut frames = Vec::new();
    let mut current_start = String::new();
    let mut current_end = String::new();

    for line in transcript_text.lines() {
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if is_digit_only(line) {
            continue;
        }

        if line.contains("-->") {
            let parts: Vec<&str> = line.split("-->").collect();
            if parts.len() == 2 {
                current_start = parts[0].trim().to_string();
                current_end = parts[1].trim().to_string();
            }
            continue;
        }

        frames.push(Frame {
            text: line.to_string(),
            start_time: current_start.clone(),
            end_time: current_end.clone(),
        });
    }

    frames
}

/// Strip SRT formatting (sequence numbers, time ranges, blank lines) and
/// return the subtitle text joined by single spaces.
pub fn clean_srt_text(transcript_text: &str) -> String {
    let cleaned: Vec<&str> = transcript_text
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .filter(|line| !is_digit_only(line))
        .filter(|line| !line.contains("-->"))
        .collect();

    cleaned
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True if the string is non-empty and contains only ASCII digits.
fn is_digit_only(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n\
00:00:00,000 --> 00:00:01,830\n\
I'm happy to\n\
have you here today.\n\
\n\
2\n\
00:00:01,910 --> 00:00:03,610\n\
As I'm sure you're all\n\
aware, there's going\n";

    #[test]
    fn test_empty_input() {
        assert!(parse_srt("").is_empty());
    }

    #[test]
    fn test_single_block() {
        let frames = parse_srt("1\n00:00:00,000 --> 00:00:01,000\nHello world.\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].text, "Hello world.");
        assert_eq!(frames[0].start_time, "00:00:00,000");
        assert_eq!(frames[0].end_time, "00:00:01,000");
    }

    #[test]
    fn test_multi_line_blocks() {
        let frames = parse_srt(SAMPLE);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0].text, "I'm happy to");
        assert_eq!(frames[0].start_time, "00:00:00,000");
        assert_eq!(frames[1].text, "have you here today.");
        assert_eq!(frames[1].start_time, "00:00:00,000");
        assert_eq!(frames[2].start_time, "00:00:01,910");
    }

    #[test]
    fn test_missing_sequence_numbers() {
        let frames = parse_srt("00:00:00,000 --> 00:00:01,000\nNo sequence line.\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].start_time, "00:00:00,000");
    }

    #[test]
    fn test_malformed_time_range_retains_last_valid() {
        let input = "1\n\
00:00:00,000 --> 00:00:01,000\n\
First.\n\
\n\
2\n\
00:00:02,000 --> 00:00:03,000 --> 00:00:04,000\n\
Second.\n";
        let frames = parse_srt(input);
        assert_eq!(frames.len(), 2);
        // The three-part range is skipped; the previous range carries over.
        assert_eq!(frames[1].start_time, "00:00:00,000");
    }

    #[test]
    fn test_round_trip_text() {
        let joined: Vec<String> = parse_srt(SAMPLE).into_iter().map(|f| f.text).collect();
        assert_eq!(joined.join(" "), clean_srt_text(SAMPLE));
    }

    #[test]
    fn test_clean_collapses_whitespace() {
        let cleaned = clean_srt_text("1\n00:00:00,000 --> 00:00:01,000\n  spaced   out  \n");
        assert_eq!(cleaned, "spaced out");
    }
}
