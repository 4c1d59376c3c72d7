//! Sentence assembly from subtitle frames.
//!
//! Frames are merged in order until the accumulated text ends in `.`, `!`
//! or `?`; the sentence is anchored to the start time of its first frame.
//! Sentences whose token count exceeds the model window are split greedily
//! on word boundaries so that every sentence fits.

use super::Frame;
use crate::embedding::TokenCounter;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A complete sentence reconstructed from one or more frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// Sentence text (frame texts joined by single spaces).
    pub text: String,
    /// Start time of the first contributing frame (HH:MM:SS,mmm).
    pub start_time: String,
    /// Token count of `text` as the model sees it.
    pub token_count: usize,
    /// Embedding vector, filled lazily by the embedder.
    pub embedding: Option<Vec<f32>>,
}

/// Merge frames into sentences and split any sentence whose token count
/// exceeds `max_size`. Every returned sentence satisfies
/// `token_count <= max_size` (modulo a single word that alone exceeds the
/// window, which is emitted as its own sentence rather than looping).
pub fn assemble_sentences(
    frames: &[Frame],
    counter: &dyn TokenCounter,
    max_size: usize,
) -> Vec<Sentence> {
    let mut sentences = Vec::new();

    for sentence in merge_frames(frames, counter) {
        if sentence.token_count > max_size {
            sentences.extend(split_oversize(sentence, counter, max_size));
        } else {
            sentences.push(sentence);
        }
    }

    sentences
}

/// Walk the frames in order, emitting a sentence at every `.`/`!`/`?`
/// boundary. Remaining text after the last frame becomes a final sentence.
fn merge_frames(frames: &[Frame], counter: &dyn TokenCounter) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut start_time = String::new();

    for frame in frames {
        if current.is_empty() {
            start_time = frame.start_time.clone();
        } else {
            current.push(' ');
        }
        current.push_str(&frame.text);

        let trimmed = frame.text.trim();
        if trimmed.ends_with('.') || trimmed.ends_with('!') || trimmed.ends_with('?') {
            sentences.push(finish_sentence(
                std::mem::take(&mut current),
                start_time.clone(),
                counter,
            ));
        }
    }

    if !current.is_empty() {
        sentences.push(finish_sentence(current, start_time, counter));
    }

    sentences
}

fn finish_sentence(text: String, start_time: String, counter: &dyn TokenCounter) -> Sentence {
    let token_count = count_or_zero(counter, &text);
    Sentence {
        text,
        start_time,
        token_count,
        embedding: None,
    }
}

/// Greedily slice an oversize sentence into word-boundary sub-sentences,
/// each inheriting the parent's start time. The growth check runs the
/// tokenizer on the candidate text; word counts are not a usable proxy
/// for subword token counts.
fn split_oversize(sentence: Sentence, counter: &dyn TokenCounter, max_size: usize) -> Vec<Sentence> {
    let start_time = sentence.start_time;
    let mut subs = Vec::new();
    let mut current = String::new();
    let mut current_count = 0usize;

    for word in sentence.text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        let candidate_count = count_or_zero(counter, &candidate);

        if current.is_empty() || candidate_count <= max_size {
            current = candidate;
            current_count = candidate_count;
        } else {
            subs.push(Sentence {
                text: current,
                start_time: start_time.clone(),
                token_count: current_count,
                embedding: None,
            });
            current = word.to_string();
            current_count = count_or_zero(counter, &current);
        }
    }

    if !current.is_empty() {
        subs.push(Sentence {
            text: current,
            start_time,
            token_count: current_count,
            embedding: None,
        });
    }

    subs
}

fn count_or_zero(counter: &dyn TokenCounter, text: &str) -> usize {
    match counter.count(text) {
        Ok(count) => count,
        Err(e) => {
            warn!("Token count failed, treating as 0: {}", e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    /// One token per whitespace-separated word.
    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count(&self, text: &str) -> Result<usize> {
            Ok(text.split_whitespace().count())
        }
    }

    fn frame(text: &str, start: &str, end: &str) -> Frame {
        Frame {
            text: text.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }

    #[test]
    fn test_no_frames() {
        let sentences = assemble_sentences(&[], &WordCounter, 512);
        assert!(sentences.is_empty());
    }

    #[test]
    fn test_single_frame_sentence() {
        let frames = [frame("Hello world.", "00:00:00,000", "00:00:01,000")];
        let sentences = assemble_sentences(&frames, &WordCounter, 512);

        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].text, "Hello world.");
        assert_eq!(sentences[0].start_time, "00:00:00,000");
        assert_eq!(sentences[0].token_count, 2);
        assert!(sentences[0].embedding.is_none());
    }

    #[test]
    fn test_sentence_spans_frames() {
        let frames = [
            frame("I'm happy to", "00:00:00,000", "00:00:01,830"),
            frame("have you here today.", "00:00:01,910", "00:00:03,610"),
        ];
        let sentences = assemble_sentences(&frames, &WordCounter, 512);

        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].text, "I'm happy to have you here today.");
        // Anchored to the first contributing frame, not the last.
        assert_eq!(sentences[0].start_time, "00:00:00,000");
    }

    #[test]
    fn test_multiple_sentences_and_anchors() {
        let frames = [
            frame("First sentence.", "00:00:00,000", "00:00:01,000"),
            frame("Second one starts", "00:00:01,000", "00:00:02,000"),
            frame("and ends here!", "00:00:02,000", "00:00:03,000"),
            frame("Third?", "00:00:03,000", "00:00:04,000"),
        ];
        let sentences = assemble_sentences(&frames, &WordCounter, 512);

        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[0].start_time, "00:00:00,000");
        assert_eq!(sentences[1].text, "Second one starts and ends here!");
        assert_eq!(sentences[1].start_time, "00:00:01,000");
        assert_eq!(sentences[2].start_time, "00:00:03,000");
    }

    #[test]
    fn test_trailing_text_becomes_sentence() {
        let frames = [
            frame("Done.", "00:00:00,000", "00:00:01,000"),
            frame("no terminal punctuation", "00:00:01,000", "00:00:02,000"),
        ];
        let sentences = assemble_sentences(&frames, &WordCounter, 512);

        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[1].text, "no terminal punctuation");
        assert_eq!(sentences[1].start_time, "00:00:01,000");
    }

    #[test]
    fn test_oversize_split() {
        let words: Vec<String> = (0..2000).map(|_| "tok".to_string()).collect();
        let text = format!("{}.", words.join(" "));
        let frames = [frame(&text, "00:01:00,000", "00:01:30,000")];

        let sentences = assemble_sentences(&frames, &WordCounter, 512);

        assert_eq!(sentences.len(), 4);
        for s in &sentences {
            assert!(s.token_count <= 512);
            assert_eq!(s.start_time, "00:01:00,000");
        }
        let rejoined: Vec<&str> = sentences.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(rejoined.join(" "), text);
    }

    #[test]
    fn test_split_keeps_word_over_limit() {
        struct CharCounter;
        impl TokenCounter for CharCounter {
            fn count(&self, text: &str) -> Result<usize> {
                Ok(text.chars().count())
            }
        }

        let frames = [frame(
            "tiny incomprehensibilities end.",
            "00:00:00,000",
            "00:00:01,000",
        )];
        let sentences = assemble_sentences(&frames, &CharCounter, 10);

        // The long word cannot fit but is still emitted as its own sentence.
        assert!(sentences.iter().any(|s| s.text == "incomprehensibilities"));
        let rejoined: Vec<&str> = sentences.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(rejoined.join(" "), "tiny incomprehensibilities end.");
    }
}
