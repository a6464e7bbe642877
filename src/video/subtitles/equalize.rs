//! Splits long subtitle cues so that none exceeds a character budget.
//!
//! Words are packed greedily into chunks; each chunk gets a slice of the
//! original cue's time proportional to its character count. The last chunk
//! always ends on the original end time, so the covered span never moves.

use std::time::Duration;

use crate::video::error::RenderError;
use crate::video::srt::SubtitleCue;

pub fn equalize_cues(
    cues: &[SubtitleCue],
    max_chars: usize,
) -> Result<Vec<SubtitleCue>, RenderError> {
    if max_chars == 0 {
        return Err(RenderError::invalid(
            "maximum subtitle characters must be at least 1",
        ));
    }

    let mut equalized = Vec::with_capacity(cues.len());
    for cue in cues {
        equalized.extend(split_cue(cue, max_chars));
    }
    Ok(equalized)
}

fn split_cue(cue: &SubtitleCue, max_chars: usize) -> Vec<SubtitleCue> {
    if cue.char_count() <= max_chars {
        return vec![cue.clone()];
    }

    let chunks = pack_words(&cue.text, max_chars);
    if chunks.is_empty() {
        // Whitespace only
        return vec![SubtitleCue::new(cue.start, cue.end, "")];
    }

    let total_chars: usize = chunks.iter().map(|chunk| chunk.chars().count()).sum();
    let span_ms = cue.duration().as_millis();

    let mut split = Vec::with_capacity(chunks.len());
    let mut consumed_chars = 0usize;
    let mut start = cue.start;
    let last = chunks.len() - 1;

    for (idx, chunk) in chunks.into_iter().enumerate() {
        consumed_chars += chunk.chars().count();
        let end = if idx == last {
            cue.end
        } else {
            let offset_ms = span_ms * consumed_chars as u128 / total_chars as u128;
            cue.start + Duration::from_millis(offset_ms as u64)
        };
        split.push(SubtitleCue::new(start, end, chunk));
        start = end;
    }

    split
}

/// Greedy word packing; words longer than the budget are cut into pieces
fn pack_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        for piece in hard_split(word, max_chars) {
            let piece_len = piece.chars().count();
            let joined_len = if current.is_empty() {
                piece_len
            } else {
                current_len + 1 + piece_len
            };

            if joined_len > max_chars && !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }

            if !current.is_empty() {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(&piece);
            current_len += piece_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn hard_split(word: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_chars)
        .map(|piece| piece.iter().collect())
        .collect()
}
