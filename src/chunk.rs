//! Separator-priority text chunker and deterministic chunk identity.
//!
//! Splits extracted document text into overlapping windows sized for
//! embedding. Cuts prefer paragraph boundaries (`\n\n`), then line breaks,
//! then sentence ends, then spaces, and only fall back to a hard character
//! cut when no separator exists in the window. Consecutive chunks share
//! exactly `overlap` characters, so concatenating chunks with the overlap
//! removed reconstructs the input byte-for-byte.
//!
//! Chunk identity is a SHA-256 hash over a canonical encoding of
//! `{content, user_id, file_id}`: re-ingesting identical content under the
//! same ownership produces the same identity, which makes index writes
//! idempotent upserts.

use sha2::{Digest, Sha256};

/// Cut-point preference, highest priority first.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Split `text` into chunks of at most `chunk_size` characters, with
/// `overlap` characters shared between consecutive chunks.
///
/// Whitespace-only input produces zero chunks; ingesting such a document
/// is a valid no-op. The split is pure and deterministic, and operates on
/// char boundaries so multi-byte input never panics.
///
/// Degenerate parameters are clamped rather than trusted: a zero
/// `chunk_size` becomes 1, and an `overlap` of `chunk_size` or more becomes
/// `chunk_size - 1`. Every iteration must advance `start` by at least one
/// character or the loop below would never terminate.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size - 1);

    if text.trim().is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        if n - start <= chunk_size {
            chunks.push(chars[start..].iter().collect());
            break;
        }

        let window_end = start + chunk_size;
        // A cut at or before start + overlap would not advance past the
        // shared prefix; require strict progress beyond it.
        let min_cut = start + overlap + 1;
        let cut = cut_point(&chars, start, window_end, min_cut);
        chunks.push(chars[start..cut].iter().collect());
        start = cut - overlap;
    }

    chunks
}

/// Find the cut position (exclusive char index) for the window
/// `[start, window_end)`: the end of the last occurrence of the
/// highest-priority separator that still lands after `min_cut`.
/// Falls back to a hard cut at `window_end`.
fn cut_point(chars: &[char], start: usize, window_end: usize, min_cut: usize) -> usize {
    for sep in SEPARATORS {
        let sep: Vec<char> = sep.chars().collect();
        if window_end < start + sep.len() {
            continue;
        }

        let mut i = window_end - sep.len();
        loop {
            if chars[i..i + sep.len()] == sep[..] {
                let end = i + sep.len();
                if end > min_cut {
                    return end;
                }
                // Earlier occurrences end even sooner; try the next separator.
                break;
            }
            if i == start {
                break;
            }
            i -= 1;
        }
    }

    window_end
}

/// Deterministic identity for an index entry: SHA-256 over the
/// length-prefixed property set `{content, user_id, file_id}`, hex encoded.
///
/// The length prefix keeps field boundaries unambiguous, so no two distinct
/// property sets can collide by concatenation.
pub fn chunk_identity(content: &str, user_id: &str, file_id: &str) -> String {
    let mut hasher = Sha256::new();
    for field in [content, user_id, file_id] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reassemble chunks by dropping each successor's `overlap`-char prefix.
    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(chunk);
            } else {
                out.extend(chunk.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn small_text_single_chunk() {
        let chunks = split_text("Hello, world!", 2000, 300);
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn whitespace_only_yields_zero_chunks() {
        assert!(split_text("", 2000, 300).is_empty());
        assert!(split_text("  \n\n  \t ", 2000, 300).is_empty());
    }

    #[test]
    fn deterministic() {
        let text = "Alpha.\n\nBeta.\n\nGamma.\n\nDelta.".repeat(40);
        let a = split_text(&text, 100, 20);
        let b = split_text(&text, 100, 20);
        assert_eq!(a, b);
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let para = "x".repeat(60);
        let text = format!("{}\n\n{}\n\n{}", para, para, para);
        let chunks = split_text(&text, 100, 10);
        // The first cut should land right after a paragraph break, not mid-word.
        assert!(chunks[0].ends_with("\n\n"), "got: {:?}", chunks[0]);
    }

    #[test]
    fn no_chunk_exceeds_target_length() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(200);
        for chunk in split_text(&text, 120, 30) {
            assert!(chunk.chars().count() <= 120);
        }
    }

    #[test]
    fn round_trip_with_overlap_removed() {
        let text = "Paragraph one is short.\n\nParagraph two rambles on for a while \
                    and keeps going.\nIt has a line break. And sentences too.\n\n"
            .repeat(30);
        let chunks = split_text(&text, 150, 40);
        assert!(chunks.len() > 1);
        assert_eq!(reconstruct(&chunks, 40), text);
    }

    #[test]
    fn hard_cut_when_no_separator_exists() {
        let text = "a".repeat(500);
        let chunks = split_text(&text, 100, 25);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
        assert_eq!(reconstruct(&chunks, 25), text);
    }

    #[test]
    fn multibyte_input_splits_on_char_boundaries() {
        let text = "héllo wörld ünïcödé ".repeat(50);
        let chunks = split_text(&text, 60, 15);
        assert_eq!(reconstruct(&chunks, 15), text);
    }

    #[test]
    fn oversized_overlap_is_clamped() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(10);

        // overlap == chunk_size and overlap > chunk_size must both
        // terminate and still cover the whole input.
        let equal = split_text(&text, 10, 10);
        assert!(!equal.is_empty());
        for chunk in &equal {
            assert!(chunk.chars().count() <= 10);
        }
        assert_eq!(reconstruct(&equal, 9), text);

        let larger = split_text(&text, 10, 50);
        assert_eq!(larger, equal);
    }

    #[test]
    fn zero_chunk_size_is_clamped() {
        let chunks = split_text("abc", 0, 0);
        assert_eq!(chunks, vec!["a", "b", "c"]);
    }

    #[test]
    fn identity_stable_for_identical_properties() {
        let a = chunk_identity("some content", "user-1", "file-1");
        let b = chunk_identity("some content", "user-1", "file-1");
        assert_eq!(a, b);
    }

    #[test]
    fn identity_changes_with_any_property() {
        let base = chunk_identity("some content", "user-1", "file-1");
        assert_ne!(base, chunk_identity("other content", "user-1", "file-1"));
        assert_ne!(base, chunk_identity("some content", "user-2", "file-1"));
        assert_ne!(base, chunk_identity("some content", "user-1", "file-2"));
    }

    #[test]
    fn identity_field_boundaries_unambiguous() {
        // Same concatenation, different field split.
        let a = chunk_identity("ab", "c", "d");
        let b = chunk_identity("a", "bc", "d");
        assert_ne!(a, b);
    }
}
