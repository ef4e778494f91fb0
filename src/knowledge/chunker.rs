//! Word-window chunking of the reference document.

use serde::Serialize;

/// A contiguous word window of the reference document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position in the ordered chunk sequence.
    pub index: usize,
    /// Offset of the first word of this window in the document.
    pub start_word: usize,
    /// Number of words in the window.
    pub word_count: usize,
    /// Window words joined by single spaces.
    pub text: String,
}

/// Split `text` into windows of `chunk_size` words whose starts advance by
/// `chunk_size - overlap` words.
///
/// A window starts at every stride offset that still lies inside the word
/// sequence, so the final word is always covered. An overlap that is not
/// smaller than the window is clamped to a stride of one word.
pub fn chunk_words(text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || chunk_size == 0 {
        return Vec::new();
    }
    let stride = chunk_size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    for start in (0..words.len()).step_by(stride) {
        let end = (start + chunk_size).min(words.len());
        let joined = words[start..end].join(" ");
        if joined.trim().is_empty() {
            continue;
        }
        chunks.push(Chunk {
            index: chunks.len(),
            start_word: start,
            word_count: end - start,
            text: joined,
        });
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_words("", 500, 50).is_empty());
        assert!(chunk_words("   \n\t ", 500, 50).is_empty());
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = chunk_words("alpha  beta\ngamma", 500, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "alpha beta gamma");
        assert_eq!(chunks[0].word_count, 3);
    }

    #[test]
    fn starts_advance_by_stride_and_cover_last_word() {
        for total in [1usize, 449, 450, 451, 500, 901, 1234, 2000] {
            let text = numbered_words(total);
            let chunks = chunk_words(&text, 500, 50);

            for (i, chunk) in chunks.iter().enumerate() {
                assert_eq!(chunk.index, i);
                assert_eq!(chunk.start_word, i * 450, "total={total}");
                assert!(!chunk.text.trim().is_empty());
                assert!(chunk.word_count <= 500);
            }
            let last = chunks.last().unwrap();
            assert_eq!(last.start_word + last.word_count, total, "total={total}");
            assert!(last.text.ends_with(&format!("w{}", total - 1)));
        }
    }

    #[test]
    fn consecutive_chunks_share_overlap() {
        let text = numbered_words(1000);
        let chunks = chunk_words(&text, 500, 50);
        let first: Vec<&str> = chunks[0].text.split(' ').collect();
        let second: Vec<&str> = chunks[1].text.split(' ').collect();
        assert_eq!(&first[450..], &second[..50]);
    }

    #[test]
    fn oversized_overlap_still_terminates() {
        let chunks = chunk_words("a b c d", 2, 5);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[3].text, "d");
    }
}
