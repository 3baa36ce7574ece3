//! Word-window chunking for long documents

use crate::error::ExtractorError;

/// Splits text into overlapping windows of whitespace-separated words
///
/// Window `i` starts at word `i * (chunk_size - overlap)` and spans
/// `chunk_size` words; the last window may be shorter. Windows stop as soon
/// as one reaches the end of the text, so every word is covered and no
/// window is entirely contained in its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a new text chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ExtractorError> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(ExtractorError::Config(format!(
                "invalid chunking: size {} with overlap {}",
                chunk_size, overlap
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Distance between the starts of consecutive windows
    fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Chunk the given text
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        self.windows(words.len())
            .map(|(start, end)| words[start..end].join(" "))
            .collect()
    }

    /// Word ranges `[start, end)` of every window over `n_words` words
    pub fn windows(&self, n_words: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let stride = self.stride();
        let size = self.chunk_size;
        let mut next = if n_words == 0 { None } else { Some(0) };
        std::iter::from_fn(move || {
            let start = next?;
            let end = (start + size).min(n_words);
            next = if end >= n_words { None } else { Some(start + stride) };
            Some((start, end))
        })
    }

    /// Number of windows produced for `n_words` words
    pub fn chunk_count(&self, n_words: usize) -> usize {
        match n_words {
            0 => 0,
            n if n <= self.chunk_size => 1,
            n => (n - self.overlap).div_ceil(self.stride()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_no_chunking_needed_for_small_text() {
        let chunker = TextChunker::new(100, 10).unwrap();
        let chunks = chunker.chunk("Short   text\nhere.");
        assert_eq!(chunks, vec!["Short text here."]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let chunker = TextChunker::new(100, 10).unwrap();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk(" \n\t ").is_empty());
        assert_eq!(chunker.chunk_count(0), 0);
    }

    #[test]
    fn test_windows_overlap() {
        let chunker = TextChunker::new(4, 1).unwrap();
        let chunks = chunker.chunk(&words(10));
        assert_eq!(
            chunks,
            vec!["w0 w1 w2 w3", "w3 w4 w5 w6", "w6 w7 w8 w9"]
        );
    }

    #[test]
    fn test_last_window_may_be_shorter() {
        let chunker = TextChunker::new(4, 1).unwrap();
        let chunks = chunker.chunk(&words(8));
        assert_eq!(chunks, vec!["w0 w1 w2 w3", "w3 w4 w5 w6", "w6 w7"]);
    }

    #[test]
    fn test_default_sizes_count() {
        let chunker = TextChunker::new(2000, 250).unwrap();
        assert_eq!(chunker.chunk_count(2000), 1);
        assert_eq!(chunker.chunk_count(2001), 2);
        assert_eq!(chunker.chunk_count(3750), 2);
        assert_eq!(chunker.chunk_count(3751), 3);
    }

    #[test]
    fn test_invalid_overlap_rejected() {
        assert!(TextChunker::new(10, 10).is_err());
        assert!(TextChunker::new(0, 0).is_err());
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let chunker = TextChunker::new(7, 2).unwrap();
        let text = words(50);
        assert_eq!(chunker.chunk(&text), chunker.chunk(&text));
    }

    proptest! {
        /// Property: every word is covered and the count matches the closed form
        #[test]
        fn test_chunk_coverage(n in 0usize..9000) {
            let chunker = TextChunker::new(2000, 250).unwrap();
            let windows: Vec<_> = chunker.windows(n).collect();
            prop_assert_eq!(windows.len(), chunker.chunk_count(n));

            let mut covered_to = 0;
            for (start, end) in &windows {
                prop_assert!(*start <= covered_to);
                prop_assert!(end - start <= 2000);
                covered_to = covered_to.max(*end);
            }
            prop_assert_eq!(covered_to, n);
        }

        #[test]
        fn test_small_sizes_cover_text(n in 0usize..200, size in 2usize..20, overlap in 0usize..19) {
            prop_assume!(overlap < size);
            let chunker = TextChunker::new(size, overlap).unwrap();
            let text = words(n);
            let chunks = chunker.chunk(&text);
            prop_assert_eq!(chunks.len(), chunker.chunk_count(n));

            let mut seen = std::collections::HashSet::new();
            for chunk in &chunks {
                seen.extend(chunk.split(' ').map(str::to_string));
            }
            prop_assert_eq!(seen.len(), n);
        }
    }
}
