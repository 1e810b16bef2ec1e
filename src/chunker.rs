//! Token-bounded text chunking along semantic boundaries.
//!
//! Splits at sentence boundaries first and falls back to word granularity
//! for sentences that alone exceed the budget. A single word that exceeds
//! the budget on its own is emitted as its own over-sized chunk rather than
//! split mid-word. The function is pure: same input, same output, no state
//! across calls.

use crate::token_count::TokenCounter;

/// Greedy sentence-packing chunker bounded by a token budget.
#[derive(Debug, Clone)]
pub struct TextChunker {
    counter: TokenCounter,
    max_tokens: usize,
}

impl TextChunker {
    pub fn new(counter: TokenCounter, max_tokens: usize) -> Self {
        Self { counter, max_tokens }
    }

    /// Split `text` into chunks whose token counts stay within the budget,
    /// except for single words that individually exceed it.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if self.counter.count(text) <= self.max_tokens {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in split_sentences(text) {
            if self.counter.count(&sentence) > self.max_tokens {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                current = self.pack_words(&sentence, &mut chunks);
                continue;
            }

            let candidate = append_segment(&current, &sentence);
            if !current.is_empty() && self.counter.count(&candidate) > self.max_tokens {
                chunks.push(std::mem::take(&mut current));
                current = sentence;
            } else {
                current = candidate;
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// Chunk a pre-split list element-wise, preserving element order.
    pub fn chunk_all(&self, texts: &[String]) -> Vec<String> {
        texts.iter().flat_map(|t| self.chunk(t)).collect()
    }

    /// Word-granularity fallback for a sentence that exceeds the budget.
    /// Full word buffers become chunks; the trailing buffer is returned so
    /// it keeps accumulating with whatever follows.
    fn pack_words(&self, sentence: &str, chunks: &mut Vec<String>) -> String {
        let mut buffer = String::new();
        for word in sentence.split_whitespace() {
            let candidate = append_segment(&buffer, word);
            if !buffer.is_empty() && self.counter.count(&candidate) > self.max_tokens {
                chunks.push(std::mem::take(&mut buffer));
                buffer = word.to_string();
            } else {
                buffer = candidate;
            }
        }
        buffer
    }
}

fn append_segment(current: &str, segment: &str) -> String {
    if current.is_empty() {
        segment.to_string()
    } else {
        format!("{current} {segment}")
    }
}

/// Split on `.`/`!`/`?` followed by whitespace. Word-based so that joining
/// the sentences back reproduces the whitespace-normalized input.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        current.push(word);
        if matches!(word.chars().last(), Some('.' | '!' | '?')) {
            sentences.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        sentences.push(current.join(" "));
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(max_tokens: usize) -> TextChunker {
        // Unrecognized model id -> word-count estimation, which makes the
        // budgets in these tests exact.
        TextChunker::new(TokenCounter::new("test-model"), max_tokens)
    }

    fn normalized_words(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[test]
    fn small_input_passes_through_unchanged() {
        let c = chunker(50);
        let text = "One short sentence. Another one.";
        assert_eq!(c.chunk(text), vec![text.to_string()]);
    }

    #[test]
    fn every_chunk_respects_token_budget() {
        let c = chunker(8);
        let text = "The pump failed twice. Corrosion was found on the intake valve. \
                    Replacement was scheduled. The vendor confirmed the defect report. \
                    Follow-up inspection is pending.";
        let counter = TokenCounter::new("test-model");
        for chunk in c.chunk(text) {
            assert!(
                counter.count(&chunk) <= 8,
                "chunk over budget: '{chunk}'"
            );
        }
    }

    #[test]
    fn chunks_cover_all_words_in_order() {
        let c = chunker(6);
        let text = "Alpha beta gamma. Delta epsilon zeta eta! Theta iota kappa? Lambda mu.";
        let joined = c.chunk(text).join(" ");
        assert_eq!(normalized_words(&joined), normalized_words(text));
    }

    #[test]
    fn chunking_is_idempotent() {
        let c = chunker(5);
        let text = "First sentence here. Second sentence follows now. Third one closes it.";
        assert_eq!(c.chunk(text), c.chunk(text));
    }

    #[test]
    fn oversized_sentence_falls_back_to_words() {
        let c = chunker(4);
        let text = "one two three four five six seven eight nine ten.";
        let chunks = c.chunk(text);
        assert!(chunks.len() >= 3);
        let counter = TokenCounter::new("test-model");
        for chunk in &chunks {
            assert!(counter.count(chunk) <= 4);
        }
        let joined = chunks.join(" ");
        assert_eq!(normalized_words(&joined), normalized_words(text));
    }

    #[test]
    fn single_oversized_word_gets_own_chunk() {
        // char-ratio counter: the long token alone exceeds the budget
        let c = TextChunker::new(TokenCounter::new("gpt-3.5-turbo"), 3);
        let long_word = "a".repeat(40);
        let text = format!("short words here. {long_word} more text follows here.");
        let chunks = c.chunk(&text);
        assert!(
            chunks.iter().any(|ch| ch == &long_word),
            "expected the oversized word as its own chunk, got {chunks:?}"
        );
    }

    #[test]
    fn trailing_buffer_is_flushed() {
        let c = chunker(3);
        let text = "One two three. Four five six. Seven";
        let chunks = c.chunk(text);
        assert_eq!(chunks.last().map(String::as_str), Some("Seven"));
    }

    #[test]
    fn chunk_all_processes_elements_independently() {
        let c = chunker(3);
        let texts = vec![
            "short one.".to_string(),
            "this element runs much longer than the budget allows here.".to_string(),
        ];
        let chunks = c.chunk_all(&texts);
        assert_eq!(chunks[0], "short one.");
        assert!(chunks.len() > 2);
    }
}
