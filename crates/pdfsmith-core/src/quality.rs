//! Heuristic extraction-quality scoring.
//!
//! Scores are pure functions from a small statistics record to a value in
//! [0, 1], used solely to pick between backend attempts. They are not a
//! correctness guarantee.

/// Raw statistics about one page's extracted text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageStats {
    pub char_count: usize,
    pub word_count: usize,
    pub newline_count: usize,
    pub has_replacement_char: bool,
}

impl PageStats {
    pub fn from_text(text: &str) -> Self {
        Self {
            char_count: text.chars().count(),
            word_count: text.split_whitespace().count(),
            newline_count: text.chars().filter(|&c| c == '\n').count(),
            has_replacement_char: text.contains('\u{FFFD}'),
        }
    }
}

/// Score one page. Starts at 1.0 and applies multiplicative penalties:
///
/// * no text at all → 0.0, terminal
/// * under 50 chars → ×0.5 (likely truncated extraction)
/// * mean word length over 15 → ×0.7 (missing word boundaries)
/// * replacement-character artifacts or newline density above 10% → ×0.8
pub fn page_score(stats: &PageStats) -> f64 {
    if stats.char_count == 0 {
        return 0.0;
    }

    let mut score: f64 = 1.0;

    if stats.char_count < 50 {
        score *= 0.5;
    }

    if stats.word_count > 0 {
        let chars_per_word = stats.char_count as f64 / stats.word_count as f64;
        if chars_per_word > 15.0 {
            score *= 0.7;
        }
    }

    let newline_density = stats.newline_count as f64 / stats.char_count.max(1) as f64;
    if stats.has_replacement_char || newline_density > 0.1 {
        score *= 0.8;
    }

    score.min(1.0)
}

/// Aggregate the per-page scores: mean, then a word-length adjustment on
/// the combined text (×1.1 when the mean word length sits in the plausible
/// natural-language range [2, 12], ×0.9 otherwise), clamped to [0, 1].
pub fn aggregate_score(page_scores: &[f64], total_chars: usize, total_words: usize) -> f64 {
    if page_scores.is_empty() {
        return 0.0;
    }
    let mean = page_scores.iter().sum::<f64>() / page_scores.len() as f64;

    if total_chars == 0 {
        return 0.0;
    }

    let adjusted = if total_words > 0 {
        let avg_word_length = total_chars as f64 / total_words as f64;
        if (2.0..=12.0).contains(&avg_word_length) {
            mean * 1.1
        } else {
            mean * 0.9
        }
    } else {
        mean * 0.9
    };

    adjusted.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(text: &str) -> PageStats {
        PageStats::from_text(text)
    }

    #[test]
    fn empty_page_scores_zero() {
        assert_eq!(page_score(&stats("")), 0.0);
    }

    #[test]
    fn normal_prose_scores_one() {
        let text = "The quick brown fox jumps over the lazy dog. \
                    Pack my box with five dozen liquor jugs.";
        assert_eq!(page_score(&stats(text)), 1.0);
    }

    #[test]
    fn short_extraction_is_penalized() {
        let score = page_score(&stats("tiny fragment"));
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn garbled_long_words_are_penalized() {
        // One 80-char "word": chars/word way over 15.
        let text = "x".repeat(80);
        let score = page_score(&stats(&text));
        assert!((score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn replacement_chars_are_penalized() {
        let text = format!("{} badly decoded {}", "a".repeat(40), '\u{FFFD}');
        let score = page_score(&stats(&text));
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn newline_heavy_text_is_penalized() {
        // 60 chars of which 20 are newlines: density 33%.
        let text = "ab\n".repeat(20);
        let score = page_score(&stats(&text));
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn penalties_stack_multiplicatively() {
        // Short (x0.5) and artifact-ridden (x0.8).
        let text = format!("bad {}", '\u{FFFD}');
        let score = page_score(&stats(&text));
        assert!((score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn aggregate_of_nothing_is_zero() {
        assert_eq!(aggregate_score(&[], 0, 0), 0.0);
        assert_eq!(aggregate_score(&[0.0, 0.0], 0, 0), 0.0);
    }

    #[test]
    fn plausible_word_length_earns_bonus() {
        // Mean word length 4: within [2, 12], so 0.8 * 1.1 = 0.88.
        let score = aggregate_score(&[0.8, 0.8], 400, 100);
        assert!((score - 0.88).abs() < 1e-9);
    }

    #[test]
    fn implausible_word_length_is_penalized() {
        // Mean word length 40: outside [2, 12], so 0.8 * 0.9 = 0.72.
        let score = aggregate_score(&[0.8, 0.8], 400, 10);
        assert!((score - 0.72).abs() < 1e-9);
    }

    #[test]
    fn aggregate_is_clamped_to_one() {
        let score = aggregate_score(&[1.0, 1.0], 500, 100);
        assert_eq!(score, 1.0);
    }
}
