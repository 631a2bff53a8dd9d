//! Cheap structural heuristics over extracted page text.

/// Columnar-alignment proxy for table detection: a page is flagged when at
/// least 3 lines each carry 3+ whitespace-separated tokens and a multi-space
/// gap. Explicitly approximate; false positives and negatives are accepted.
pub fn looks_like_table(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let aligned_lines = text
        .lines()
        .filter(|line| line.split_whitespace().count() >= 3 && line.contains("  "))
        .count();
    aligned_lines >= 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_table() {
        assert!(!looks_like_table(""));
    }

    #[test]
    fn prose_is_not_a_table() {
        let text = "This is a normal paragraph of text.\n\
                    It has several lines but single spacing.\n\
                    Nothing here resembles aligned columns.";
        assert!(!looks_like_table(text));
    }

    #[test]
    fn three_aligned_rows_are_a_table() {
        let text = "Name    Qty   Price\n\
                    Bolt    12    0.30\n\
                    Washer  48    0.05\n\
                    Nut     12    0.10";
        assert!(looks_like_table(text));
    }

    #[test]
    fn two_aligned_rows_are_not_enough() {
        let text = "Name    Qty   Price\n\
                    Bolt    12    0.30\n\
                    and then the invoice continues in prose.";
        assert!(!looks_like_table(text));
    }

    #[test]
    fn gap_without_enough_tokens_does_not_count() {
        // Multi-space gaps but only two tokens per line.
        let text = "left  right\nleft  right\nleft  right\nleft  right";
        assert!(!looks_like_table(text));
    }
}
