pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// Counts whitespace-separated words, ignoring anything inside `<...>` tags.
#[must_use]
pub fn word_count(text: &str) -> i64 {
    let mut plain = String::with_capacity(text.len());
    let mut in_tag = false;

    for c in text.chars() {
        match c {
            '<' => {
                in_tag = true;
                plain.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => plain.push(c),
            _ => {}
        }
    }

    plain.split_whitespace().count() as i64
}

/// Estimated minutes to read `words`. Non-empty text takes at least a minute.
#[must_use]
pub fn reading_minutes(words: i64, words_per_minute: u32) -> i64 {
    if words <= 0 {
        return 0;
    }
    let wpm = i64::from(words_per_minute.max(1));
    (words + wpm - 1) / wpm
}

/// Returns `(word_count, reading_minutes)` for a body of text.
#[must_use]
pub fn estimate(text: &str, words_per_minute: u32) -> (i64, i64) {
    let words = word_count(text);
    (words, reading_minutes(words, words_per_minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_plain() {
        assert_eq!(word_count("the  abyss\nlooks back"), 4);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\t "), 0);
    }

    #[test]
    fn test_word_count_strips_tags() {
        assert_eq!(word_count("<p>First rite</p><p>second</p>"), 3);
        assert_eq!(word_count("<h1 class=\"title\">Nox</h1>"), 1);
        assert_eq!(word_count("word<br/>word"), 2);
    }

    #[test]
    fn test_reading_minutes_rounds_up() {
        assert_eq!(reading_minutes(0, 200), 0);
        assert_eq!(reading_minutes(1, 200), 1);
        assert_eq!(reading_minutes(200, 200), 1);
        assert_eq!(reading_minutes(201, 200), 2);
    }

    #[test]
    fn test_estimate() {
        let text = "word ".repeat(450);
        assert_eq!(estimate(&text, DEFAULT_WORDS_PER_MINUTE), (450, 3));
    }
}
