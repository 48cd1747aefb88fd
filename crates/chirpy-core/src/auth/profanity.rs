//! Chirp body masking

/// Words replaced in every chirp
pub const DEFAULT_BANNED_WORDS: &[&str] = &["kerfuffle", "sharbert", "fornax"];

const MASK: &str = "****";

/// Replace banned words with `****`
///
/// Words are split on whitespace and compared case-insensitively as whole
/// words, so punctuation attached to a word (`"fornax!"`) keeps it intact.
/// The result is re-joined with single spaces.
pub fn clean(text: &str, banned: &[&str]) -> String {
    text.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            if banned.iter().any(|b| *b == lower) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_banned_words_any_case() {
        assert_eq!(
            clean("This is a kerfuffle opinion I need to share with the world", DEFAULT_BANNED_WORDS),
            "This is a **** opinion I need to share with the world"
        );
        assert_eq!(
            clean("I hear Mastodon is better than Chirpy. sharbert I need to migrate", DEFAULT_BANNED_WORDS),
            "I hear Mastodon is better than Chirpy. **** I need to migrate"
        );
        assert_eq!(clean("FORNAX Fornax", DEFAULT_BANNED_WORDS), "**** ****");
    }

    #[test]
    fn test_punctuation_is_not_stripped() {
        assert_eq!(clean("Sharbert!", DEFAULT_BANNED_WORDS), "Sharbert!");
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        assert_eq!(clean("  hello   world ", &[]), "hello world");
    }
}
