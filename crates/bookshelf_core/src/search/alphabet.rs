//! Persian alphabet offered by the letter-search screen.
//!
//! The search layer itself never validates letters; collaborators use
//! [`is_alphabet_letter`] before calling `search_by_letter`.

/// The 32 letters in display order.
pub const PERSIAN_ALPHABET: [&str; 32] = [
    "ا", "ب", "پ", "ت", "ث", "ج", "چ", "ح", "خ", "د", "ذ", "ر", "ز", "ژ", "س", "ش", "ص", "ض",
    "ط", "ظ", "ع", "غ", "ف", "ق", "ک", "گ", "ل", "م", "ن", "و", "ه", "ی",
];

/// Returns whether `value` is exactly one letter of [`PERSIAN_ALPHABET`].
pub fn is_alphabet_letter(value: &str) -> bool {
    PERSIAN_ALPHABET.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::{is_alphabet_letter, PERSIAN_ALPHABET};
    use std::collections::HashSet;

    #[test]
    fn alphabet_has_32_distinct_single_char_letters() {
        let unique = PERSIAN_ALPHABET.iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), 32);
        assert!(PERSIAN_ALPHABET
            .iter()
            .all(|letter| letter.chars().count() == 1));
    }

    #[test]
    fn only_whole_letters_are_accepted() {
        assert!(is_alphabet_letter("ش"));
        assert!(!is_alphabet_letter("شا"));
        assert!(!is_alphabet_letter("A"));
        assert!(!is_alphabet_letter(""));
    }
}
