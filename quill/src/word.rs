//! Space-delimited word motion.
//!
//! Only `' '` separates words. There is no Unicode word segmentation and no
//! punctuation class: `foo.bar` is one word.

const SPACE: char = ' ';

/// Start of the word before `index`: skip spaces backward, then non-spaces.
pub fn previous_word_start(text: &str, index: usize) -> usize {
    let chars: Vec<char> = text.chars().take(index).collect();
    let mut i = chars.len();
    while i > 0 && chars[i - 1] == SPACE {
        i -= 1;
    }
    while i > 0 && chars[i - 1] != SPACE {
        i -= 1;
    }
    i
}

/// End of the word after `index`: skip spaces forward, then non-spaces.
pub fn next_word_end(text: &str, index: usize) -> usize {
    let mut chars = text.chars().skip(index).peekable();
    let mut i = index.min(text.chars().count());
    while chars.next_if_eq(&SPACE).is_some() {
        i += 1;
    }
    while chars.next_if(|ch| *ch != SPACE).is_some() {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_skips_spaces_then_word() {
        let text = "hello  big world";
        assert_eq!(previous_word_start(text, 16), 11);
        assert_eq!(previous_word_start(text, 11), 7);
        assert_eq!(previous_word_start(text, 7), 0);
        assert_eq!(previous_word_start(text, 3), 0);
        assert_eq!(previous_word_start(text, 0), 0);
    }

    #[test]
    fn next_skips_spaces_then_word() {
        let text = "hello  big world";
        assert_eq!(next_word_end(text, 0), 5);
        assert_eq!(next_word_end(text, 5), 10);
        assert_eq!(next_word_end(text, 10), 16);
        assert_eq!(next_word_end(text, 16), 16);
        assert_eq!(next_word_end(text, 99), 16);
    }

    #[test]
    fn left_then_right_returns_to_word_end() {
        let text = "one two three";
        for index in [3, 7, 13] {
            let left = previous_word_start(text, index);
            assert_eq!(next_word_end(text, left), index, "from {index}");
        }
    }

    #[test]
    fn punctuation_is_part_of_the_word() {
        assert_eq!(next_word_end("foo.bar baz", 0), 7);
        assert_eq!(previous_word_start("a€b c", 3), 0);
    }
}
