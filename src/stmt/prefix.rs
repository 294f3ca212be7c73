//! Keyword prefix extraction
//!
//! The prefix is the short upper-cased leading-keyword signature of the
//! accumulated statement, recomputed from scratch after every append. It is
//! what classifies a buffer as query vs exec (`SELECT`, `INSERT INTO`, ...)
//! without parsing anything.

/// Maximum number of leading words kept in a prefix.
pub const MAX_PREFIX_WORDS: usize = 6;

/// Extract up to `max_words` leading words from `buf`, stripping comments
/// and normalizing case. Leading parentheses are skipped so that
/// `(select ...` classifies as `SELECT`; the first punctuation character
/// after a word ends the prefix, which keeps `SELECT INTO` distinct from
/// `SELECT *`.
pub fn find(buf: &[char], max_words: usize) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut word = String::new();
    let mut i = 0;

    while i < buf.len() && words.len() < max_words {
        let c = buf[i];

        // line comment: skip to end of line
        if c == '-' && buf.get(i + 1) == Some(&'-') {
            while i < buf.len() && buf[i] != '\n' {
                i += 1;
            }
            flush(&mut word, &mut words);
            continue;
        }

        // block comment: skip to the first terminator, nesting unaware
        if c == '/' && buf.get(i + 1) == Some(&'*') {
            i += 2;
            while i < buf.len() {
                if buf[i] == '*' && buf.get(i + 1) == Some(&'/') {
                    i += 2;
                    break;
                }
                i += 1;
            }
            flush(&mut word, &mut words);
            continue;
        }

        if c.is_whitespace() {
            flush(&mut word, &mut words);
            i += 1;
            continue;
        }

        if c.is_alphanumeric() || c == '_' {
            word.extend(c.to_uppercase());
            i += 1;
            continue;
        }

        if c == '(' && words.is_empty() && word.is_empty() {
            i += 1;
            continue;
        }

        // any other punctuation ends the prefix
        break;
    }

    flush(&mut word, &mut words);
    words.truncate(max_words);
    words.join(" ")
}

fn flush(word: &mut String, words: &mut Vec<String>) {
    if !word.is_empty() {
        words.push(std::mem::take(word));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(s: &str) -> String {
        find(&s.chars().collect::<Vec<_>>(), MAX_PREFIX_WORDS)
    }

    #[test]
    fn uppercases_leading_words() {
        assert_eq!(prefix("select * from t"), "SELECT");
        assert_eq!(prefix("  insert into film values"), "INSERT INTO FILM VALUES");
    }

    #[test]
    fn select_into_is_two_words() {
        assert_eq!(prefix("select into x"), "SELECT INTO X");
        assert_ne!(prefix("select into x"), prefix("select * into x"));
    }

    #[test]
    fn comments_are_stripped() {
        assert_eq!(prefix("/* hint */ select 1"), "SELECT 1");
        assert_eq!(prefix("-- note\nselect 1"), "SELECT 1");
        assert_eq!(prefix("select /* c */ into t"), "SELECT INTO T");
    }

    #[test]
    fn leading_parens_are_skipped() {
        assert_eq!(prefix("((select 1) union"), "SELECT");
    }

    #[test]
    fn word_count_is_capped() {
        assert_eq!(
            prefix("a b c d e f g h"),
            "A B C D E F"
        );
    }

    #[test]
    fn punctuation_ends_the_prefix() {
        assert_eq!(prefix("update t set x = 1"), "UPDATE T SET X");
    }
}
