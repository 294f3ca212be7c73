//! Quoting and variable substitution
//!
//! Decodes backslash-command argument strings (honoring single, double,
//! backtick and dollar quoting plus `:name` interpolation) and renders
//! values back into safely quoted literal form. The statement lexer and the
//! command dispatcher both go through this module.
//!
//! Single-quoted literals accept backslash escapes and `''` doubling.
//! Double- and backtick-quoted literals accept ONLY doubling; a backslash
//! escape there is an error. This asymmetry is intentional.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Read-only variable store handed to the lexer and the unquoter.
/// The core never owns variable storage; the shell does.
pub trait VarLookup {
    fn get(&self, name: &str) -> Option<String>;
}

impl VarLookup for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// An empty variable store.
pub struct NoVars;

impl VarLookup for NoVars {
    fn get(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Quoting style for [`quote`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteStyle {
    Single,
    Double,
    Backtick,
    Dollar,
}

impl QuoteStyle {
    fn delimiter(self) -> char {
        match self {
            QuoteStyle::Single => '\'',
            QuoteStyle::Double => '"',
            QuoteStyle::Backtick => '`',
            QuoteStyle::Dollar => '$',
        }
    }
}

/// Decode a raw backslash-command argument.
///
/// With `is_var_name` set, `raw` is a bare variable name: the result is the
/// bound value and `true`, or the name unchanged and `false` when unbound.
/// Otherwise `raw` may be a quoted literal (decoded per quote style), a
/// `:name`-style variable reference, or a bare word passed through verbatim.
pub fn unquote(raw: &str, is_var_name: bool, vars: &dyn VarLookup) -> Result<(String, bool)> {
    if is_var_name {
        return Ok(match vars.get(raw) {
            Some(value) => (value, true),
            None => (raw.to_string(), false),
        });
    }

    let mut chars = raw.chars();
    match chars.next() {
        None => Ok((String::new(), true)),
        Some('\'') => decode_single(raw).map(|s| (s, true)),
        Some('"') => decode_doubling_only(raw, '"').map(|s| (s, true)),
        Some('`') => decode_doubling_only(raw, '`').map(|s| (s, true)),
        Some('$') => decode_dollar(raw).map(|s| (s, true)),
        Some(':') => unquote_var_ref(raw, vars),
        Some(_) => Ok((raw.to_string(), true)),
    }
}

/// Wrap `value` so that re-lexing the result reproduces the same literal.
pub fn quote(value: &str, style: QuoteStyle) -> String {
    match style {
        QuoteStyle::Single | QuoteStyle::Double | QuoteStyle::Backtick => {
            let q = style.delimiter();
            let mut out = String::with_capacity(value.len() + 2);
            out.push(q);
            for c in value.chars() {
                if c == q {
                    out.push(q);
                }
                out.push(c);
            }
            out.push(q);
            out
        }
        QuoteStyle::Dollar => {
            let tag = pick_dollar_tag(value);
            format!("${tag}${value}${tag}$")
        }
    }
}

/// Choose a dollar-quote tag that does not occur inside `value`.
fn pick_dollar_tag(value: &str) -> String {
    if !value.contains("$$") {
        return String::new();
    }
    let mut n = 0usize;
    loop {
        let tag = if n == 0 { "q".to_string() } else { format!("q{n}") };
        if !value.contains(&format!("${tag}$")) {
            return tag;
        }
        n += 1;
    }
}

/// Decode `'...'`, honoring `''` doubling and backslash escapes.
fn decode_single(raw: &str) -> Result<String> {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::new();
    let mut i = 1;
    while i < chars.len() {
        match chars[i] {
            '\'' => {
                if chars.get(i + 1) == Some(&'\'') {
                    out.push('\'');
                    i += 2;
                    continue;
                }
                // closing quote must end the input
                if i + 1 != chars.len() {
                    return Err(Error::InvalidQuoted("text after closing quote"));
                }
                return Ok(out);
            }
            '\\' => {
                let Some(&esc) = chars.get(i + 1) else {
                    return Err(Error::UnterminatedQuoted);
                };
                out.push(match esc {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
                i += 2;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Err(Error::UnterminatedQuoted)
}

/// Decode `"..."` or `` `...` ``: doubling is the only escape mechanism.
fn decode_doubling_only(raw: &str, q: char) -> Result<String> {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::new();
    let mut i = 1;
    while i < chars.len() {
        let c = chars[i];
        if c == q {
            if chars.get(i + 1) == Some(&q) {
                out.push(q);
                i += 2;
                continue;
            }
            if i + 1 != chars.len() {
                return Err(Error::InvalidQuoted("text after closing quote"));
            }
            return Ok(out);
        }
        if c == '\\' {
            return Err(Error::InvalidQuoted(
                "backslash escape in double- or backtick-quoted string",
            ));
        }
        out.push(c);
        i += 1;
    }
    Err(Error::UnterminatedQuoted)
}

/// Decode `$tag$...$tag$`; the body is taken verbatim.
fn decode_dollar(raw: &str) -> Result<String> {
    let rest = &raw[1..];
    let Some(tag_end) = rest.find('$') else {
        return Err(Error::UnterminatedQuoted);
    };
    let tag = &rest[..tag_end];
    if !tag.is_empty() && !is_ident(tag) {
        return Err(Error::InvalidQuoted("invalid dollar-quote tag"));
    }
    let opener = format!("${tag}$");
    let body_start = opener.len();
    if raw.len() < body_start * 2 || !raw.ends_with(&opener) {
        return Err(Error::UnterminatedQuoted);
    }
    Ok(raw[body_start..raw.len() - opener.len()].to_string())
}

/// Decode a `:name`, `:'name'` or `:"name"` reference handed in as a
/// command argument.
fn unquote_var_ref(raw: &str, vars: &dyn VarLookup) -> Result<(String, bool)> {
    let body = &raw[1..];
    let name = match body.chars().next() {
        Some('\'') => decode_single(body)?,
        Some('"') => decode_doubling_only(body, '"')?,
        _ => body.to_string(),
    };
    Ok(match vars.get(&name) {
        Some(value) => (value, true),
        None => (raw.to_string(), false),
    })
}

/// Restricted identifier grammar shared with dollar-quote tags.
pub(crate) fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "film".to_string());
        vars
    }

    #[test]
    fn bare_word_passes_through() {
        let (s, ok) = unquote("hello", false, &NoVars).unwrap();
        assert_eq!(s, "hello");
        assert!(ok);
    }

    #[test]
    fn variable_name_lookup() {
        let (s, ok) = unquote("name", true, &store()).unwrap();
        assert_eq!(s, "film");
        assert!(ok);

        let (s, ok) = unquote("missing", true, &store()).unwrap();
        assert_eq!(s, "missing");
        assert!(!ok);
    }

    #[test]
    fn variable_reference() {
        let (s, ok) = unquote(":name", false, &store()).unwrap();
        assert_eq!(s, "film");
        assert!(ok);

        let (s, ok) = unquote(":'name'", false, &store()).unwrap();
        assert_eq!(s, "film");
        assert!(ok);

        let (s, ok) = unquote(":nope", false, &store()).unwrap();
        assert_eq!(s, ":nope");
        assert!(!ok);
    }

    #[test]
    fn single_quote_doubling_and_escapes() {
        assert_eq!(unquote("'a''b'", false, &NoVars).unwrap().0, "a'b");
        assert_eq!(unquote("'a\\nb'", false, &NoVars).unwrap().0, "a\nb");
        assert_eq!(unquote("'a\\qb'", false, &NoVars).unwrap().0, "aqb");
    }

    #[test]
    fn double_quote_forbids_backslash() {
        assert_eq!(unquote("\"a\"\"b\"", false, &NoVars).unwrap().0, "a\"b");
        assert!(matches!(
            unquote("\"a\\nb\"", false, &NoVars),
            Err(Error::InvalidQuoted(_))
        ));
        assert!(matches!(
            unquote("`a\\b`", false, &NoVars),
            Err(Error::InvalidQuoted(_))
        ));
    }

    #[test]
    fn unterminated_is_an_error() {
        assert!(matches!(
            unquote("'abc", false, &NoVars),
            Err(Error::UnterminatedQuoted)
        ));
        assert!(matches!(
            unquote("\"abc", false, &NoVars),
            Err(Error::UnterminatedQuoted)
        ));
        assert!(matches!(
            unquote("$tag$abc", false, &NoVars),
            Err(Error::UnterminatedQuoted)
        ));
    }

    #[test]
    fn dollar_body_is_verbatim() {
        assert_eq!(
            unquote("$tag$a\\n'b$tag$", false, &NoVars).unwrap().0,
            "a\\n'b"
        );
        assert_eq!(unquote("$$x$$", false, &NoVars).unwrap().0, "x");
    }

    #[test]
    fn quote_doubles_delimiters() {
        assert_eq!(quote("a'b", QuoteStyle::Single), "'a''b'");
        assert_eq!(quote("a\"b", QuoteStyle::Double), "\"a\"\"b\"");
        assert_eq!(quote("a`b", QuoteStyle::Backtick), "`a``b`");
    }

    #[test]
    fn quote_dollar_avoids_collisions() {
        assert_eq!(quote("plain", QuoteStyle::Dollar), "$$plain$$");
        let quoted = quote("has $$ inside", QuoteStyle::Dollar);
        assert_eq!(quoted, "$q$has $$ inside$q$");
    }

    #[test]
    fn quote_unquote_round_trip() {
        for literal in ["'abc'", "'a''b'", "'it''s here'"] {
            let (decoded, _) = unquote(literal, false, &NoVars).unwrap();
            assert_eq!(quote(&decoded, QuoteStyle::Single), literal);
        }
    }
}
