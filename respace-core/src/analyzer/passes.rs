//! Rewrite passes of the normalization pipeline.
//!
//! Every pass is a pure `fn(&str, &mut String)`: it clears `out`, writes the
//! rewritten text into it, and never fails. The pipeline in
//! [`super::normalizer`] chains them in [`Pass::ORDER`].
//!
//! All passes scan forward once. Decisions that depend on what came before
//! look at the already-written output rather than the input, which is what
//! lets merges chain (`"w o r d"` becomes `"word"` in a single scan).
//!
//! ## Character classes
//!
//! - **word**: alphanumeric or `_`
//! - **line break**: `\n`, `\r`, VT, FF, NEL, U+2028, U+2029
//! - **horizontal whitespace**: any other whitespace (space, tab, NBSP, ...)
//!
//! Only the final collapse is limited to horizontal whitespace; the joining
//! passes match any `char::is_whitespace`, line breaks included.

use memchr::{memchr, memchr3, memchr_iter};
use respace_types::Pass;
use rustc_hash::FxHashSet;

use super::normalizer::NormalizerConfig;

#[inline(always)]
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[inline(always)]
pub(crate) const fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0B' | '\x0C' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

#[inline(always)]
pub(crate) fn is_horizontal_ws(c: char) -> bool {
    c.is_whitespace() && !is_line_break(c)
}

#[inline(always)]
const fn is_spacing_punct(c: char) -> bool {
    matches!(c, '.' | ',' | ';' | ':' | '!' | '?')
}

#[inline(always)]
const fn is_numeric_separator(c: char) -> bool {
    matches!(c, '.' | ',' | ':')
}

/// Returns the char starting at byte offset `i`, if any.
#[inline(always)]
fn char_at(s: &str, i: usize) -> Option<char> {
    s[i..].chars().next()
}

/// Byte offset just past the run of chars matching `pred` that starts at `i`.
#[inline]
fn skip_while(s: &str, i: usize, pred: impl Fn(char) -> bool) -> usize {
    s[i..]
        .char_indices()
        .find(|&(_, c)| !pred(c))
        .map_or(s.len(), |(off, _)| i + off)
}

/// Dispatches `pass` over `input`, writing into `out`.
pub fn run_pass(pass: Pass, config: &NormalizerConfig, input: &str, out: &mut String) {
    match pass {
        Pass::LineEndings => line_endings(input, out),
        Pass::HyphenWrap => hyphen_wrap(input, out),
        Pass::IntraWordSpace => intra_word_space(input, out, &config.protected_words),
        Pass::HyphenSpacing => hyphen_spacing(input, out),
        Pass::PunctuationSpacing => {
            punctuation_spacing(input, out, config.keep_numeric_separators)
        }
        Pass::HorizontalWhitespace => horizontal_whitespace(input, out),
    }
}

/// Rewrites `CRLF` and lone `CR` to `LF`.
pub fn line_endings(input: &str, out: &mut String) {
    out.clear();
    out.reserve(input.len());

    let bytes = input.as_bytes();
    let mut start = 0usize;

    for i in memchr_iter(b'\r', bytes) {
        // `\r` is ASCII, so `i` is always a char boundary.
        out.push_str(&input[start..i]);
        if bytes.get(i + 1) != Some(&b'\n') {
            out.push('\n');
        }
        start = i + 1;
    }

    out.push_str(&input[start..]);
}

/// Joins a hyphenated word wrapped across a line break.
///
/// `word-` + whitespace containing at least one `\n` + `word` collapses to
/// `word-word`. Whitespace after the hyphen without a newline is left alone;
/// that case belongs to [`hyphen_spacing`].
pub fn hyphen_wrap(input: &str, out: &mut String) {
    out.clear();
    if memchr(b'-', input.as_bytes()).is_none() {
        out.push_str(input);
        return;
    }
    out.reserve(input.len());

    let mut prev: Option<char> = None;
    let mut i = 0usize;

    while let Some(c) = char_at(input, i) {
        let next = i + c.len_utf8();

        if c == '-' && prev.is_some_and(is_word_char) {
            if let Some(resume) = wrapped_continuation(input, next) {
                out.push('-');
                prev = Some('-');
                i = resume;
                continue;
            }
        }

        out.push(c);
        prev = Some(c);
        i = next;
    }
}

/// After a hyphen at `from`, finds the offset of the word char that continues
/// the word on the next line.
fn wrapped_continuation(input: &str, from: usize) -> Option<usize> {
    let mut saw_newline = false;

    for (off, c) in input[from..].char_indices() {
        if c == '\n' {
            saw_newline = true;
        } else if !c.is_whitespace() {
            return (saw_newline && is_word_char(c)).then_some(from + off);
        }
    }

    None
}

/// Deletes whitespace that splits a single word.
///
/// A whitespace run between two lowercase letters is dropped when at least one of the
/// adjacent letter runs is a lone letter and neither is a protected
/// single-letter word:
///
/// - `"w ord"` -> `"word"`, `"wor d"` -> `"word"`
/// - `"a lot"` stays (left run is the word `a`)
/// - `"New York"` stays (right side is uppercase)
/// - `"split word"` stays (neither run is a lone letter)
/// - `"w\nord"` -> `"word"` (the run may contain line breaks)
pub fn intra_word_space(input: &str, out: &mut String, protected: &FxHashSet<char>) {
    out.clear();
    out.reserve(input.len());

    let mut i = 0usize;

    while let Some(c) = char_at(input, i) {
        if !c.is_whitespace() {
            out.push(c);
            i += c.len_utf8();
            continue;
        }

        let run_end = skip_while(input, i, char::is_whitespace);
        if splits_word(out, &input[run_end..], protected) {
            i = run_end;
            continue;
        }

        out.push_str(&input[i..run_end]);
        i = run_end;
    }
}

/// Decides whether the whitespace between `left` (already written) and
/// `right` (still to come) sits inside a word.
fn splits_word(left: &str, right: &str, protected: &FxHashSet<char>) -> bool {
    let mut back = left.chars().rev();
    let mut ahead = right.chars();

    let (Some(l), Some(r)) = (back.next(), ahead.next()) else {
        return false;
    };

    if !l.is_lowercase() || !r.is_lowercase() {
        return false;
    }

    let left_lone = !back.next().is_some_and(is_word_char);
    let right_lone = !ahead.next().is_some_and(is_word_char);

    if (left_lone && protected.contains(&l)) || (right_lone && protected.contains(&r)) {
        return false;
    }

    left_lone || right_lone
}

/// Removes whitespace around a hyphen between two word chars.
///
/// `"well - known"`, `"well -known"` and `"well- known"` all become
/// `"well-known"`, as does `"well\n-\nknown"`. A doubled hyphen (`"a--b"`)
/// is left alone.
pub fn hyphen_spacing(input: &str, out: &mut String) {
    out.clear();
    if memchr(b'-', input.as_bytes()).is_none() {
        out.push_str(input);
        return;
    }
    out.reserve(input.len());

    let mut prev: Option<char> = None;
    let mut i = 0usize;

    while let Some(c) = char_at(input, i) {
        if (c == '-' || c.is_whitespace()) && prev.is_some_and(is_word_char) {
            if let Some(resume) = spaced_hyphen(input, i) {
                out.push('-');
                prev = Some('-');
                i = resume;
                continue;
            }
        }

        out.push(c);
        prev = Some(c);
        i += c.len_utf8();
    }
}

/// Matches `\s* '-' \s*` at `from`, followed by a word char.
/// Returns the offset of that word char.
fn spaced_hyphen(input: &str, from: usize) -> Option<usize> {
    let at_hyphen = skip_while(input, from, char::is_whitespace);
    if char_at(input, at_hyphen) != Some('-') {
        return None;
    }

    let resume = skip_while(input, at_hyphen + 1, char::is_whitespace);
    char_at(input, resume)
        .filter(|&c| is_word_char(c))
        .map(|_| resume)
}

/// Inserts one space after `. , ; : ! ?` when the next char is not whitespace.
///
/// With `keep_numeric`, a `.`, `,` or `:` between two ASCII digits is left
/// untouched so `3.14` and `1,000` survive.
pub fn punctuation_spacing(input: &str, out: &mut String, keep_numeric: bool) {
    out.clear();

    let bytes = input.as_bytes();
    if memchr3(b'.', b',', b';', bytes).is_none() && memchr3(b':', b'!', b'?', bytes).is_none() {
        out.push_str(input);
        return;
    }
    out.reserve(input.len() + input.len() / 16);

    let mut prev: Option<char> = None;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        out.push(c);

        if is_spacing_punct(c) {
            if let Some(&next) = chars.peek() {
                let numeric = keep_numeric
                    && is_numeric_separator(c)
                    && prev.is_some_and(|p| p.is_ascii_digit())
                    && next.is_ascii_digit();

                if !next.is_whitespace() && !numeric {
                    out.push(' ');
                }
            }
        }

        prev = Some(c);
    }
}

/// Collapses runs of two or more horizontal whitespace chars to one space.
///
/// A lone tab or other single horizontal space is kept as-is. Line breaks are
/// never touched.
pub fn horizontal_whitespace(input: &str, out: &mut String) {
    out.clear();
    out.reserve(input.len());

    let mut i = 0usize;

    while let Some(c) = char_at(input, i) {
        if !is_horizontal_ws(c) {
            out.push(c);
            i += c.len_utf8();
            continue;
        }

        let run_end = skip_while(input, i, is_horizontal_ws);
        if run_end - i == c.len_utf8() {
            out.push(c);
        } else {
            out.push(' ');
        }
        i = run_end;
    }
}
