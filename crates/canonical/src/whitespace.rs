//! Whitespace and line normalization for recognized text.
//!
//! OCR engines return text with ragged spacing: runs of spaces and tabs where
//! columns were, blank lines padded with spaces, and long stretches of empty
//! lines between blocks. [`normalize_text`] cleans that up while keeping the
//! paragraph structure.
//!
//! # Algorithm
//!
//! 1. Collapse every run of spaces/tabs into a single ASCII space
//! 2. Trim whitespace from both ends of every line
//! 3. Collapse three or more consecutive `\n` into exactly two
//! 4. Trim whitespace from both ends of the whole text
//!
//! Line trimming happens before the line-break collapse so that blank lines
//! made of spaces cannot reappear as a run of breaks on a second pass. That
//! ordering is what makes the function idempotent.
//!
//! # Examples
//!
//! ```rust
//! use canonical::normalize_text;
//!
//! assert_eq!(normalize_text("Hello\n\n\n\nWorld"), "Hello\n\nWorld");
//! assert_eq!(normalize_text("  a \t b  \n c "), "a b\nc");
//! ```

/// Normalize OCR output. Deterministic and idempotent; empty input yields an
/// empty string.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let collapsed = collapse_horizontal(text);

    let mut trimmed = String::with_capacity(collapsed.len());
    for (idx, line) in collapsed.split('\n').enumerate() {
        if idx > 0 {
            trimmed.push('\n');
        }
        trimmed.push_str(line.trim());
    }

    collapse_line_breaks(&trimmed).trim().to_string()
}

/// Replaces each run of `' '` / `'\t'` with one space.
fn collapse_horizontal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for ch in text.chars() {
        if ch == ' ' || ch == '\t' {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

/// Caps consecutive `'\n'` at two.
fn collapse_line_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut breaks = 0usize;
    for ch in text.chars() {
        if ch == '\n' {
            breaks += 1;
            if breaks <= 2 {
                out.push(ch);
            }
        } else {
            breaks = 0;
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_excess_line_breaks() {
        assert_eq!(normalize_text("Hello\n\n\n\nWorld"), "Hello\n\nWorld");
        assert_eq!(normalize_text("a\n\n\nb"), "a\n\nb");
        assert_eq!(normalize_text("a\n\nb"), "a\n\nb");
        assert_eq!(normalize_text("a\nb"), "a\nb");
    }

    #[test]
    fn collapses_horizontal_runs() {
        assert_eq!(normalize_text("hello   world"), "hello world");
        assert_eq!(normalize_text("hello\t\t world"), "hello world");
        assert_eq!(normalize_text("a\tb"), "a b");
    }

    #[test]
    fn trims_every_line() {
        assert_eq!(normalize_text("  first  \n\t second\t"), "first\nsecond");
        assert_eq!(normalize_text("line\r\nnext"), "line\nnext");
    }

    #[test]
    fn trims_whole_text() {
        assert_eq!(normalize_text("\n\n  text  \n\n"), "text");
        assert_eq!(normalize_text("   \n\t\n  "), "");
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn whitespace_only_lines_do_not_leave_break_runs() {
        assert_eq!(normalize_text("a\n \n \nb"), "a\n\nb");
        assert_eq!(normalize_text("a\n\t\n\n  \n\nb"), "a\n\nb");
    }

    #[test]
    fn idempotent_over_samples() {
        let samples = [
            "",
            " ",
            "Hello\n\n\n\nWorld",
            "a\n \n \nb",
            "  x\t\ty  \n\n\n z ",
            "Invoice #42\n\n\n\tTotal:   $10.00\t\n",
            "\u{00A0}nbsp\u{00A0}",
            "emoji \u{1f600}   test\n\n\n\n\n",
            "\r\n\r\n\r\n",
        ];
        for sample in samples {
            let once = normalize_text(sample);
            let twice = normalize_text(&once);
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn preserves_inner_unicode() {
        assert_eq!(normalize_text("caf\u{00E9}  na\u{00EF}ve"), "caf\u{00E9} na\u{00EF}ve");
    }
}
