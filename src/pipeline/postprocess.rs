//! Post-processing: deterministic cleanup of text extracted from PDF pages.
//!
//! pdfium returns text the way it is laid out on the page, not the way it
//! reads. The artefacts are predictable:
//!
//! - `\r\n` or bare `\r` line endings, depending on the producer
//! - trailing spaces where justified lines were padded
//! - words split across lines with a hyphen (`docu-\nment`)
//! - invisible Unicode (soft hyphens, zero-width spaces, BOMs)
//! - long runs of empty lines where figures or whitespace used to be
//!
//! Each rule is a pure `&str → String` function. They run in a fixed order:
//! line endings first so every later rule can assume `\n`, and the final
//! newline last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to the text of one page.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 3. Trim trailing whitespace per line
/// 4. Re-join words hyphenated across a line break
/// 5. Collapse 3+ consecutive blank lines down to 1
/// 6. Ensure the text ends with exactly one newline
pub fn clean_page_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = join_hyphenated_words(&s);
    let s = collapse_blank_lines(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Re-join hyphenated words ─────────────────────────────────────────
//
// Only a lowercase letter after the break counts: "Jean-\nPaul" and
// "pre-\n2020" keep their hyphen.

static RE_HYPHEN_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\p{L})-\n[ \t]*(\p{Ll})").unwrap());

fn join_hyphenated_words(input: &str) -> String {
    RE_HYPHEN_BREAK.replace_all(input, "$1$2").to_string()
}

// ── Rule 5: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule 6: Ensure single final newline ──────────────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "hello\u{200B}world\u{FEFF}foo\u{00AD}bar";
        assert_eq!(remove_invisible_chars(input), "helloworldfoobar");
    }

    #[test]
    fn test_trim_trailing_whitespace() {
        assert_eq!(
            trim_trailing_whitespace("  hello   \nworld  "),
            "  hello\nworld"
        );
    }

    #[test]
    fn test_join_hyphenated_words() {
        assert_eq!(join_hyphenated_words("docu-\nment"), "document");
        assert_eq!(join_hyphenated_words("docu-\n  ment"), "document");
    }

    #[test]
    fn test_keep_meaningful_hyphens() {
        assert_eq!(join_hyphenated_words("Jean-\nPaul"), "Jean-\nPaul");
        assert_eq!(join_hyphenated_words("pre-\n2020"), "pre-\n2020");
        assert_eq!(join_hyphenated_words("- item\n- item"), "- item\n- item");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_ensure_final_newline() {
        assert_eq!(ensure_final_newline("hello"), "hello\n");
        assert_eq!(ensure_final_newline("hello\n\n\n"), "hello\n");
    }

    #[test]
    fn blank_page_cleans_to_empty() {
        assert_eq!(clean_page_text("  \r\n\u{200B}\n \n"), "");
    }

    #[test]
    fn test_clean_page_text_full_pipeline() {
        let input = "Hello World   \r\n\r\n\r\n\r\nThis is a docu-\r\nment.\u{00AD}";
        assert_eq!(clean_page_text(input), "Hello World\n\nThis is a document.\n");
    }
}
