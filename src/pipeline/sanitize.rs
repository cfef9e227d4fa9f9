//! Sanitisation: deterministic cleanup of research-model Markdown.
//!
//! ## Why is sanitisation necessary?
//!
//! Deep-research output is assembled from web pages the model has read, and
//! it drags their typographic debris along with it:
//!
//! - Full-width letters, ligatures and other compatibility code points
//! - Non-breaking and fixed-width spaces copied from HTML
//! - Zero-width and bidi control characters that silently fuse two words
//! - Links pasted with a `#:~:text=` highlight fragment, an en dash in the
//!   path, or the sentence's full stop glued to the end
//!
//! None of these are visible in a rendered report, but they break search,
//! copy/paste and clicking. The rules below repair them without touching
//! content.
//!
//! ## Rule Order
//!
//! Normalise the whole document first, then rewrite Markdown link targets,
//! then rewrite bare URLs. Cleaning URLs before normalisation would leave
//! compatibility characters inside them unflattened.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Apply the full sanitisation pipeline to research-model output.
///
/// `sanitize_bare_urls(sanitize_links(normalize(text)))`. Pure and
/// idempotent: running it on its own output changes nothing.
pub fn sanitize(model_output: &str) -> String {
    let s = normalize(model_output);
    let s = sanitize_links(&s);
    sanitize_bare_urls(&s)
}

// ── Character sets ───────────────────────────────────────────────────────────

/// Space code points that render like a space but are not U+0020.
const EXOTIC_SPACES: [char; 17] = [
    '\u{00A0}', '\u{1680}', '\u{180E}', '\u{2000}', '\u{2001}', '\u{2002}', '\u{2003}',
    '\u{2004}', '\u{2005}', '\u{2006}', '\u{2007}', '\u{2008}', '\u{2009}', '\u{200A}',
    '\u{202F}', '\u{205F}', '\u{3000}',
];

const SOFT_HYPHEN: char = '\u{00AD}';

/// Zero-width and bidirectional control characters.
fn is_invisible_control(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}'
            | '\u{2060}'
            | '\u{FEFF}'
            | '\u{061C}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2066}'..='\u{2069}'
    )
}

/// Characters that bind to their neighbours like letters do.
///
/// Combining marks count, so a zero-width run after an accented letter
/// still bridges to a space. Join_Control (ZWJ/ZWNJ) does not count, even
/// though the dash rule's `\w` matches it; those characters are gone by the
/// time the dash rule runs.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || is_combining_mark(c)
}

/// Dash glyphs folded to `-` inside URLs.
fn is_url_dash(c: char) -> bool {
    matches!(
        c,
        '-' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}'
    )
}

// ── Text normaliser ──────────────────────────────────────────────────────────

/// Flatten exotic Unicode, keep word boundaries, and fix dash and
/// punctuation spacing.
///
/// Rules (applied in order):
/// 1. NFKC compatibility normalisation
/// 2. Exotic spaces → ASCII space
/// 3. Zero-width/bidi runs between two word characters → one space
/// 4. Remaining zero-width/bidi controls removed
/// 5. Soft hyphens removed
/// 6. Dash used as a separator between word-ish tokens → `" - "`
/// 7. Runs of spaces/tabs collapsed
/// 8. Spaces before `,.;:!?` removed
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let s: String = text.nfkc().collect();
    let s = replace_exotic_spaces(&s);
    let s = bridge_invisible_controls(&s);
    let s = s.replace(SOFT_HYPHEN, "");
    let s = space_separator_dashes(&s);
    let s = RE_HORIZONTAL_RUN.replace_all(&s, " ");
    RE_SPACE_BEFORE_PUNCT.replace_all(&s, "$1").into_owned()
}

fn replace_exotic_spaces(input: &str) -> String {
    input.replace(EXOTIC_SPACES, " ")
}

// Rules 3 and 4 in one pass. A regex lookbehind would treat U+200C/U+200D as
// `\w` (they are Join_Control), so runs are delimited by hand.
fn bridge_invisible_controls(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev: Option<char> = None;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if !is_invisible_control(c) {
            out.push(c);
            prev = Some(c);
            continue;
        }
        while chars.peek().copied().is_some_and(is_invisible_control) {
            chars.next();
        }
        let before = prev.is_some_and(is_word_char);
        let after = chars.peek().copied().is_some_and(is_word_char);
        if before && after {
            out.push(' ');
            prev = Some(' ');
        }
    }
    out
}

// Lookbehind sees the character before the dash, lookahead the one after;
// neither is consumed, so `a-b-c` spaces both dashes.
static RE_SEPARATOR_DASH: Lazy<fancy_regex::Regex> = Lazy::new(|| {
    fancy_regex::Regex::new("(?<=[\\w\\)\\]])[\\-\u{2012}\u{2013}\u{2014}](?=[\\w\\(\\[])").unwrap()
});

/// Rule 6. Dashes inside a bare URL are left alone so a second pass over
/// sanitised output cannot split a link that the first pass produced.
fn space_separator_dashes(input: &str) -> String {
    let urls = url_spans(input);
    RE_SEPARATOR_DASH
        .replace_all(input, |caps: &fancy_regex::Captures<'_>| match caps.get(0) {
            Some(m) if urls.iter().any(|span| span.contains(&m.start())) => m.as_str().to_string(),
            Some(m) => format!(" {} ", m.as_str()),
            None => String::new(),
        })
        .into_owned()
}

fn url_spans(input: &str) -> Vec<Range<usize>> {
    RE_BARE_URL.find_iter(input).map(|m| m.range()).collect()
}

static RE_HORIZONTAL_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

static RE_SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r" +([,.;:!?])").unwrap());

// ── URL canonicaliser ────────────────────────────────────────────────────────

// `(?s)` so a fragment split across lines is still cut to the end.
static RE_TEXT_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)#\s*:\s*~\s*:\s*text\s*=.*$").unwrap());

static RE_TRAILING_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[),.;:!?]+$").unwrap());

/// Canonicalise one URL for use as a hyperlink target.
///
/// Drops a `#:~:text=` fragment, removes every whitespace character and soft
/// hyphen, folds dash glyphs to `-`, and trims trailing punctuation picked up
/// from the surrounding sentence.
pub fn clean_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    let u: String = url.nfkc().collect();
    let u = RE_TEXT_FRAGMENT.replace(&u, "");
    let u: String = u
        .chars()
        .filter(|c| !c.is_whitespace() && *c != SOFT_HYPHEN)
        .map(|c| if is_url_dash(c) { '-' } else { c })
        .collect();
    // Removing whitespace can join a split `te xt=` into a live fragment.
    let u = RE_TEXT_FRAGMENT.replace(&u, "");
    RE_TRAILING_PUNCT.replace(&u, "").into_owned()
}

// ── Link/URL sweep ───────────────────────────────────────────────────────────

static RE_MD_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());

static RE_BARE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s)\]}>]+").unwrap());

/// Rewrite every `[label](url)` with a canonical target. Labels are left
/// exactly as they are.
pub fn sanitize_links(md: &str) -> String {
    RE_MD_LINK
        .replace_all(md, |caps: &regex::Captures<'_>| {
            format!("[{}]({})", &caps[1], clean_url(&caps[2]))
        })
        .into_owned()
}

/// Rewrite every bare `http(s)://` URL in free text.
///
/// A URL ends at whitespace or at `)`, `]`, `}` or `>`, so closing brackets
/// in prose stay outside it. Link targets already cleaned by
/// [`sanitize_links`] match again harmlessly.
pub fn sanitize_bare_urls(md: &str) -> String {
    RE_BARE_URL
        .replace_all(md, |caps: &regex::Captures<'_>| clean_url(&caps[0]))
        .into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_width_between_words_becomes_space() {
        assert_eq!(normalize("wordA\u{200B}wordb"), "wordA wordb");
    }

    #[test]
    fn test_leading_zero_width_is_deleted() {
        assert_eq!(normalize("\u{200B}leading"), "leading");
    }

    #[test]
    fn test_control_run_collapses_to_one_space() {
        assert_eq!(normalize("left\u{200E}\u{2066}\u{FEFF}right"), "left right");
    }

    #[test]
    fn test_joiner_run_at_start_is_deleted() {
        assert_eq!(normalize("\u{200C}\u{200D}word"), "word");
    }

    #[test]
    fn test_control_before_punctuation_is_deleted() {
        assert_eq!(normalize("end\u{200B}."), "end.");
    }

    #[test]
    fn test_exotic_spaces_become_ascii() {
        for sp in EXOTIC_SPACES {
            let input = format!("a{sp}b");
            assert_eq!(normalize(&input), "a b", "U+{:04X}", sp as u32);
        }
    }

    #[test]
    fn test_nfkc_flattens_compatibility_forms() {
        assert_eq!(normalize("ＡＢＣ ﬁnance"), "ABC finance");
    }

    #[test]
    fn test_soft_hyphen_removed() {
        assert_eq!(normalize("diligen\u{00AD}ce"), "diligence");
    }

    #[test]
    fn test_dash_spacing() {
        assert_eq!(normalize("Revenue-growth"), "Revenue - growth");
        assert_eq!(normalize("2019–2023"), "2019 – 2023");
        assert_eq!(normalize("(EU)—[US]"), "(EU) — [US]");
        assert_eq!(normalize("a-b-c"), "a - b - c");
    }

    #[test]
    fn test_dash_with_space_untouched() {
        assert_eq!(normalize("Revenue - growth"), "Revenue - growth");
        assert_eq!(normalize("- bullet"), "- bullet");
        assert_eq!(normalize("---"), "---");
    }

    #[test]
    fn test_compound_words_are_spaced() {
        // Heuristic kept as-is: hyphenated compounds gain spaces too.
        assert_eq!(normalize("well-known"), "well - known");
    }

    #[test]
    fn test_dash_inside_url_untouched() {
        assert_eq!(
            normalize("see https://example.com/a-b now"),
            "see https://example.com/a-b now"
        );
    }

    #[test]
    fn test_collapse_spaces_and_punctuation() {
        assert_eq!(normalize("a  \t b"), "a b");
        assert_eq!(normalize("Hello , world !"), "Hello, world!");
    }

    #[test]
    fn test_newlines_preserved() {
        assert_eq!(normalize("# Title\n\n- item\n"), "# Title\n\n- item\n");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(clean_url(""), "");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_clean_url_text_fragment() {
        assert_eq!(
            clean_url("https://example.com/path#:~:text=foo%20bar"),
            "https://example.com/path"
        );
        assert_eq!(
            clean_url("https://example.com/path# : ~ : TEXT = foo"),
            "https://example.com/path"
        );
    }

    #[test]
    fn test_clean_url_trailing_punctuation() {
        assert_eq!(clean_url("https://example.com/page."), "https://example.com/page");
        assert_eq!(clean_url("https://example.com/page);"), "https://example.com/page");
    }

    #[test]
    fn test_clean_url_whitespace_and_dashes() {
        assert_eq!(clean_url("https://exa mple.com/a–b"), "https://example.com/a-b");
        assert_eq!(
            clean_url("https://ex\u{00AD}ample.com/x\u{2212}y\u{2011}z"),
            "https://example.com/x-y-z"
        );
    }

    #[test]
    fn test_markdown_link_target_cleaned() {
        assert_eq!(
            sanitize_links("[Report](https://example.com/page.)"),
            "[Report](https://example.com/page)"
        );
    }

    #[test]
    fn test_markdown_link_label_untouched() {
        assert_eq!(
            sanitize_links("[Ｒeport\u{200B}](https://example.com)"),
            "[Ｒeport\u{200B}](https://example.com)"
        );
    }

    #[test]
    fn test_bare_url_stops_at_bracket() {
        assert_eq!(
            sanitize_bare_urls("See https://example.com/foo), it helps."),
            "See https://example.com/foo), it helps."
        );
    }

    #[test]
    fn test_bare_url_sentence_period() {
        assert_eq!(
            sanitize_bare_urls("Source: https://example.com/report."),
            "Source: https://example.com/report"
        );
    }

    #[test]
    fn test_plain_text_unchanged() {
        let input = "## Market Opportunity\n\nThe market is large and growing.\n";
        assert_eq!(sanitize(input), input);
    }

    #[test]
    fn test_full_pipeline() {
        let input = "Key\u{00A0}risks\u{200B}include churn (see [source](https://exa mple.com/a–b.)).\nMore at https://example.org/x#:~:text=churn";
        let out = sanitize(input);
        assert_eq!(
            out,
            "Key risks include churn (see [source](https://example.com/a-b)).\nMore at https://example.org/x"
        );
    }

    #[test]
    fn test_clean_url_drops_fragment_split_by_whitespace() {
        assert_eq!(clean_url("https://example.com/p#:~:te xt=foo"), "https://example.com/p");
        assert_eq!(clean_url("https://example.com/p#:~:te\u{AD}xt=foo"), "https://example.com/p");
        let once = clean_url("/p#:~: te xt = foo.");
        assert_eq!(once, "/p");
        assert_eq!(clean_url(&once), once);
    }

    #[test]
    fn test_relative_link_fragment_is_stable() {
        let once = sanitize("[a](/p#:~:te xt=foo)");
        assert_eq!(once, "[a](/p)");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_combining_mark_counts_as_word_char() {
        assert_eq!(normalize("x\u{301}\u{200B}b"), "x\u{301} b");
    }

    #[test]
    fn test_sanitize_idempotent_on_samples() {
        let samples = [
            "Revenue-growth was 2019–2023 (see [a](https://x.com/a-b.)).",
            "https://exa\u{200B}mple.com/p–q, and more",
            "[l](a - b) then [m](x\ny)",
            "tab\t. space . https://a.com/. .",
        ];
        for s in samples {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once, "input: {s:?}");
        }
    }
}
