//! Property tests for the report sanitizer.
//!
//! Inputs are built from a fixed set of tokens that reproduce what deep
//! research output actually contains: prose, exotic spaces, invisible
//! format characters, dash glyphs, punctuation, links with text fragments
//! and bare URLs.

use dd_checklist::{clean_url, normalize, sanitize};
use proptest::prelude::*;

const TOKENS: &[&str] = &[
    "alpha",
    "Beta",
    "42",
    "snake_case",
    "café",
    "e\u{0301}",
    " ",
    "   ",
    "\t",
    "\n",
    "-",
    "\u{2013}",
    "\u{2014}",
    "\u{2012}",
    "\u{00A0}",
    "\u{202F}",
    "\u{2009}",
    "\u{3000}",
    "\u{200B}",
    "\u{200D}",
    "\u{2060}",
    "\u{FEFF}",
    "\u{202E}",
    "\u{00AD}",
    ".",
    ",",
    "!",
    " ;",
    "[doc](https://x.io/a\u{2013}b#:~:text=z)",
    "[ref]( https://x.io/p . )",
    "[r](/p#:~:te xt=z)",
    "https://x.io/p",
    "http://y.org/q\u{2014}r.",
];

const FORBIDDEN: &[char] = &[
    '\u{00A0}', '\u{202F}', '\u{2009}', '\u{3000}', '\u{200B}', '\u{200D}', '\u{2060}',
    '\u{FEFF}', '\u{202E}', '\u{00AD}',
];

fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(TOKENS), 0..24).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn sanitize_is_idempotent(s in text()) {
        let once = sanitize(&s);
        prop_assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn normalize_is_idempotent(s in text()) {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn sanitize_removes_exotic_and_invisible_chars(s in text()) {
        let out = sanitize(&s);
        for c in FORBIDDEN {
            prop_assert!(!out.contains(*c), "U+{:04X} survived in {:?}", *c as u32, out);
        }
        prop_assert!(!out.contains("  "), "double space in {:?}", out);
        prop_assert!(!out.contains("#:~:text="), "text fragment in {:?}", out);
    }

    #[test]
    fn clean_url_output_is_canonical(s in text()) {
        let url = format!("https://x.io/{s}");
        let out = clean_url(&url);
        prop_assert!(!out.chars().any(char::is_whitespace), "whitespace in {:?}", out);
        prop_assert!(!out.contains(['\u{2013}', '\u{2014}', '\u{2012}', '\u{00AD}']), "dash or soft hyphen in {:?}", out);
        prop_assert!(!out.ends_with(['.', ',', ';', ':', '!', '?', ')']));
        prop_assert_eq!(clean_url(&out), out);
    }

    #[test]
    fn sanitize_never_panics_on_arbitrary_text(s in any::<String>()) {
        let _ = sanitize(&s);
    }
}
