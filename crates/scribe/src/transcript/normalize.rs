//! Text normalization applied to every turn body
//!
//! Three passes, applied in this order by the builder: citation markers are
//! resolved to Markdown links, reasoning text is appended, and multi-line
//! display math is put on its own lines.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use super::types::{Citation, Reasoning};

static CITATION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[citation:(\d+)\]").expect("citation marker pattern is valid")
});

static SPACE_BEFORE_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+,").expect("comma cleanup pattern is valid"));

static SPACE_BEFORE_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\.").expect("period cleanup pattern is valid"));

static DISPLAY_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$\$(.*?)\$\$").expect("display math pattern is valid"));

/// Replace `[citation:N]` markers with ` [N](url)` links.
///
/// Only citations with both an index and a non-empty URL are linkable;
/// markers without a match are left exactly as they were. When the turn has
/// no citations at all the body is returned untouched, including its
/// whitespace.
pub fn resolve_citations(body: &str, citations: &[Citation]) -> String {
    if citations.is_empty() {
        return body.to_string();
    }

    let mut lookup: HashMap<u32, &str> = HashMap::new();
    for citation in citations {
        if let (Some(index), Some(url)) = (citation.index, citation.url.as_deref()) {
            if !url.is_empty() {
                lookup.insert(index, url);
            }
        }
    }

    let linked = CITATION_MARKER.replace_all(body, |caps: &regex::Captures<'_>| {
        let number = &caps[1];
        match number.parse::<u32>().ok().and_then(|n| lookup.get(&n)) {
            Some(url) => format!(" [{number}]({url})"),
            None => caps[0].to_string(),
        }
    });

    let linked = SPACE_BEFORE_COMMA.replace_all(&linked, ",");
    SPACE_BEFORE_PERIOD.replace_all(&linked, ".").into_owned()
}

/// Append reasoning text under a bold label.
pub fn merge_reasoning(body: &str, reasoning: Option<&Reasoning>) -> String {
    let Some(reasoning) = reasoning.filter(|r| !r.text.is_empty()) else {
        return body.to_string();
    };

    let label = match reasoning.elapsed_secs.filter(|secs| *secs > 0.0) {
        Some(secs) => format!("**Thinking Process ({secs}s):**"),
        None => "**Thinking Process:**".to_string(),
    };

    format!("{body}\n\n{label}\n{}", reasoning.text)
}

/// Put the delimiters of multi-line `$$ … $$` spans on their own lines.
///
/// Single-line spans stay inline. Already-separated spans come out
/// unchanged, so the pass is idempotent.
pub fn reformat_display_math(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;

    for caps in DISPLAY_MATH.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let inner = &caps[1];

        out.push_str(&text[last..whole.start()]);
        last = whole.end();

        if !inner.contains('\n') {
            out.push_str(whole.as_str());
            continue;
        }

        if whole.start() > 0 && !text[..whole.start()].ends_with('\n') {
            out.push('\n');
        }
        out.push_str("$$\n");
        out.push_str(inner.trim_matches(|c| c == '\n' || c == '\r'));
        out.push_str("\n$$");
        if whole.end() < text.len() && !text[whole.end()..].starts_with('\n') {
            out.push('\n');
        }
    }

    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cite(index: Option<u32>, url: Option<&str>) -> Citation {
        Citation {
            index,
            url: url.map(str::to_string),
        }
    }

    #[test]
    fn test_resolve_citations_links_known_and_keeps_unknown() {
        let citations = vec![cite(Some(1), Some("https://a")), cite(Some(2), None)];
        let out = resolve_citations("see [citation:1] and [citation:2]", &citations);
        assert_eq!(out, "see  [1](https://a) and [citation:2]");
    }

    #[test]
    fn test_resolve_citations_skips_null_index() {
        let citations = vec![cite(None, Some("https://a")), cite(Some(3), Some("https://c"))];
        let out = resolve_citations("x [citation:1] y [citation:3]", &citations);
        assert_eq!(out, "x [citation:1] y  [3](https://c)");
    }

    #[test]
    fn test_resolve_citations_collapses_space_before_punctuation() {
        let citations = vec![cite(Some(1), Some("https://a"))];
        let out = resolve_citations("Rust is fast [citation:1] , and safe [citation:1] .", &citations);
        assert_eq!(out, "Rust is fast  [1](https://a), and safe  [1](https://a).");
    }

    #[test]
    fn test_resolve_citations_without_results_is_identity() {
        let body = "spaced , out . [citation:1]";
        assert_eq!(resolve_citations(body, &[]), body);
    }

    #[test]
    fn test_resolve_citations_ignores_empty_url() {
        let citations = vec![cite(Some(1), Some(""))];
        assert_eq!(resolve_citations("a[citation:1]", &citations), "a[citation:1]");
    }

    #[test]
    fn test_resolve_citations_leading_zeros() {
        let citations = vec![cite(Some(7), Some("https://g"))];
        assert_eq!(
            resolve_citations("x[citation:07]", &citations),
            "x [07](https://g)"
        );
    }

    #[test]
    fn test_merge_reasoning_with_duration() {
        let reasoning = Reasoning {
            text: "let me think".to_string(),
            elapsed_secs: Some(12.0),
        };
        assert_eq!(
            merge_reasoning("answer", Some(&reasoning)),
            "answer\n\n**Thinking Process (12s):**\nlet me think"
        );
    }

    #[test]
    fn test_merge_reasoning_without_duration() {
        let reasoning = Reasoning {
            text: "hmm".to_string(),
            elapsed_secs: None,
        };
        assert_eq!(
            merge_reasoning("answer", Some(&reasoning)),
            "answer\n\n**Thinking Process:**\nhmm"
        );

        let zero = Reasoning {
            text: "hmm".to_string(),
            elapsed_secs: Some(0.0),
        };
        assert_eq!(
            merge_reasoning("answer", Some(&zero)),
            "answer\n\n**Thinking Process:**\nhmm"
        );
    }

    #[test]
    fn test_merge_reasoning_empty_text_is_ignored() {
        let reasoning = Reasoning {
            text: String::new(),
            elapsed_secs: Some(3.0),
        };
        assert_eq!(merge_reasoning("answer", Some(&reasoning)), "answer");
        assert_eq!(merge_reasoning("answer", None), "answer");
    }

    #[test]
    fn test_math_already_on_own_lines_is_unchanged() {
        assert_eq!(reformat_display_math("$$\na=b\n$$"), "$$\na=b\n$$");
    }

    #[test]
    fn test_math_single_line_stays_inline() {
        assert_eq!(reformat_display_math("so $$a=b$$ holds"), "so $$a=b$$ holds");
    }

    #[test]
    fn test_math_multiline_gets_own_lines() {
        assert_eq!(
            reformat_display_math("so $$a=b\nc=d$$ holds"),
            "so \n$$\na=b\nc=d\n$$\n holds"
        );
    }

    #[test]
    fn test_math_reformat_is_idempotent() {
        let once = reformat_display_math("x $$a\nb$$ y and $$c$$");
        assert_eq!(reformat_display_math(&once), once);
    }

    #[test]
    fn test_math_unterminated_span_is_untouched() {
        assert_eq!(reformat_display_math("cost $$5\nmore"), "cost $$5\nmore");
    }
}
