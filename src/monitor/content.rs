// src/monitor/content.rs

//! Bounded, lossy visible-text snapshot of a page.
//!
//! Deterministic and pure given the markup: non-content subtrees are
//! discarded, remaining tags stripped, whitespace collapsed, and the result
//! truncated. Exact extraction fidelity is explicitly not a goal.

use once_cell::sync::Lazy;
use regex::Regex;

/// Elements whose entire subtree carries no page content.
const DISCARD_ELEMENTS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "iframe", "noscript",
];

// The regex engine has no backreferences, so each discarded element gets its
// own open-to-close pattern, compiled once.
static DISCARD_SUBTREES: Lazy<Vec<Regex>> = Lazy::new(|| {
    DISCARD_ELEMENTS
        .iter()
        .map(|el| {
            Regex::new(&format!(r"(?is)<{el}\b[^>]*>.*?</{el}\s*>"))
                .expect("static element pattern")
        })
        .collect()
});

static COMMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static pattern"));
static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("static pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static pattern"));

/// Extract the visible text of `html`, truncated to `max_chars` characters.
pub fn extract_page_text(html: &str, max_chars: usize) -> String {
    let mut text = COMMENTS.replace_all(html, " ").into_owned();
    for pattern in DISCARD_SUBTREES.iter() {
        text = pattern.replace_all(&text, " ").into_owned();
    }
    let text = TAGS.replace_all(&text, " ");
    let text = decode_entities(&text);
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().chars().take(max_chars).collect()
}

/// The handful of entities that actually show up in body text.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_non_content_subtrees() {
        let html = r#"
            <header class="site">Site chrome</header>
            <nav><a href="/">Home</a></nav>
            <p>Actual article text.</p>
            <script type="text/javascript">let x = "<p>not text</p>";</script>
            <style>p { color: red; }</style>
            <iframe src="https://ads.test/"></iframe>
            <noscript>Enable JS</noscript>
            <footer>© somebody</footer>
        "#;

        assert_eq!(extract_page_text(html, 500), "Actual article text.");
    }

    #[test]
    fn strips_tags_but_keeps_their_text() {
        let html = "<div><p>Hello <b>bold</b> world</p><span>and more</span></div>";
        assert_eq!(extract_page_text(html, 500), "Hello bold world and more");
    }

    #[test]
    fn collapses_whitespace_runs() {
        let html = "<p>spaced\n\n\t  out\r\n text</p>";
        assert_eq!(extract_page_text(html, 500), "spaced out text");
    }

    #[test]
    fn decodes_common_entities() {
        let html = "<p>a&nbsp;&amp;&nbsp;b &lt;tag&gt; &quot;q&quot; it&#39;s</p>";
        assert_eq!(extract_page_text(html, 500), "a & b <tag> \"q\" it's");
    }

    #[test]
    fn truncates_to_the_character_budget() {
        let html = format!("<p>{}</p>", "x".repeat(2000));
        let text = extract_page_text(&html, 500);
        assert_eq!(text.chars().count(), 500);
    }

    #[test]
    fn truncation_respects_multibyte_boundaries() {
        let html = format!("<p>{}</p>", "ü".repeat(600));
        let text = extract_page_text(&html, 500);
        assert_eq!(text.chars().count(), 500);
        assert!(text.chars().all(|c| c == 'ü'));
    }

    #[test]
    fn element_matching_is_case_insensitive() {
        let html = "<SCRIPT>alert(1)</SCRIPT><P>kept</P>";
        assert_eq!(extract_page_text(html, 500), "kept");
    }

    #[test]
    fn drops_html_comments() {
        let html = "<p>before</p><!-- hidden --><p>after</p>";
        assert_eq!(extract_page_text(html, 500), "before after");
    }

    #[test]
    fn empty_input_yields_empty_snapshot() {
        assert_eq!(extract_page_text("", 500), "");
        assert_eq!(extract_page_text("<div></div>", 500), "");
    }
}
