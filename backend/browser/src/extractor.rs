//! Content Extractor
//!
//! Turns a noisy host document into one line of readable text. Extraction is
//! an ordered chain of [`ExtractionStrategy`] values; the first one that
//! reports [`ExtractionOutcome::Success`] wins. Ordinary pages use semantic
//! content containers with a whole-body fallback, fixed-layout viewers use
//! the chain in [`crate::paginated`].

use once_cell::sync::Lazy;
use tracing::debug;

use crate::document::PageDocument;
use crate::element_query::SelectorList;
use crate::paginated;

/// Content containers, tried in this order.
pub const SEMANTIC_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=\"main\"]",
    ".main-content",
    ".article-content",
    ".post-content",
    ".entry-content",
    "#content",
    ".content",
];

/// Noise stripped from a matched content container.
const CONTAINER_NOISE: &str =
    "script, style, noscript, nav, header, footer, aside, .sidebar, .menu, .advertisement, .ad";

/// Noise stripped from the body when no container was good enough.
const BODY_NOISE: &str = "script, style, noscript, nav, header, footer, aside, \
     .nav, .navbar, .navigation, .menu, .sidebar, .header, .footer, \
     .advertisement, .ad, .ads, .promo, .social, .share, \
     .comments, .related, .recommended";

static SEMANTIC: Lazy<Vec<SelectorList>> = Lazy::new(|| {
    SEMANTIC_SELECTORS
        .iter()
        .map(|s| SelectorList::parse(s).expect("valid semantic selector"))
        .collect()
});
static CONTAINER_NOISE_SEL: Lazy<SelectorList> =
    Lazy::new(|| SelectorList::parse(CONTAINER_NOISE).expect("valid noise selector"));
static BODY_NOISE_SEL: Lazy<SelectorList> =
    Lazy::new(|| SelectorList::parse(BODY_NOISE).expect("valid noise selector"));

/// Size thresholds for the extractor boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionLimits {
    /// Text handed downstream is capped at this many chars.
    pub max_content_chars: usize,
    /// A content container must exceed this to be accepted.
    pub min_semantic_chars: usize,
    /// Select-all text in a viewer must exceed this to be accepted.
    pub min_selection_chars: usize,
    pub max_questions: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_content_chars: 5000,
            min_semantic_chars: 200,
            min_selection_chars: 100,
            max_questions: 5,
        }
    }
}

/// What a single strategy made of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Success(String),
    /// Something was found but not enough of it.
    Insufficient,
    /// The strategy could not run (e.g. blocked by an origin boundary).
    Failed(String),
}

pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn try_extract(&self, document: &PageDocument) -> ExtractionOutcome;
}

/// Collapse whitespace runs to single spaces and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max` chars.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Walks [`SEMANTIC_SELECTORS`] and accepts the first long-enough container.
pub struct SemanticContainerStrategy {
    min_chars: usize,
}

impl SemanticContainerStrategy {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }
}

impl ExtractionStrategy for SemanticContainerStrategy {
    fn name(&self) -> &'static str {
        "semantic-container"
    }

    fn try_extract(&self, document: &PageDocument) -> ExtractionOutcome {
        for selector in SEMANTIC.iter() {
            let Some(element) = document.query_selector(selector) else {
                continue;
            };
            let mut clone = element.clone();
            clone.remove_matching(&CONTAINER_NOISE_SEL);
            // Length is measured on the rendered text before whitespace
            // runs are collapsed.
            let rendered = clone.inner_text();
            let len = rendered.trim().chars().count();
            if len > self.min_chars {
                debug!(selector = selector.as_str(), chars = len, "Content container accepted");
                return ExtractionOutcome::Success(normalize_whitespace(&rendered));
            }
            debug!(selector = selector.as_str(), chars = len, "Content container too short");
        }
        ExtractionOutcome::Insufficient
    }
}

/// Whole body minus navigation, ads, social and related-content blocks.
pub struct CleanBodyStrategy;

impl ExtractionStrategy for CleanBodyStrategy {
    fn name(&self) -> &'static str {
        "clean-body"
    }

    fn try_extract(&self, document: &PageDocument) -> ExtractionOutcome {
        let mut body = document.body().clone();
        body.remove_matching(&BODY_NOISE_SEL);
        let text = normalize_whitespace(&body.inner_text());
        if text.is_empty() {
            ExtractionOutcome::Insufficient
        } else {
            ExtractionOutcome::Success(text)
        }
    }
}

pub struct ContentExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl ContentExtractor {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Chain for flowing-text pages.
    pub fn standard(limits: &ExtractionLimits) -> Self {
        Self::new(vec![
            Box::new(SemanticContainerStrategy::new(limits.min_semantic_chars)),
            Box::new(CleanBodyStrategy),
        ])
    }

    /// Pick the chain that fits the document.
    pub fn for_document(document: &PageDocument, limits: &ExtractionLimits) -> Self {
        if paginated::is_paginated_viewer(document) {
            debug!(locator = document.locator(), "Paginated viewer detected");
            paginated::paginated_extractor(limits)
        } else {
            Self::standard(limits)
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the chain; `None` when no strategy succeeded.
    pub fn run(&self, document: &PageDocument) -> Option<String> {
        for strategy in &self.strategies {
            match strategy.try_extract(document) {
                ExtractionOutcome::Success(text) => {
                    debug!(strategy = strategy.name(), "Extraction succeeded");
                    return Some(normalize_whitespace(&text));
                }
                ExtractionOutcome::Insufficient => {
                    debug!(strategy = strategy.name(), "Extraction insufficient");
                }
                ExtractionOutcome::Failed(reason) => {
                    debug!(strategy = strategy.name(), reason = %reason, "Extraction failed");
                }
            }
        }
        None
    }
}

/// Extract readable text from `document`. Never fails; an empty string means
/// nothing usable was found.
pub fn extract(document: &PageDocument, limits: &ExtractionLimits) -> String {
    ContentExtractor::for_document(document, limits)
        .run(document)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text(words: usize) -> String {
        (0..words).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ")
    }

    struct Fixed(ExtractionOutcome);

    impl ExtractionStrategy for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn try_extract(&self, _document: &PageDocument) -> ExtractionOutcome {
            self.0.clone()
        }
    }

    #[test]
    fn first_success_wins_and_is_normalized() {
        let doc = PageDocument::parse("https://example.com", "");
        let extractor = ContentExtractor::new(vec![
            Box::new(Fixed(ExtractionOutcome::Failed("blocked".into()))),
            Box::new(Fixed(ExtractionOutcome::Insufficient)),
            Box::new(Fixed(ExtractionOutcome::Success("  a \n\t b  ".into()))),
            Box::new(Fixed(ExtractionOutcome::Success("never".into()))),
        ]);
        assert_eq!(extractor.run(&doc).as_deref(), Some("a b"));
    }

    #[test]
    fn empty_chain_yields_nothing() {
        let doc = PageDocument::parse("https://example.com", "");
        assert_eq!(ContentExtractor::new(vec![]).run(&doc), None);
    }

    #[test]
    fn article_is_preferred_and_stripped() {
        let article = long_text(60);
        let html = format!(
            "<body><nav>Site nav</nav><article><header>Byline</header><p>{article}</p>\
             <aside>Related</aside><script>track()</script></article><footer>foot</footer></body>"
        );
        let doc = PageDocument::parse("https://example.com/post", &html);
        assert_eq!(extract(&doc, &ExtractionLimits::default()), article);
    }

    #[test]
    fn short_container_falls_through_to_next_selector() {
        let long = long_text(60);
        let html = format!(
            "<body><article>tiny</article><div id=\"content\"><p>{long}</p></div></body>"
        );
        let doc = PageDocument::parse("https://example.com", &html);
        assert_eq!(extract(&doc, &ExtractionLimits::default()), long);
    }

    #[test]
    fn container_length_counts_whitespace_runs() {
        // 60 one-letter words: 237 chars as rendered, 119 once collapsed.
        let spaced = vec!["a"; 60].join("\n\n\n");
        let html = format!("<body><p>outside</p><article>{spaced}</article></body>");
        let doc = PageDocument::parse("https://example.com", &html);
        assert_eq!(extract(&doc, &ExtractionLimits::default()), vec!["a"; 60].join(" "));
    }

    #[test]
    fn body_fallback_strips_broad_noise() {
        let html = "<body><div class=\"navbar\">Home About</div><p>Short   body\n text.</p>\
                    <div class=\"comments\">first!</div><div class=\"share\">tweet</div></body>";
        let doc = PageDocument::parse("https://example.com", html);
        assert_eq!(extract(&doc, &ExtractionLimits::default()), "Short body text.");
    }

    #[test]
    fn output_has_no_whitespace_runs() {
        let html = "<body><p>  lots\n\n of   \t space </p><p>and&nbsp;&nbsp;more</p></body>";
        let doc = PageDocument::parse("https://example.com", html);
        let text = extract(&doc, &ExtractionLimits::default());
        assert_eq!(text, "lots of space and more");
        assert_eq!(text, text.trim());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn standard_chain_order() {
        let extractor = ContentExtractor::standard(&ExtractionLimits::default());
        assert_eq!(extractor.strategy_names(), vec!["semantic-container", "clean-body"]);
    }
}
