//! Paginated-document fallback for fixed-layout viewers (PDF and friends).
//!
//! Tried in order: rendered text layers, same-origin embedded frames, a
//! programmatic select-all, and finally a placeholder asking the user to
//! paste text. The placeholder is ordinary content, not an error.

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::document::{FrameAccess, PageDocument};
use crate::element_query::SelectorList;
use crate::extractor::{
    normalize_whitespace, ContentExtractor, ExtractionLimits, ExtractionOutcome,
    ExtractionStrategy,
};

static PDF_EMBED: Lazy<SelectorList> = Lazy::new(|| {
    SelectorList::parse(r#"embed[type="application/pdf"]"#).expect("valid embed selector")
});
static PDFJS_VIEWER: Lazy<SelectorList> =
    Lazy::new(|| SelectorList::parse("#viewer.pdfViewer").expect("valid viewer selector"));
static TEXT_LAYER: Lazy<SelectorList> =
    Lazy::new(|| SelectorList::parse(".textLayer").expect("valid text layer selector"));

/// Fragment that marks the in-page placeholder.
pub const PLACEHOLDER_MARKER: &str = "it may be limited";

/// Does this document render a fixed-layout file rather than flowing text?
pub fn is_paginated_viewer(document: &PageDocument) -> bool {
    document.locator().to_lowercase().ends_with(".pdf")
        || document.query_selector(&PDF_EMBED).is_some()
        || document.query_selector(&PDFJS_VIEWER).is_some()
}

/// Placeholder for a viewer whose text could not be read.
pub fn placeholder_for(document: &PageDocument) -> String {
    let filename = document.filename().unwrap_or_else(|| "document".to_string());
    format!(
        "This is a PDF file ({filename}). I'm trying to read the content but {PLACEHOLDER_MARKER}. \
         Please select and copy text from the PDF to share specific parts you need help with."
    )
}

pub fn paginated_extractor(limits: &ExtractionLimits) -> ContentExtractor {
    ContentExtractor::new(vec![
        Box::new(TextLayerStrategy),
        Box::new(EmbeddedFrameStrategy),
        Box::new(SelectAllStrategy::new(limits.min_selection_chars)),
        Box::new(PlaceholderStrategy),
    ])
}

/// Concatenates every rendered text layer.
pub struct TextLayerStrategy;

impl ExtractionStrategy for TextLayerStrategy {
    fn name(&self) -> &'static str {
        "text-layer"
    }

    fn try_extract(&self, document: &PageDocument) -> ExtractionOutcome {
        let layers = document.query_selector_all(&TEXT_LAYER);
        if layers.is_empty() {
            return ExtractionOutcome::Insufficient;
        }
        let joined = layers
            .iter()
            .map(|layer| layer.text_content())
            .collect::<Vec<_>>()
            .join(" ");
        let text = normalize_whitespace(&joined);
        if text.is_empty() {
            ExtractionOutcome::Insufficient
        } else {
            debug!(layers = layers.len(), "Read text layers");
            ExtractionOutcome::Success(text)
        }
    }
}

/// Reads the first same-origin frame with any text in it.
pub struct EmbeddedFrameStrategy;

impl ExtractionStrategy for EmbeddedFrameStrategy {
    fn name(&self) -> &'static str {
        "embedded-frame"
    }

    fn try_extract(&self, document: &PageDocument) -> ExtractionOutcome {
        let mut blocked = 0;
        for frame in document.frames() {
            match document.frame_access(frame) {
                FrameAccess::Ok(body) => {
                    let text = normalize_whitespace(&body.inner_text());
                    if !text.is_empty() {
                        return ExtractionOutcome::Success(text);
                    }
                }
                FrameAccess::CrossOrigin => {
                    warn!(src = ?frame.src(), "Cannot access cross-origin frame");
                    blocked += 1;
                }
                FrameAccess::NotLoaded => {}
            }
        }
        if blocked > 0 {
            ExtractionOutcome::Failed(format!("{blocked} frame(s) blocked by origin boundary"))
        } else {
            ExtractionOutcome::Insufficient
        }
    }
}

/// Selects the whole body and keeps the selection if it is long enough.
pub struct SelectAllStrategy {
    min_chars: usize,
}

impl SelectAllStrategy {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }
}

impl ExtractionStrategy for SelectAllStrategy {
    fn name(&self) -> &'static str {
        "select-all"
    }

    fn try_extract(&self, document: &PageDocument) -> ExtractionOutcome {
        match document.select_all() {
            Ok(selected) => {
                if selected.trim().chars().count() > self.min_chars {
                    ExtractionOutcome::Success(normalize_whitespace(&selected))
                } else {
                    ExtractionOutcome::Insufficient
                }
            }
            Err(e) => ExtractionOutcome::Failed(e.to_string()),
        }
    }
}

pub struct PlaceholderStrategy;

impl ExtractionStrategy for PlaceholderStrategy {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn try_extract(&self, document: &PageDocument) -> ExtractionOutcome {
        ExtractionOutcome::Success(placeholder_for(document))
    }
}
