//! Everything that runs next to the document: a small DOM, content
//! extraction with its fallback chains, question detection, and the agents
//! that answer page-content requests.

pub mod document;
pub mod dom;
pub mod element_query;
pub mod extractor;
pub mod page_agent;
pub mod paginated;
pub mod pdf_viewer;
pub mod questions;

pub use document::{FrameAccess, PageDocument};
pub use dom::{parse_html, Element, Node};
pub use element_query::{SelectorError, SelectorList};
pub use extractor::{
    extract, normalize_whitespace, truncate_chars, ContentExtractor, ExtractionLimits,
    ExtractionOutcome, ExtractionStrategy,
};
pub use page_agent::{spawn_responder, PageAgent, PageAgentHandle, PageResponder};
pub use paginated::{is_paginated_viewer, PLACEHOLDER_MARKER};
pub use pdf_viewer::{PdfViewerAgent, VIEWER_PLACEHOLDER_MARKER};
pub use questions::{detect_questions, QuestionDetector};
