//! Question Detector
//!
//! Spots question-like sentences in extracted text. Purely syntactic: the
//! text is cut into fragments at `.`/`!` followed by whitespace, and each
//! fragment holding a `?` contributes its leading question, subject to
//! length, opening-word and navigation-noise filters.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_QUESTION_CHARS: usize = 15;
pub const MAX_QUESTION_CHARS: usize = 200;
pub const DEFAULT_MAX_QUESTIONS: usize = 5;

/// Below this length a fragment starting with a menu word is treated as navigation.
const NAV_NOISE_CHARS: usize = 20;

static FRAGMENT_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!]\s+").unwrap());

/// Leading run with no `.`/`!`, up to a `?`.
static QUESTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!]*\?").unwrap());

static INTERROGATIVE_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(what|where|when|why|how|who|which|can|do|does|will|would|could|should|is|are)",
    )
    .unwrap()
});

static NAV_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(home|about|contact|menu|login|sign|search)").unwrap());

#[derive(Debug, Clone)]
pub struct QuestionDetector {
    max_questions: usize,
}

impl Default for QuestionDetector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_QUESTIONS)
    }
}

impl QuestionDetector {
    pub fn new(max_questions: usize) -> Self {
        Self { max_questions }
    }

    /// Detected questions in first-seen order, deduplicated case-insensitively.
    pub fn detect(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut questions = Vec::new();

        for fragment in fragments(text) {
            if questions.len() >= self.max_questions {
                break;
            }
            let fragment = fragment.trim();
            if !fragment.contains('?') {
                continue;
            }
            let Some(m) = QUESTION.find(fragment) else {
                continue;
            };
            let question = m.as_str().trim();
            if !is_plausible(question) {
                continue;
            }
            if seen.insert(question.to_lowercase()) {
                questions.push(question.to_string());
            }
        }

        questions
    }
}

/// Split after every `.`/`!` that is followed by whitespace, keeping the
/// terminator with its fragment. `?` never splits.
fn fragments(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for m in FRAGMENT_BREAK.find_iter(text) {
        // Terminators are single-byte ASCII.
        out.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    out.push(&text[start..]);
    out
}

fn is_plausible(question: &str) -> bool {
    let len = question.chars().count();
    if !(MIN_QUESTION_CHARS..=MAX_QUESTION_CHARS).contains(&len) {
        return false;
    }
    let capitalized = question
        .chars()
        .next()
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false);
    if !capitalized && !INTERROGATIVE_START.is_match(question) {
        return false;
    }
    if len < NAV_NOISE_CHARS && NAV_START.is_match(question) {
        return false;
    }
    true
}

/// Convenience wrapper using the default cap.
pub fn detect_questions(text: &str) -> Vec<String> {
    QuestionDetector::default().detect(text)
}
