//! Config defaults: fills every unset field with its built-in value.

use std::path::Path;

use crate::schema::{
    ApiConfig, ContextConfig, ExtractionConfig, LoggingConfig, StoreConfig, StudyBuddyConfig,
    SummaryConfig,
};

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/chat";

pub const DEFAULT_MAX_CONTENT_CHARS: usize = 5000;
pub const DEFAULT_MIN_SEMANTIC_CHARS: usize = 200;
pub const DEFAULT_MIN_SELECTION_CHARS: usize = 100;
pub const DEFAULT_MAX_QUESTIONS: usize = 5;

pub const DEFAULT_MAX_PAGE_CHARS: usize = 8000;
pub const DEFAULT_HEAD_RATIO: f64 = 0.6;
pub const DEFAULT_RECENT_TURNS_WITH_SUMMARY: usize = 5;
pub const DEFAULT_RECENT_TURNS_WITHOUT_SUMMARY: usize = 8;
pub const DEFAULT_MIN_FILTERED_TURNS: usize = 3;
pub const DEFAULT_FOLLOW_UP_MAX_CHARS: usize = 50;

pub const DEFAULT_SUMMARY_MAX_TURNS: usize = 15;
pub const DEFAULT_SUMMARY_MAX_CHARS: usize = 5000;

pub const DEFAULT_STORE_CAPACITY: usize = 100;
pub const DEFAULT_STORE_FILE: &str = "studybuddy.db";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults. `config_dir` anchors the default store path.
pub fn apply_all_defaults(config: StudyBuddyConfig, config_dir: &Path) -> StudyBuddyConfig {
    let config = apply_api_defaults(config);
    let config = apply_extraction_defaults(config);
    let config = apply_context_defaults(config);
    let config = apply_summary_defaults(config);
    let config = apply_store_defaults(config, config_dir);
    apply_logging_defaults(config)
}

fn apply_api_defaults(mut config: StudyBuddyConfig) -> StudyBuddyConfig {
    let api = config.api.get_or_insert_with(ApiConfig::default);
    api.url.get_or_insert_with(|| DEFAULT_API_URL.to_string());
    config
}

fn apply_extraction_defaults(mut config: StudyBuddyConfig) -> StudyBuddyConfig {
    let extraction = config.extraction.get_or_insert_with(ExtractionConfig::default);
    extraction.max_content_chars.get_or_insert(DEFAULT_MAX_CONTENT_CHARS);
    extraction.min_semantic_chars.get_or_insert(DEFAULT_MIN_SEMANTIC_CHARS);
    extraction.min_selection_chars.get_or_insert(DEFAULT_MIN_SELECTION_CHARS);
    extraction.max_questions.get_or_insert(DEFAULT_MAX_QUESTIONS);
    config
}

fn apply_context_defaults(mut config: StudyBuddyConfig) -> StudyBuddyConfig {
    let context = config.context.get_or_insert_with(ContextConfig::default);
    context.max_page_chars.get_or_insert(DEFAULT_MAX_PAGE_CHARS);
    context.head_ratio.get_or_insert(DEFAULT_HEAD_RATIO);
    context
        .recent_turns_with_summary
        .get_or_insert(DEFAULT_RECENT_TURNS_WITH_SUMMARY);
    context
        .recent_turns_without_summary
        .get_or_insert(DEFAULT_RECENT_TURNS_WITHOUT_SUMMARY);
    context.min_filtered_turns.get_or_insert(DEFAULT_MIN_FILTERED_TURNS);
    context.follow_up_max_chars.get_or_insert(DEFAULT_FOLLOW_UP_MAX_CHARS);
    config
}

fn apply_summary_defaults(mut config: StudyBuddyConfig) -> StudyBuddyConfig {
    let summary = config.summary.get_or_insert_with(SummaryConfig::default);
    summary.max_turns.get_or_insert(DEFAULT_SUMMARY_MAX_TURNS);
    summary.max_chars.get_or_insert(DEFAULT_SUMMARY_MAX_CHARS);
    config
}

fn apply_store_defaults(mut config: StudyBuddyConfig, config_dir: &Path) -> StudyBuddyConfig {
    let store = config.store.get_or_insert_with(StoreConfig::default);
    store.capacity.get_or_insert(DEFAULT_STORE_CAPACITY);
    store
        .path
        .get_or_insert_with(|| config_dir.join(DEFAULT_STORE_FILE));
    config
}

fn apply_logging_defaults(mut config: StudyBuddyConfig) -> StudyBuddyConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.json.get_or_insert(false);
    config
}
