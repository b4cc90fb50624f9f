//! StudyBuddy configuration schema.
//!
//! Every section and field is optional in the file; [`crate::defaults`]
//! fills in whatever was left out.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyBuddyConfig {
    /// Remote chat endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiConfig>,

    /// Page extraction limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionConfig>,

    /// Prompt assembly policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextConfig>,

    /// Summarization trigger thresholds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryConfig>,

    /// Conversation store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_content_chars: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_semantic_chars: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_selection_chars: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_questions: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_page_chars: Option<usize>,
    /// Share of the page budget taken from the start, in (0, 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_turns_with_summary: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_turns_without_summary: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_filtered_turns: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_max_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Turns kept across all pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
    /// SQLite database file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Level or `EnvFilter` directive, e.g. `info` or `studybuddy_agent=debug`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
    /// Directory for a daily-rolling NDJSON log file. Console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
api:
  url: http://example.com/chat
context:
  maxPageChars: 6000
  headRatio: 0.5
store:
  capacity: 20
"#;
        let config: StudyBuddyConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.api.unwrap().url.as_deref(), Some("http://example.com/chat"));
        let context = config.context.unwrap();
        assert_eq!(context.max_page_chars, Some(6000));
        assert_eq!(context.head_ratio, Some(0.5));
        assert_eq!(config.store.unwrap().capacity, Some(20));
        assert!(config.summary.is_none());
    }

    #[test]
    fn empty_sections_are_not_serialized() {
        let yaml = serde_yaml::to_string(&StudyBuddyConfig::default()).unwrap();
        assert_eq!(yaml.trim(), "{}");
    }
}
