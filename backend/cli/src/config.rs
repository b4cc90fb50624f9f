//! Runtime settings for the CLI, derived from the prepared config file.

use std::path::{Path, PathBuf};

use anyhow::Result;

use studybuddy_agent::{ActivationSettings, ContextPolicy, SummaryPolicy};
use studybuddy_browser::ExtractionLimits;
use studybuddy_config::defaults::*;
use studybuddy_config::{config_dir, config_file_path, load_and_prepare, StudyBuddyConfig};
use studybuddy_logging::LogOptions;

pub struct Settings {
    pub path: PathBuf,
    pub config: StudyBuddyConfig,
}

impl Settings {
    /// Load from `path`, or from the default config directory.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => config_file_path(&config_dir()),
        };
        let config = load_and_prepare(&path).await?;
        Ok(Self { path, config })
    }

    pub fn api_url(&self) -> String {
        self.config
            .api
            .as_ref()
            .and_then(|api| api.url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn store_path(&self) -> PathBuf {
        self.config
            .store
            .as_ref()
            .and_then(|store| store.path.clone())
            .unwrap_or_else(|| config_dir().join(DEFAULT_STORE_FILE))
    }

    pub fn store_capacity(&self) -> usize {
        self.config
            .store
            .as_ref()
            .and_then(|store| store.capacity)
            .unwrap_or(DEFAULT_STORE_CAPACITY)
    }

    pub fn extraction_limits(&self) -> ExtractionLimits {
        let section = self.config.extraction.clone().unwrap_or_default();
        ExtractionLimits {
            max_content_chars: section.max_content_chars.unwrap_or(DEFAULT_MAX_CONTENT_CHARS),
            min_semantic_chars: section.min_semantic_chars.unwrap_or(DEFAULT_MIN_SEMANTIC_CHARS),
            min_selection_chars: section.min_selection_chars.unwrap_or(DEFAULT_MIN_SELECTION_CHARS),
            max_questions: section.max_questions.unwrap_or(DEFAULT_MAX_QUESTIONS),
        }
    }

    pub fn activation_settings(&self) -> ActivationSettings {
        let context = self.config.context.clone().unwrap_or_default();
        let summary = self.config.summary.clone().unwrap_or_default();
        ActivationSettings {
            context: ContextPolicy {
                max_page_chars: context.max_page_chars.unwrap_or(DEFAULT_MAX_PAGE_CHARS),
                head_ratio: context.head_ratio.unwrap_or(DEFAULT_HEAD_RATIO),
                recent_turns_with_summary: context
                    .recent_turns_with_summary
                    .unwrap_or(DEFAULT_RECENT_TURNS_WITH_SUMMARY),
                recent_turns_without_summary: context
                    .recent_turns_without_summary
                    .unwrap_or(DEFAULT_RECENT_TURNS_WITHOUT_SUMMARY),
                min_filtered_turns: context.min_filtered_turns.unwrap_or(DEFAULT_MIN_FILTERED_TURNS),
                follow_up_max_chars: context
                    .follow_up_max_chars
                    .unwrap_or(DEFAULT_FOLLOW_UP_MAX_CHARS),
            },
            summary: SummaryPolicy {
                max_turns: summary.max_turns.unwrap_or(DEFAULT_SUMMARY_MAX_TURNS),
                max_chars: summary.max_chars.unwrap_or(DEFAULT_SUMMARY_MAX_CHARS),
            },
        }
    }

    pub fn log_options(&self) -> LogOptions {
        let logging = self.config.logging.clone().unwrap_or_default();
        LogOptions {
            level: logging.level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            json: logging.json.unwrap_or(false),
            dir: logging.dir,
        }
    }
}
