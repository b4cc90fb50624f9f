//! Config validation with field paths in every message.

use thiserror::Error;

use crate::schema::StudyBuddyConfig;

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

pub fn validate(config: &StudyBuddyConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_api(config, &mut report);
    validate_extraction(config, &mut report);
    validate_context(config, &mut report);
    validate_summary(config, &mut report);
    validate_store(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn require_positive(report: &mut ValidationReport, path: &str, value: Option<usize>) {
    if value == Some(0) {
        report.error(path, "must be > 0");
    }
}

fn validate_api(config: &StudyBuddyConfig, report: &mut ValidationReport) {
    let Some(url) = config.api.as_ref().and_then(|a| a.url.as_deref()) else {
        return;
    };
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        report.error("api.url", format!("'{url}' is not an http(s) URL"));
    }
}

fn validate_extraction(config: &StudyBuddyConfig, report: &mut ValidationReport) {
    let Some(extraction) = &config.extraction else { return };
    require_positive(report, "extraction.maxContentChars", extraction.max_content_chars);
    if extraction.max_questions == Some(0) {
        report.warn("extraction.maxQuestions", "0 disables question detection");
    }
}

fn validate_context(config: &StudyBuddyConfig, report: &mut ValidationReport) {
    let Some(context) = &config.context else { return };
    require_positive(report, "context.maxPageChars", context.max_page_chars);
    if let Some(ratio) = context.head_ratio {
        if !(ratio > 0.0 && ratio < 1.0) {
            report.error("context.headRatio", format!("{ratio} is outside (0, 1)"));
        }
    }
    if let (Some(with), Some(without)) = (
        context.recent_turns_with_summary,
        context.recent_turns_without_summary,
    ) {
        if with > without {
            report.warn(
                "context.recentTurnsWithSummary",
                "more turns are repeated with a summary than without one",
            );
        }
    }
    if let (Some(min), Some(with)) = (context.min_filtered_turns, context.recent_turns_with_summary) {
        if min > with {
            report.warn(
                "context.minFilteredTurns",
                "larger than the recent-turn window; filtering will never apply",
            );
        }
    }
}

fn validate_summary(config: &StudyBuddyConfig, report: &mut ValidationReport) {
    let Some(summary) = &config.summary else { return };
    require_positive(report, "summary.maxTurns", summary.max_turns);
    require_positive(report, "summary.maxChars", summary.max_chars);
}

fn validate_store(config: &StudyBuddyConfig, report: &mut ValidationReport) {
    let Some(store) = &config.store else { return };
    require_positive(report, "store.capacity", store.capacity);
    if let (Some(capacity), Some(max_turns)) = (
        store.capacity,
        config.summary.as_ref().and_then(|s| s.max_turns),
    ) {
        if capacity <= max_turns {
            report.warn(
                "store.capacity",
                "history is evicted before the turn-count summary trigger can fire",
            );
        }
    }
}

fn validate_logging(config: &StudyBuddyConfig, report: &mut ValidationReport) {
    let Some(level) = config.logging.as_ref().and_then(|l| l.level.as_deref()) else {
        return;
    };
    // Filter directives (`crate=level`) are passed through unchecked.
    if !level.contains('=') && !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        report.warn("logging.level", format!("unknown level '{level}'"));
    }
}
