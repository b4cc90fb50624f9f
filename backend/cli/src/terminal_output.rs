//! Terminal output: ANSI notes and chat transcript rendering.

use studybuddy_agent::{ChatEntry, ChatRole};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Note {
    Info,
    Warn,
    Error,
    Success,
}

impl Note {
    fn style(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Note::Info => (CYAN, "ℹ", "INFO:"),
            Note::Warn => (YELLOW, "⚠", "WARN:"),
            Note::Error => (RED, "✗", "ERROR:"),
            Note::Success => (GREEN, "✓", "OK:"),
        }
    }

    fn render(self, msg: &str, color: bool) -> String {
        let (tint, glyph, plain) = self.style();
        if color {
            format!("{tint}{BOLD}{glyph}{RESET} {msg}")
        } else {
            format!("{plain} {msg}")
        }
    }
}

fn note(kind: Note, msg: &str) {
    let line = kind.render(msg, supports_color());
    // Errors go to stderr.
    if kind == Note::Error {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

pub fn note_info(msg: &str) {
    note(Note::Info, msg);
}

pub fn note_warn(msg: &str) {
    note(Note::Warn, msg);
}

pub fn note_error(msg: &str) {
    note(Note::Error, msg);
}

pub fn note_success(msg: &str) {
    note(Note::Success, msg);
}

fn role_label(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "You",
        ChatRole::Assistant => "StudyBuddy",
    }
}

/// Plain rendering of one transcript entry.
pub fn format_entry(entry: &ChatEntry) -> String {
    format!("{}: {}", role_label(entry.role), entry.text)
}

pub fn print_entry(entry: &ChatEntry) {
    if supports_color() {
        let color = match entry.role {
            ChatRole::User => CYAN,
            ChatRole::Assistant => GREEN,
        };
        println!("{color}{BOLD}{}{RESET}: {}", role_label(entry.role), entry.text);
    } else {
        println!("{}", format_entry(entry));
    }
}

/// Numbered list, one item per line, for detected questions.
pub fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{:>2}. {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First `max` chars of `text` followed by an ellipsis when cut.
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}…")
}
