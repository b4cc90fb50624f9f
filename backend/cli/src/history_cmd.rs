//! `history`: show stored turns for a page title.

use anyhow::Result;

use studybuddy_core::{ConversationStore, Turn};

use crate::terminal_output::{note_warn, preview, supports_color, DIM, RESET};

const PREVIEW_CHARS: usize = 120;

pub fn format_turn(turn: &Turn) -> String {
    format!(
        "[{}]\n  You: {}\n  StudyBuddy: {}",
        turn.timestamp.format("%Y-%m-%d %H:%M"),
        preview(&turn.user_text, PREVIEW_CHARS),
        preview(&turn.assistant_text, PREVIEW_CHARS)
    )
}

/// Print the last `limit` turns recorded under `title`, oldest first.
pub async fn run(store: &dyn ConversationStore, title: &str, limit: usize) -> Result<()> {
    let turns = store.query(title).await?;
    if turns.is_empty() {
        note_warn(&format!("No history for \"{title}\""));
        return Ok(());
    }
    let start = turns.len().saturating_sub(limit);
    if start > 0 {
        let skipped = format!("… {start} earlier turns");
        if supports_color() {
            println!("{DIM}{skipped}{RESET}");
        } else {
            println!("{skipped}");
        }
    }
    for turn in &turns[start..] {
        println!("{}", format_turn(turn));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_shows_both_sides() {
        let turn = Turn::new("What is a ribosome?", "A protein factory.", "Cells");
        let text = format_turn(&turn);
        assert!(text.contains("You: What is a ribosome?"));
        assert!(text.contains("StudyBuddy: A protein factory."));
    }

    #[test]
    fn long_replies_are_previewed() {
        let turn = Turn::new("q", "a".repeat(500), "Cells");
        let text = format_turn(&turn);
        assert!(text.ends_with('…'));
        assert!(text.chars().count() < 300);
    }
}
