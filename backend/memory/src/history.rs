use studybuddy_core::Turn;

/// Total turns kept across every page.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Append `turn` and evict from the front until the log fits `capacity`.
/// Returns how many turns were evicted.
pub fn push_bounded(history: &mut Vec<Turn>, turn: Turn, capacity: usize) -> usize {
    history.push(turn);
    let overflow = history.len().saturating_sub(capacity);
    if overflow > 0 {
        history.drain(..overflow);
    }
    overflow
}

/// Turns recorded for `title`, oldest first.
pub fn turns_for_page(history: &[Turn], title: &str) -> Vec<Turn> {
    history
        .iter()
        .filter(|turn| turn.page_title == title)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_first() {
        let mut history = Vec::new();
        for i in 0..5 {
            push_bounded(&mut history, Turn::new(format!("q{i}"), "a", "p"), 3);
        }
        let users: Vec<_> = history.iter().map(|t| t.user_text.as_str()).collect();
        assert_eq!(users, vec!["q2", "q3", "q4"]);
    }

    #[test]
    fn filter_keeps_order() {
        let history = vec![
            Turn::new("1", "a", "A"),
            Turn::new("2", "a", "B"),
            Turn::new("3", "a", "A"),
        ];
        let page: Vec<_> = turns_for_page(&history, "A")
            .into_iter()
            .map(|t| t.user_text)
            .collect();
        assert_eq!(page, vec!["1", "3"]);
    }
}
