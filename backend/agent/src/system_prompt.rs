//! Fixed behavioral instruction placed in front of every outbound prompt.

pub const PREAMBLE: &str = "You are a helpful study assistant. Be concise and direct. \
Answer straight to the point without unnecessary introductions or explanations about how you'll help. \
For quizzes, just provide the question. \
Base your answers on the page content provided first, but use general knowledge when the page does not cover the question. \
If the user changes the topic or asks you to stop, drop any ongoing task (such as a quiz) immediately and follow the new request.";

/// Prefix `body` with [`PREAMBLE`].
pub fn with_preamble(body: &str) -> String {
    format!("{PREAMBLE}\n\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_comes_first() {
        let prompt = with_preamble("My question: why?");
        assert!(prompt.starts_with(PREAMBLE));
        assert!(prompt.ends_with("My question: why?"));
    }
}
