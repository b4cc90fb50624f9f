//! StudyBuddy Agent
//!
//! Everything that happens between "the user typed a message" and "a prompt
//! goes out": history compaction, context assembly, the behavioral preamble,
//! and the activation controller that ties them to a page and a store.

pub mod assembler;
pub mod controller;
pub mod summarizer;
pub mod system_prompt;

pub use assembler::{is_breakout, truncate_content, ContextAssembler, ContextPolicy, ELISION_MARKER};
pub use controller::{queue_selection_question, Activation, ActivationSettings, ChatEntry, ChatRole, SendOutcome, StatusMessage};
pub use summarizer::{should_compact, CompactionOutcome, SummaryPolicy, Summarizer};
pub use system_prompt::{with_preamble, PREAMBLE};
