pub mod error;
pub mod message;
pub mod traits;
pub mod types;

pub use error::StudyError;
pub use message::{ChatErrorBody, ChatReply, ChatRequest, PageContentOutcome, PageRequest};
pub use traits::{ChatEndpoint, ConversationStore, PageContentProvider};
pub use types::{ExtractedPage, Session, Turn, UNKNOWN_PAGE_TITLE};
