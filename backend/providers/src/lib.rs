pub mod http;
pub mod mock;

pub use http::{HttpChatEndpoint, DEFAULT_API_URL};
pub use mock::ScriptedEndpoint;
