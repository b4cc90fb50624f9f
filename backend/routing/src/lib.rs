pub mod session_key;

pub use session_key::{key_for, SessionKey, SESSION_KEY_LEN};
