//! Session key: a stable identifier for one document instance.
//!
//! Combines the document address and title into a fixed-length string used
//! to partition conversation summaries. Collisions are tolerated: the key is
//! a partition hint, not an identity proof.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of every derived key, in hex chars.
pub const SESSION_KEY_LEN: usize = 32;

/// The parts a session key is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub locator: String,
    pub title: String,
}

impl SessionKey {
    pub fn new(locator: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            title: title.into(),
        }
    }

    /// In-page anchors do not make a new document, so the fragment is dropped.
    fn document_locator(&self) -> &str {
        self.locator.split('#').next().unwrap_or_default()
    }

    /// A short stable hash usable as a storage key.
    pub fn hash(&self) -> String {
        let raw = format!("{}|{}", self.document_locator(), self.title.trim());
        let digest = Sha256::digest(raw.as_bytes());
        let mut key = hex::encode(digest);
        key.truncate(SESSION_KEY_LEN);
        key
    }

    pub fn to_display_string(&self) -> String {
        format!("{} ({})", self.title.trim(), self.document_locator())
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

/// Derive the session key for a document instance.
pub fn key_for(locator: &str, title: &str) -> String {
    SessionKey::new(locator, title).hash()
}
