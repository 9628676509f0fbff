//! Messages flowing through the live-update pipeline.
//!
//! ```text
//! FsActor --IdeMessage--> CompilerActor --IdeMessage--> Broker --JSON--> viewers
//! ```
//!
//! The same type travels every hop: the loader fills `text` with the file
//! content, the recompiler may swap it for the rendered document, and the
//! session serializes it for the wire.

use serde::{Deserialize, Serialize};

/// Which of the two watched files a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// The narrative markdown; recompiled before broadcast.
    Narrative,
    /// The program source; forwarded as is.
    Program,
}

/// Live-update message for one tutorial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeMessage {
    pub tutorial_name: String,
    pub kind: MessageKind,
    pub text: String,
}

impl IdeMessage {
    pub fn new(tutorial_name: impl Into<String>, kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            tutorial_name: tutorial_name.into(),
            kind,
            text: text.into(),
        }
    }

    /// Same tutorial and kind, new payload.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            tutorial_name: self.tutorial_name.clone(),
            kind: self.kind,
            text: text.into(),
        }
    }

    pub fn to_json(&self) -> String {
        // Only strings and a unit enum: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Informational message sent once when a viewer connects.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InfoMessage {
    Info { message: &'static str },
}

impl InfoMessage {
    pub fn connected() -> Self {
        Self::Info {
            message: "connected",
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
