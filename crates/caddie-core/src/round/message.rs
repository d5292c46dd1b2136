//! Conversation message types.
//!
//! This module contains types for representing turns in a round's
//! conversation log, including roles and optional photo attachments.

use serde::{Deserialize, Serialize};

/// Represents the author of a message in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the golfer.
    User,
    /// Message from the caddie model.
    Model,
}

/// An encoded photo carried by a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachment {
    /// MIME type of the image (e.g. `image/jpeg`).
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

/// A single turn in a round's conversation log.
///
/// Messages are immutable once created and only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The author of the message.
    pub role: Role,
    /// The text of the message.
    pub content: String,
    /// Photo attached to a user turn, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageAttachment>,
}

impl Message {
    /// Creates a text message from the golfer.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            image: None,
        }
    }

    /// Creates a text message from the caddie model.
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
            image: None,
        }
    }

    /// Attaches a photo to this message.
    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::model("hi")).unwrap();
        assert_eq!(json, r#"{"role":"model","content":"hi"}"#);
    }

    #[test]
    fn test_image_uses_camel_case() {
        let msg = Message::user("look").with_image(ImageAttachment {
            mime_type: "image/png".to_string(),
            data: "AAAA".to_string(),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["image"]["mimeType"], "image/png");
    }
}
