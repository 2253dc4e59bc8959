//! Ticket comments.

use serde::{Deserialize, Serialize};

/// A comment on a ticket, public reply or internal note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,

    /// The user who wrote the comment.
    pub author_id: u64,

    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub html_body: Option<String>,

    #[serde(default)]
    pub plain_body: Option<String>,

    /// `false` for internal notes.
    #[serde(default = "default_public")]
    pub public: bool,

    #[serde(default)]
    pub attachments: Vec<Attachment>,

    #[serde(default)]
    pub created_at: Option<String>,
}

/// A file attached to a comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: u64,

    #[serde(default)]
    pub file_name: String,

    #[serde(default)]
    pub content_url: Option<String>,

    #[serde(default)]
    pub content_type: Option<String>,

    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

/// A comment to add to a ticket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewComment {
    pub body: String,

    pub public: bool,

    /// Defaults to the authenticated user when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<u64>,
}

impl NewComment {
    /// A reply visible to the requester.
    pub fn public(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            public: true,
            author_id: None,
        }
    }

    /// An internal note only agents can see.
    pub fn internal(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            public: false,
            author_id: None,
        }
    }

    /// Posts the comment on behalf of another user.
    pub fn with_author(mut self, author_id: u64) -> Self {
        self.author_id = Some(author_id);
        self
    }
}

fn default_public() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_note_payload() {
        let note = NewComment::internal("VIP customer").with_author(7);
        assert_eq!(
            serde_json::to_value(&note).unwrap(),
            serde_json::json!({"body": "VIP customer", "public": false, "author_id": 7})
        );
    }

    #[test]
    fn test_comment_defaults_to_public() {
        let comment: Comment =
            serde_json::from_str(r#"{"id": 1, "author_id": 2, "body": "hi"}"#).unwrap();
        assert!(comment.public);
        assert!(comment.attachments.is_empty());
    }
}
