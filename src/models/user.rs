//! User records.

use serde::{Deserialize, Serialize};

/// A user: end user, agent or admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: u64,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Primary email address.
    #[serde(default)]
    pub email: Option<String>,

    /// `end-user`, `agent` or `admin`.
    #[serde(default)]
    pub role: Option<String>,

    /// Primary organization.
    #[serde(default)]
    pub organization_id: Option<u64>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub time_zone: Option<String>,

    #[serde(default)]
    pub locale: Option<String>,

    /// Whether the user has not been deleted.
    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default)]
    pub suspended: bool,

    #[serde(default)]
    pub verified: bool,

    #[serde(default)]
    pub tags: Vec<String>,

    /// ISO 8601 timestamp.
    #[serde(default)]
    pub created_at: Option<String>,

    /// ISO 8601 timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl User {
    /// Returns `true` for agents and admins.
    pub fn is_staff(&self) -> bool {
        matches!(self.role.as_deref(), Some("agent") | Some("admin"))
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_user_decodes_with_defaults() {
        let user: User = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(user.id, 1);
        assert!(user.active);
        assert!(user.email.is_none());
        assert!(!user.is_staff());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let user: User = serde_json::from_str(
            r#"{"id": 2, "name": "Agent", "role": "agent", "user_fields": {"x": 1}, "photo": null}"#,
        )
        .unwrap();
        assert!(user.is_staff());
    }
}
