//! Organization records and write payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An organization that users and tickets belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier.
    pub id: u64,

    #[serde(default)]
    pub name: String,

    /// Email domains whose users join this organization automatically.
    #[serde(default)]
    pub domain_names: Vec<String>,

    #[serde(default)]
    pub details: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub group_id: Option<u64>,

    #[serde(default)]
    pub shared_tickets: bool,

    #[serde(default)]
    pub shared_comments: bool,

    #[serde(default)]
    pub external_id: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Custom field values keyed by field key.
    #[serde(default)]
    pub organization_fields: Map<String, Value>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Payload for creating an organization.
///
/// # Examples
///
/// ```
/// use deskwire::models::NewOrganization;
///
/// let org = NewOrganization::new("Acme")
///     .with_domain("acme.test")
///     .with_tag("vip");
/// let json = serde_json::to_value(&org).unwrap();
/// assert_eq!(json["name"], "Acme");
/// assert!(json.get("notes").is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewOrganization {
    pub name: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domain_names: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Map::is_empty")]
    pub organization_fields: Map<String, Value>,
}

impl NewOrganization {
    /// Creates a payload with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adds an email domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain_names.push(domain.into());
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets the free-form details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Sets the external id, which `create_or_update` matches on.
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

/// Partial update of an organization; unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrganizationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_names: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_fields: Option<Map<String, Value>>,
}
