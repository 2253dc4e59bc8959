//! Ticket records, statuses and update payloads.

use super::NewComment;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    New,
    Open,
    Pending,
    Hold,
    Solved,
    Closed,
    /// A status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl TicketStatus {
    /// The wire name, also used in search queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::Open => "open",
            TicketStatus::Pending => "pending",
            TicketStatus::Hold => "hold",
            TicketStatus::Solved => "solved",
            TicketStatus::Closed => "closed",
            TicketStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
    #[serde(other)]
    Unknown,
}

impl Priority {
    /// The wire name, also used in search queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
            Priority::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A support ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique identifier.
    pub id: u64,

    #[serde(default)]
    pub subject: Option<String>,

    /// The first comment's text.
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub status: Option<TicketStatus>,

    #[serde(default)]
    pub priority: Option<Priority>,

    /// `problem`, `incident`, `question` or `task`.
    #[serde(default, rename = "type")]
    pub ticket_type: Option<String>,

    /// The user who asked for support.
    pub requester_id: u64,

    #[serde(default)]
    pub submitter_id: Option<u64>,

    /// The agent currently working the ticket.
    #[serde(default)]
    pub assignee_id: Option<u64>,

    #[serde(default)]
    pub organization_id: Option<u64>,

    #[serde(default)]
    pub group_id: Option<u64>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Partial update of a ticket; unset fields are left untouched.
///
/// # Examples
///
/// ```
/// use deskwire::models::{NewComment, TicketStatus, TicketUpdate};
///
/// let update = TicketUpdate {
///     status: Some(TicketStatus::Solved),
///     comment: Some(NewComment::public("Fixed in 2.4.1")),
///     ..Default::default()
/// };
/// let json = serde_json::to_value(&update).unwrap();
/// assert_eq!(json["status"], "solved");
/// assert_eq!(json["comment"]["public"], true);
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct TicketUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ticket_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    /// A comment added as part of the update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<NewComment>,
}
