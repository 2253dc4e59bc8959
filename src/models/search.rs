//! Search results and the query builder.

use super::{Organization, Priority, Ticket, TicketStatus, User};
use serde::Deserialize;
use std::fmt;

/// One hit of the unified search endpoint, tagged by `result_type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "result_type", rename_all = "snake_case")]
pub enum SearchResult {
    Ticket(Ticket),
    User(User),
    Organization(Organization),
    /// Groups, topics and other kinds this client does not model.
    #[serde(other)]
    Other,
}

impl SearchResult {
    /// The ticket, if this hit is one.
    pub fn into_ticket(self) -> Option<Ticket> {
        match self {
            SearchResult::Ticket(ticket) => Some(ticket),
            _ => None,
        }
    }

    /// The user, if this hit is one.
    pub fn into_user(self) -> Option<User> {
        match self {
            SearchResult::User(user) => Some(user),
            _ => None,
        }
    }

    /// The organization, if this hit is one.
    pub fn into_organization(self) -> Option<Organization> {
        match self {
            SearchResult::Organization(organization) => Some(organization),
            _ => None,
        }
    }
}

/// The record kind a search is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    Ticket,
    User,
    Organization,
}

impl SearchType {
    /// The wire name used in `type:` terms and `filter[type]`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Ticket => "ticket",
            SearchType::User => "user",
            SearchType::Organization => "organization",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds a search query string.
///
/// Terms for the same property (e.g. two statuses) are ORed by the server;
/// different properties are ANDed.
///
/// # Examples
///
/// ```
/// use deskwire::models::{Priority, SearchQuery, SearchType, TicketStatus};
///
/// let query = SearchQuery::new()
///     .of_type(SearchType::Ticket)
///     .status(TicketStatus::Open)
///     .status(TicketStatus::Pending)
///     .priority(Priority::High)
///     .organization(12345)
///     .text("printer");
///
/// assert_eq!(
///     query.to_string(),
///     "type:ticket status:open status:pending priority:high organization:12345 printer"
/// );
///
/// // Raw strings work too.
/// let raw: SearchQuery = "status<solved requester:me".into();
/// assert_eq!(raw.for_type(SearchType::Ticket), "type:ticket status<solved requester:me");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    kind: Option<SearchType>,
    statuses: Vec<TicketStatus>,
    priorities: Vec<Priority>,
    assignee: Option<String>,
    requester: Option<String>,
    organization: Option<u64>,
    tags: Vec<String>,
    created_after: Option<String>,
    updated_after: Option<String>,
    text: Option<String>,
}

impl SearchQuery {
    /// An empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to one record kind.
    pub fn of_type(mut self, kind: SearchType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Adds an accepted ticket status.
    pub fn status(mut self, status: TicketStatus) -> Self {
        self.statuses.push(status);
        self
    }

    /// Adds an accepted priority.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priorities.push(priority);
        self
    }

    /// Assignee by id, email or `none`.
    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Requester by id, email or `me`.
    pub fn requester(mut self, requester: impl Into<String>) -> Self {
        self.requester = Some(requester.into());
        self
    }

    /// Organization by id.
    pub fn organization(mut self, organization_id: u64) -> Self {
        self.organization = Some(organization_id);
        self
    }

    /// Adds a required tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Created after a date such as `2024-01-31`.
    pub fn created_after(mut self, date: impl Into<String>) -> Self {
        self.created_after = Some(date.into());
        self
    }

    /// Updated after a date such as `2024-01-31`.
    pub fn updated_after(mut self, date: impl Into<String>) -> Self {
        self.updated_after = Some(date.into());
        self
    }

    /// Free text, or any raw query syntax.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// The kind set with [`SearchQuery::of_type`], if any.
    pub fn kind(&self) -> Option<SearchType> {
        self.kind
    }

    /// Renders the query restricted to `kind`, replacing any other kind.
    ///
    /// Raw text that already carries the matching `type:` term is not given a
    /// second one.
    pub fn for_type(&self, kind: SearchType) -> String {
        let term = format!("type:{}", kind);
        let already_typed = self
            .text
            .as_deref()
            .is_some_and(|text| text.split_whitespace().any(|word| word == term));

        let rest = self.terms();
        if already_typed {
            rest
        } else if rest.is_empty() {
            term
        } else {
            format!("{} {}", term, rest)
        }
    }

    /// Renders every term except `type:`. Used by the export endpoint, which
    /// takes the kind as a separate filter.
    pub fn terms(&self) -> String {
        let mut terms: Vec<String> = Vec::new();
        terms.extend(self.statuses.iter().map(|status| format!("status:{}", status)));
        terms.extend(self.priorities.iter().map(|priority| format!("priority:{}", priority)));
        if let Some(assignee) = &self.assignee {
            terms.push(format!("assignee:{}", assignee));
        }
        if let Some(requester) = &self.requester {
            terms.push(format!("requester:{}", requester));
        }
        if let Some(organization) = self.organization {
            terms.push(format!("organization:{}", organization));
        }
        terms.extend(self.tags.iter().map(|tag| format!("tags:{}", tag)));
        if let Some(date) = &self.created_after {
            terms.push(format!("created>{}", date));
        }
        if let Some(date) = &self.updated_after {
            terms.push(format!("updated>{}", date));
        }
        if let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            terms.push(text.to_string());
        }
        terms.join(" ")
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(kind) => f.write_str(&self.for_type(kind)),
            None => f.write_str(&self.terms()),
        }
    }
}

impl From<&str> for SearchQuery {
    fn from(raw: &str) -> Self {
        SearchQuery::new().text(raw)
    }
}

impl From<String> for SearchQuery {
    fn from(raw: String) -> Self {
        SearchQuery::new().text(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_type_tagging() {
        let results: Vec<SearchResult> = serde_json::from_str(
            r#"[
                {"result_type": "ticket", "id": 1, "requester_id": 2},
                {"result_type": "user", "id": 2, "name": "Ada"},
                {"result_type": "group", "id": 3, "name": "Tier 2"}
            ]"#,
        )
        .unwrap();

        assert!(matches!(results[0], SearchResult::Ticket(ref t) if t.id == 1));
        assert!(matches!(results[1], SearchResult::User(ref u) if u.name == "Ada"));
        assert_eq!(results[2], SearchResult::Other);
    }

    #[test]
    fn test_for_type_replaces_kind() {
        let query = SearchQuery::new()
            .of_type(SearchType::User)
            .tag("vip");
        assert_eq!(query.for_type(SearchType::Organization), "type:organization tags:vip");
        assert_eq!(SearchQuery::new().for_type(SearchType::Ticket), "type:ticket");
    }

    #[test]
    fn test_raw_query_with_type_is_not_doubled() {
        let raw = SearchQuery::from("type:ticket status:open");
        assert_eq!(raw.for_type(SearchType::Ticket), "type:ticket status:open");
    }

    #[test]
    fn test_terms_skip_type_and_blank_text() {
        let query = SearchQuery::new()
            .of_type(SearchType::Ticket)
            .created_after("2024-01-01")
            .text("  ");
        assert_eq!(query.terms(), "created>2024-01-01");
    }
}
