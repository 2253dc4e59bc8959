//! Help center content: categories contain sections, sections contain articles.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub locale: Option<String>,

    #[serde(default)]
    pub position: i64,

    #[serde(default)]
    pub html_url: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: u64,

    #[serde(default)]
    pub category_id: Option<u64>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub locale: Option<String>,

    #[serde(default)]
    pub position: i64,

    #[serde(default)]
    pub html_url: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A knowledge base article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,

    #[serde(default)]
    pub title: String,

    /// HTML body.
    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub section_id: Option<u64>,

    #[serde(default)]
    pub author_id: Option<u64>,

    #[serde(default)]
    pub locale: Option<String>,

    #[serde(default)]
    pub label_names: Vec<String>,

    #[serde(default)]
    pub draft: bool,

    #[serde(default)]
    pub promoted: bool,

    #[serde(default)]
    pub html_url: Option<String>,

    /// Highlighted excerpt, only present in search results.
    #[serde(default)]
    pub snippet: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,
}
