use super::{fetch_record, list};
use crate::{
    models::{Article, Category, Section},
    pagination::OffsetPager,
    Client, Request, Result,
};

/// Help center endpoints.
#[derive(Clone)]
pub struct HelpCenterApi {
    client: Client,
}

impl HelpCenterApi {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// All categories.
    pub fn categories(&self) -> OffsetPager<Category> {
        list(&self.client, Request::get("help_center/categories.json"))
    }

    /// Sections, optionally only those of one category.
    pub fn sections(&self, category_id: Option<u64>) -> OffsetPager<Section> {
        let path = match category_id {
            Some(id) => format!("help_center/categories/{}/sections.json", id),
            None => "help_center/sections.json".to_string(),
        };
        list(&self.client, Request::get(path))
    }

    /// Articles, optionally only those of one section.
    pub fn articles(&self, section_id: Option<u64>) -> OffsetPager<Article> {
        let path = match section_id {
            Some(id) => format!("help_center/sections/{}/articles.json", id),
            None => "help_center/articles.json".to_string(),
        };
        list(&self.client, Request::get(path))
    }

    /// Fetches an article through the article cache.
    pub async fn get_article(&self, id: u64) -> Result<Article> {
        let client = self.client.clone();
        self.client
            .caches()
            .articles
            .get_or_fetch(id, move || async move {
                fetch_record(
                    &client,
                    Request::get(format!("help_center/articles/{}.json", id)),
                )
                .await
            })
            .await
    }

    /// Full-text article search. Results carry a highlighted `snippet`.
    pub fn search_articles(&self, query: impl Into<String>) -> OffsetPager<Article> {
        OffsetPager::new(
            self.client.clone(),
            Request::get("help_center/articles/search.json").with_query_param("query", query),
            "results",
        )
        .stop_at_result_cap()
    }
}
