use super::{fetch_record, list};
use crate::{
    models::{NewOrganization, Organization, OrganizationUpdate},
    pagination::OffsetPager,
    Client, Request, Result,
};
use serde_json::json;

/// Organization endpoints.
///
/// Writes keep the organization cache consistent: `create`,
/// `create_or_update` and `update` store the returned record, `delete` drops
/// it.
#[derive(Clone)]
pub struct OrganizationsApi {
    client: Client,
}

impl OrganizationsApi {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches an organization through the organization cache.
    pub async fn get(&self, id: u64) -> Result<Organization> {
        let client = self.client.clone();
        self.client
            .caches()
            .organizations
            .get_or_fetch(id, move || async move {
                fetch_record(&client, Request::get(format!("organizations/{}.json", id))).await
            })
            .await
    }

    /// Lists every organization.
    pub fn list(&self) -> OffsetPager<Organization> {
        list(&self.client, Request::get("organizations.json"))
    }

    /// Creates an organization.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`](crate::Error::Validation) if the server
    /// rejects the record, e.g. because the name is taken.
    pub async fn create(&self, organization: &NewOrganization) -> Result<Organization> {
        let request = Request::post("organizations.json")
            .with_json_body(&json!({ "organization": organization }))?;
        let created: Organization = fetch_record(&self.client, request).await?;

        tracing::info!(organization_id = created.id, "Created organization");
        self.client
            .caches()
            .organizations
            .insert(created.id, created.clone());
        Ok(created)
    }

    /// Creates an organization, or updates the one with the same external id.
    ///
    /// Without an `external_id` the server matches on the name. Either way
    /// the returned record replaces any cached copy.
    pub async fn create_or_update(&self, organization: &NewOrganization) -> Result<Organization> {
        let request = Request::post("organizations/create_or_update.json")
            .with_json_body(&json!({ "organization": organization }))?;
        let saved: Organization = fetch_record(&self.client, request).await?;

        tracing::info!(
            organization_id = saved.id,
            external_id = ?organization.external_id,
            "Created or updated organization"
        );
        let cache = &self.client.caches().organizations;
        cache.invalidate(&saved.id);
        cache.insert(saved.id, saved.clone());
        Ok(saved)
    }

    /// Updates an organization and refreshes its cache entry.
    pub async fn update(&self, id: u64, update: &OrganizationUpdate) -> Result<Organization> {
        let request = Request::put(format!("organizations/{}.json", id))
            .with_json_body(&json!({ "organization": update }))?;
        let updated: Organization = fetch_record(&self.client, request).await?;

        let cache = &self.client.caches().organizations;
        cache.invalidate(&id);
        cache.insert(id, updated.clone());
        Ok(updated)
    }

    /// Deletes an organization and drops its cache entry.
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client
            .delete(format!("organizations/{}.json", id))
            .await?;
        self.client.caches().organizations.invalidate(&id);
        tracing::info!(organization_id = id, "Deleted organization");
        Ok(())
    }
}
