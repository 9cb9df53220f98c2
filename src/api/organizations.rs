//! `/api/v1/organizations/*`.

use crate::api::{acknowledge, list, segment};
use crate::client::{ApiRequest, PlintoClient};
use crate::error::{PlintoError, Result};
use crate::types::{
    CreateOrganizationRequest, InviteMemberRequest, MessageResponse, Organization,
    OrganizationMember, UpdateOrganizationRequest,
};

#[derive(Debug, Clone, Copy)]
pub struct Organizations<'a> {
    client: &'a PlintoClient,
}

fn org_path(org_id: &str) -> String {
    format!("/api/v1/organizations/{}", segment(org_id))
}

impl<'a> Organizations<'a> {
    pub(crate) fn new(client: &'a PlintoClient) -> Self {
        Self { client }
    }

    /// Organizations the signed-in user belongs to.
    pub async fn list(&self) -> Result<Vec<Organization>> {
        list(self.client, ApiRequest::get("/api/v1/organizations")).await
    }

    pub async fn create(&self, request: &CreateOrganizationRequest) -> Result<Organization> {
        if request.name.trim().is_empty() {
            return Err(PlintoError::validation("name", "organization name is required"));
        }
        if request.slug.is_empty()
            || !request
                .slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(PlintoError::validation(
                "slug",
                "slug may only contain lowercase letters, digits and '-'",
            ));
        }
        self.client.post("/api/v1/organizations", request).await
    }

    pub async fn get(&self, org_id: &str) -> Result<Organization> {
        self.client.get(&org_path(org_id)).await
    }

    pub async fn update(
        &self,
        org_id: &str,
        update: &UpdateOrganizationRequest,
    ) -> Result<Organization> {
        self.client.patch(&org_path(org_id), update).await
    }

    pub async fn delete(&self, org_id: &str) -> Result<MessageResponse> {
        acknowledge(self.client, ApiRequest::delete(org_path(org_id))).await
    }

    pub async fn members(&self, org_id: &str) -> Result<Vec<OrganizationMember>> {
        let path = format!("{}/members", org_path(org_id));
        list(self.client, ApiRequest::get(path)).await
    }

    pub async fn invite_member(
        &self,
        org_id: &str,
        invite: &InviteMemberRequest,
    ) -> Result<MessageResponse> {
        crate::auth::validation::validate_email(&invite.email)?;
        let path = format!("{}/members", org_path(org_id));
        acknowledge(self.client, ApiRequest::post(path).with_json(invite)?).await
    }

    pub async fn remove_member(&self, org_id: &str, user_id: &str) -> Result<MessageResponse> {
        let path = format!("{}/members/{}", org_path(org_id), segment(user_id));
        acknowledge(self.client, ApiRequest::delete(path)).await
    }
}
