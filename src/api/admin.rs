//! `/api/v1/admin/*`. Requires an admin account; other users get 403.

use crate::api::{acknowledge, segment};
use crate::client::{ApiRequest, PlintoClient};
use crate::error::Result;
use crate::types::{AdminStats, AdminUserQuery, ListResponse, MessageResponse, User};

#[derive(Debug, Clone, Copy)]
pub struct Admin<'a> {
    client: &'a PlintoClient,
}

fn user_path(user_id: &str) -> String {
    format!("/api/v1/admin/users/{}", segment(user_id))
}

impl<'a> Admin<'a> {
    pub(crate) fn new(client: &'a PlintoClient) -> Self {
        Self { client }
    }

    pub async fn stats(&self) -> Result<AdminStats> {
        self.client.get("/api/v1/admin/stats").await
    }

    pub async fn list_users(&self, query: &AdminUserQuery) -> Result<ListResponse<User>> {
        let request = query
            .to_query()
            .into_iter()
            .fold(ApiRequest::get("/api/v1/admin/users"), |request, (key, value)| {
                request.with_query(key, value)
            });
        self.client.send(request).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        self.client.get(&user_path(user_id)).await
    }

    pub async fn suspend_user(&self, user_id: &str) -> Result<MessageResponse> {
        let path = format!("{}/suspend", user_path(user_id));
        let request = ApiRequest::post(path).with_json(&serde_json::json!({}))?;
        acknowledge(self.client, request).await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<MessageResponse> {
        acknowledge(self.client, ApiRequest::delete(user_path(user_id))).await
    }
}
