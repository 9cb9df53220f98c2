//! `/api/v1/sessions/*`: the signed-in user's device sessions.

use crate::api::{acknowledge, list, segment};
use crate::client::{ApiRequest, PlintoClient};
use crate::error::Result;
use crate::types::{MessageResponse, Session};

#[derive(Debug, Clone, Copy)]
pub struct Sessions<'a> {
    client: &'a PlintoClient,
}

impl<'a> Sessions<'a> {
    pub(crate) fn new(client: &'a PlintoClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Session>> {
        list(self.client, ApiRequest::get("/api/v1/sessions")).await
    }

    pub async fn revoke(&self, session_id: &str) -> Result<MessageResponse> {
        let path = format!("/api/v1/sessions/{}", segment(session_id));
        acknowledge(self.client, ApiRequest::delete(path)).await
    }

    /// Revoke every session except the one this client is using.
    pub async fn revoke_all_others(&self) -> Result<MessageResponse> {
        acknowledge(self.client, ApiRequest::delete("/api/v1/sessions")).await
    }
}
