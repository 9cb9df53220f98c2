//! `/api/v1/users/*`.

use serde::de::IgnoredAny;

use crate::api::segment;
use crate::client::{AuthEvent, PlintoClient};
use crate::error::Result;
use crate::types::{UpdateUserRequest, User};

#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    client: &'a PlintoClient,
}

impl<'a> Users<'a> {
    pub(crate) fn new(client: &'a PlintoClient) -> Self {
        Self { client }
    }

    /// Fetch the signed-in user and refresh [`PlintoClient::current_user`].
    pub async fn me(&self) -> Result<User> {
        let user: User = self.client.get("/api/v1/users/me").await?;
        self.client.set_cached_user(Some(user.clone()));
        Ok(user)
    }

    pub async fn update_me(&self, update: &UpdateUserRequest) -> Result<User> {
        let user: User = self.client.patch("/api/v1/users/me", update).await?;
        self.client.set_cached_user(Some(user.clone()));
        self.client.emit(AuthEvent::UserUpdated { user: user.clone() });
        Ok(user)
    }

    pub async fn get(&self, user_id: &str) -> Result<User> {
        self.client
            .get(&format!("/api/v1/users/{}", segment(user_id)))
            .await
    }

    /// Delete the signed-in account. The local session ends with it.
    pub async fn delete_me(&self) -> Result<()> {
        self.client
            .delete::<IgnoredAny>("/api/v1/users/me")
            .await?;
        self.client.end_session(AuthEvent::SignedOut);
        Ok(())
    }
}
