//! Typed wrappers around the Plinto REST endpoints, grouped by resource.
//!
//! Each group borrows the [`crate::PlintoClient`] it came from, so calls go
//! through the same token pipeline.

pub mod admin;
pub mod auth;
pub mod mfa;
pub mod organizations;
pub mod sessions;
pub mod users;

pub use admin::Admin;
pub use auth::{Auth, OAuthSession};
pub use mfa::Mfa;
pub use organizations::Organizations;
pub use sessions::Sessions;
pub use users::Users;

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::client::{ApiRequest, PlintoClient};
use crate::error::Result;
use crate::types::{ListResponse, MessageResponse};

/// Send a request whose body, if any, is only an acknowledgement.
pub(crate) async fn acknowledge(
    client: &PlintoClient,
    request: ApiRequest,
) -> Result<MessageResponse> {
    Ok(client
        .send::<Option<MessageResponse>>(request)
        .await?
        .unwrap_or_default())
}

/// List endpoints answer either a bare array or a [`ListResponse`] page.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Items(Vec<T>),
    Page(ListResponse<T>),
}

pub(crate) async fn list<T: DeserializeOwned>(
    client: &PlintoClient,
    request: ApiRequest,
) -> Result<Vec<T>> {
    Ok(match client.send::<Listing<T>>(request).await? {
        Listing::Items(items) => items,
        Listing::Page(page) => page.items,
    })
}

/// Path segments come from callers; keep them from escaping their slot.
pub(crate) fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}
