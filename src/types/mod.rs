//! Request and response shapes of the Plinto REST API.

pub mod admin;
pub mod mfa;
pub mod organization;
pub mod session;
pub mod user;

pub use admin::{AdminStats, AdminUserQuery};
pub use mfa::{MfaSetup, MfaStatus};
pub use organization::{
    CreateOrganizationRequest, InviteMemberRequest, Organization, OrganizationMember,
    OrganizationRole, UpdateOrganizationRequest,
};
pub use session::Session;
pub use user::{SignInRequest, SignUpRequest, UpdateUserRequest, User};

use serde::{Deserialize, Serialize};

/// A page of results from a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    #[serde(alias = "data")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
}

fn first_page() -> u32 {
    1
}

/// Body of endpoints that only acknowledge an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}
