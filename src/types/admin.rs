use serde::{Deserialize, Serialize};

/// Tenant-wide counters from `GET /api/v1/admin/stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub active_users: u64,
    #[serde(default)]
    pub suspended_users: u64,
    #[serde(default)]
    pub total_organizations: u64,
    #[serde(default)]
    pub active_sessions: u64,
}

/// Filters for `GET /api/v1/admin/users`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminUserQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

impl AdminUserQuery {
    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            query.push(("per_page".to_string(), per_page.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            query.push(("search".to_string(), search.to_string()));
        }
        query
    }
}
