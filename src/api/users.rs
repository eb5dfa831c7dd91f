use reqwest::Method;
use serde_json::Value;

use super::UserId;
use crate::client::{ApiClient, Body};
use crate::error::Error;
use crate::session::Role;

/// Canonical record for a user row in the role-management screen.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ManagedUser {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub roles: Vec<Role>,
}

impl ManagedUser {
    pub(crate) fn from_value(value: &Value) -> Result<Self, Error> {
        let id = super::id_field(value, &["userId", "UserId"])
            .ok_or_else(|| Error::UnexpectedShape("user without id".into()))?;
        Ok(Self {
            id: UserId(id),
            name: super::string_field(value, &["name", "userName", "Name", "email"])
                .unwrap_or_default(),
            email: super::string_field(value, &["email", "Email", "userName"]),
            roles: Role::from_identity(value),
        })
    }
}

/// One page of a listing, with whatever totals the backend chose to include.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: Option<u64>,
}

/// Query for the paginated user listing.
#[derive(Debug, Clone)]
pub struct UserQuery {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            search: None,
        }
    }
}

impl UserQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

impl ApiClient {
    /// Paginated user listing for the role-management screen.
    pub async fn users(&self, query: UserQuery) -> Result<Paginated<ManagedUser>, Error> {
        let mut params: Vec<(&str, String)> = vec![
            ("PageNumber", query.page.to_string()),
            ("PageSize", query.page_size.to_string()),
        ];
        if let Some(search) = &query.search {
            params.push(("search", search.clone()));
        }

        let value = self
            .request(
                Method::GET,
                "/api/RoleManagement/all-users",
                &params,
                Body::Empty,
            )
            .await?;

        let items = super::items(&value)
            .into_iter()
            .map(ManagedUser::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        let total = super::u64_field(
            super::payload(&value),
            &["totalCount", "TotalCount", "total", "Total"],
        )
        .or_else(|| super::u64_field(&value, &["totalCount", "TotalCount", "total"]));

        Ok(Paginated {
            items,
            page: query.page,
            page_size: query.page_size,
            total,
        })
    }

    /// Assign a role to a user.
    pub async fn update_user_role(&self, user: &UserId, role: &Role) -> Result<(), Error> {
        self.request(
            Method::PUT,
            "/api/RoleManagement/update-role",
            &[],
            Body::Json(serde_json::json!({
                "UserId": user,
                "Role": role,
            })),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_role_as_string_or_array() {
        let u = ManagedUser::from_value(&json!({
            "userId": "u1", "name": "Huda", "role": "Lawyer"
        }))
        .unwrap();
        assert_eq!(u.roles, vec![Role::Lawyer]);

        let u = ManagedUser::from_value(&json!({
            "Id": 2, "Name": "Omar", "Role": ["Admin", "user"]
        }))
        .unwrap();
        assert_eq!(u.roles, vec![Role::Admin, Role::User]);
    }

    #[test]
    fn from_value_name_falls_back_to_email() {
        let u = ManagedUser::from_value(&json!({
            "id": "u3", "email": "x@fahmaan.com"
        }))
        .unwrap();
        assert_eq!(u.name, "x@fahmaan.com");
        assert!(u.roles.is_empty());
    }
}
