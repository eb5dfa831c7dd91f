use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::CategoryId;
use crate::client::{ApiClient, Body};
use crate::error::Error;

/// Canonical category record.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

impl Category {
    pub(crate) fn from_value(value: &Value) -> Result<Self, Error> {
        let id = super::id_field(value, &["categoryId", "CategoryId"])
            .ok_or_else(|| Error::UnexpectedShape("category without id".into()))?;
        Ok(Self {
            id: CategoryId(id),
            name: super::string_field(value, &["name", "Name"]).unwrap_or_default(),
            description: super::string_field(value, &["description", "Description"]),
        })
    }
}

/// Outbound category payload for create and update (JSON body).
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDraft {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CategoryDraft {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn into_body(self) -> Result<Body, Error> {
        let value = serde_json::to_value(self)
            .map_err(|e| Error::UnexpectedShape(format!("category payload: {e}")))?;
        Ok(Body::Json(value))
    }
}

impl ApiClient {
    /// List all categories.
    pub async fn categories(&self) -> Result<Vec<Category>, Error> {
        let value = self
            .request(Method::GET, "/api/Category", &[], Body::Empty)
            .await?;
        super::items(&value)
            .into_iter()
            .map(Category::from_value)
            .collect()
    }

    /// Fetch one category by id.
    pub async fn category(&self, id: &CategoryId) -> Result<Category, Error> {
        let value = self
            .request(Method::GET, &format!("/api/Category/{id}"), &[], Body::Empty)
            .await?;
        Category::from_value(super::payload(&value))
    }

    /// Create a category.
    pub async fn create_category(&self, draft: CategoryDraft) -> Result<Option<Category>, Error> {
        let value = self
            .request(Method::POST, "/api/Category", &[], draft.into_body()?)
            .await?;
        Ok(Category::from_value(super::payload(&value)).ok())
    }

    /// Update a category.
    pub async fn update_category(
        &self,
        id: &CategoryId,
        draft: CategoryDraft,
    ) -> Result<Option<Category>, Error> {
        let value = self
            .request(
                Method::PUT,
                &format!("/api/Category/{id}"),
                &[],
                draft.into_body()?,
            )
            .await?;
        Ok(Category::from_value(super::payload(&value)).ok())
    }

    /// Delete a category.
    pub async fn delete_category(&self, id: &CategoryId) -> Result<(), Error> {
        self.request(
            Method::DELETE,
            &format!("/api/Category/{id}"),
            &[],
            Body::Empty,
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
    fn from_value_variants() {
        let c = Category::from_value(&json!({"Id": 4, "Name": "أحوال شخصية"})).unwrap();
        assert_eq!(c.id, CategoryId::from("4"));
        assert_eq!(c.name, "أحوال شخصية");
        assert_eq!(c.description, None);

        let c = Category::from_value(&json!({
            "_id": "c2", "name": "Labor", "Description": "Employment law"
        }))
        .unwrap();
        assert_eq!(c.description.as_deref(), Some("Employment law"));
    }

    #[test]
    fn draft_serializes_backend_field_names() {
        let body = serde_json::to_value(CategoryDraft::new("Labor")).unwrap();
        assert_eq!(body, json!({"Name": "Labor"}));

        let body =
            serde_json::to_value(CategoryDraft::new("Labor").with_description("d")).unwrap();
        assert_eq!(body, json!({"Name": "Labor", "Description": "d"}));
    }
}
