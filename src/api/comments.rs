use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::{ArticleId, CommentId, UserId};
use crate::client::{ApiClient, Body};
use crate::error::Error;

/// Canonical comment record, scoped to an article.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Comment {
    pub id: CommentId,
    pub article_id: Option<ArticleId>,
    pub author_id: Option<UserId>,
    pub author_name: Option<String>,
    pub content: String,
    pub created_at: Option<String>,
}

impl Comment {
    pub(crate) fn from_value(value: &Value) -> Result<Self, Error> {
        let id = super::id_field(value, &["commentId", "CommentId"])
            .ok_or_else(|| Error::UnexpectedShape("comment without id".into()))?;
        Ok(Self {
            id: CommentId(id),
            article_id: super::string_field(value, &["articleId", "ArticleId"]).map(ArticleId),
            author_id: super::string_field(value, &["userId", "UserId", "authorId"]).map(UserId),
            author_name: super::string_field(value, &["userName", "authorName", "Name"]),
            content: super::string_field(value, &["content", "Content", "text"]).unwrap_or_default(),
            created_at: super::string_field(value, &["createdAt", "CreatedAt", "created_at"]),
        })
    }
}

/// Outbound comment payload (JSON body).
#[derive(Debug, Clone, Serialize)]
pub struct CommentDraft {
    #[serde(rename = "ArticleId")]
    pub article_id: ArticleId,
    #[serde(rename = "Content")]
    pub content: String,
}

impl CommentDraft {
    #[must_use]
    pub fn new(article_id: ArticleId, content: impl Into<String>) -> Self {
        Self {
            article_id,
            content: content.into(),
        }
    }
}

impl ApiClient {
    /// Comments on one article.
    pub async fn article_comments(&self, article: &ArticleId) -> Result<Vec<Comment>, Error> {
        let value = self
            .request(
                Method::GET,
                &format!("/api/Comment/article/{article}"),
                &[],
                Body::Empty,
            )
            .await?;
        super::items(&value)
            .into_iter()
            .map(Comment::from_value)
            .collect()
    }

    /// Fetch one comment by id.
    pub async fn comment(&self, id: &CommentId) -> Result<Comment, Error> {
        let value = self
            .request(Method::GET, &format!("/api/Comment/{id}"), &[], Body::Empty)
            .await?;
        Comment::from_value(super::payload(&value))
    }

    /// Create a comment.
    pub async fn create_comment(&self, draft: CommentDraft) -> Result<Option<Comment>, Error> {
        let value = serde_json::to_value(&draft)
            .map_err(|e| Error::UnexpectedShape(format!("comment payload: {e}")))?;
        let response = self
            .request(Method::POST, "/api/Comment", &[], Body::Json(value))
            .await?;
        Ok(Comment::from_value(super::payload(&response)).ok())
    }

    /// Replace a comment's content.
    pub async fn update_comment(
        &self,
        id: &CommentId,
        content: impl Into<String> + Send,
    ) -> Result<Option<Comment>, Error> {
        let response = self
            .request(
                Method::PUT,
                &format!("/api/Comment/{id}"),
                &[],
                Body::Json(serde_json::json!({ "Content": content.into() })),
            )
            .await?;
        Ok(Comment::from_value(super::payload(&response)).ok())
    }

    /// Delete a comment.
    pub async fn delete_comment(&self, id: &CommentId) -> Result<(), Error> {
        self.request(
            Method::DELETE,
            &format!("/api/Comment/{id}"),
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
        let c = Comment::from_value(&json!({
            "CommentId": 12,
            "ArticleId": "a1",
            "UserId": "u1",
            "userName": "Huda",
            "Content": "تعليق",
        }))
        .unwrap();
        assert_eq!(c.id, CommentId::from("12"));
        assert_eq!(c.article_id, Some(ArticleId::from("a1")));
        assert_eq!(c.author_name.as_deref(), Some("Huda"));
        assert_eq!(c.content, "تعليق");
    }

    #[test]
    fn from_value_requires_id() {
        assert!(Comment::from_value(&json!({"content": "x"})).is_err());
    }

    #[test]
    fn draft_serializes_backend_field_names() {
        let draft = CommentDraft::new(ArticleId::from("a1"), "hello");
        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            json!({"ArticleId": "a1", "Content": "hello"})
        );
    }
}
