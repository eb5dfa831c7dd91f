use reqwest::Method;
use serde_json::Value;

use super::ArticleId;
use crate::client::{ApiClient, Body};
use crate::error::Error;

/// Like state for an article, as seen by the current user.
///
/// Count-refresh calls are non-critical UI state: callers typically drop
/// errors from these endpoints silently rather than surfacing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct LikeState {
    pub liked: bool,
    pub count: Option<u64>,
}

fn liked_from(value: &Value) -> Option<bool> {
    let payload = super::payload(value);
    super::bool_field(payload, &["liked", "isLiked", "IsLiked", "hasLiked"])
        .or_else(|| payload.as_bool())
}

fn count_from(value: &Value) -> Option<u64> {
    let payload = super::payload(value);
    super::u64_field(payload, &["count", "Count", "likeCount", "likesCount"])
        .or_else(|| payload.as_u64())
}

impl ApiClient {
    /// Toggle the current user's like on an article. Returns the resulting
    /// state; when the backend omits it, the toggle is reported as `liked`
    /// flipping without a count.
    pub async fn toggle_like(&self, article: &ArticleId) -> Result<LikeState, Error> {
        let value = self
            .request(
                Method::POST,
                &format!("/api/Like/toggle/{article}"),
                &[],
                Body::Empty,
            )
            .await?;
        Ok(LikeState {
            liked: liked_from(&value).unwrap_or(false),
            count: count_from(&value),
        })
    }

    /// Total likes on an article.
    pub async fn like_count(&self, article: &ArticleId) -> Result<u64, Error> {
        let value = self
            .request(
                Method::GET,
                &format!("/api/Like/count/{article}"),
                &[],
                Body::Empty,
            )
            .await?;
        count_from(&value)
            .ok_or_else(|| Error::UnexpectedShape("like count response without count".into()))
    }

    /// Whether the current user has liked an article.
    pub async fn has_liked(&self, article: &ArticleId) -> Result<bool, Error> {
        let value = self
            .request(
                Method::GET,
                &format!("/api/Like/check/{article}"),
                &[],
                Body::Empty,
            )
            .await?;
        liked_from(&value)
            .ok_or_else(|| Error::UnexpectedShape("like check response without flag".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn liked_probing() {
        assert_eq!(liked_from(&json!({"isLiked": true})), Some(true));
        assert_eq!(liked_from(&json!({"data": {"liked": false}})), Some(false));
        assert_eq!(liked_from(&json!(true)), Some(true));
        assert_eq!(liked_from(&json!({"unrelated": 1})), None);
    }

    #[test]
    fn count_probing() {
        assert_eq!(count_from(&json!({"count": 3})), Some(3));
        assert_eq!(count_from(&json!({"data": {"likeCount": "9"}})), Some(9));
        assert_eq!(count_from(&json!(12)), Some(12));
        assert_eq!(count_from(&json!({"liked": true})), None);
    }
}
