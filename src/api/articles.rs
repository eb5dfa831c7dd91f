use reqwest::Method;
use serde_json::Value;

use super::{ArticleId, CategoryId, UserId};
use crate::client::{ApiClient, Body, FormPart, PartValue};
use crate::error::Error;

/// Canonical article record.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    pub author_id: Option<UserId>,
    pub author_name: Option<String>,
    pub category_ids: Vec<CategoryId>,
    pub featured_image_url: Option<String>,
    pub created_at: Option<String>,
}

impl Article {
    /// Map one backend article object into the canonical record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedShape`] only when no id can be found under
    /// any spelling; every other field degrades to an empty or absent value.
    pub(crate) fn from_value(value: &Value) -> Result<Self, Error> {
        let id = super::id_field(value, &["articleId", "ArticleId"])
            .ok_or_else(|| Error::UnexpectedShape("article without id".into()))?;

        let category_ids = super::field(value, &["categoryIds", "CategoryIds", "categories", "Categories"])
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|c| match c {
                        Value::Object(_) => super::id_field(c, &["categoryId", "CategoryId"]),
                        scalar => super::scalar_string(scalar),
                    })
                    .map(CategoryId)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            id: ArticleId(id),
            title: super::string_field(value, &["title", "Title"]).unwrap_or_default(),
            content: super::string_field(value, &["content", "Content"]).unwrap_or_default(),
            author_id: super::string_field(value, &["authorId", "autherId", "AuthorId", "userId"])
                .map(UserId),
            author_name: super::string_field(value, &["authorName", "autherName", "author", "Auther"]),
            category_ids,
            featured_image_url: super::string_field(
                value,
                &["featuredImage", "FeaturedImage", "featuredImageUrl", "imageUrl"],
            ),
            created_at: super::string_field(value, &["createdAt", "CreatedAt", "created_at"]),
        })
    }
}

/// File attached to an article (featured image).
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Outbound article payload for create and update, sent as multipart form
/// data (the backend expects `Title`/`Content`/`CategoryIds`/`FeaturedImage`).
#[derive(Debug, Clone, Default)]
pub struct ArticleDraft {
    title: Option<String>,
    content: Option<String>,
    category_ids: Vec<CategoryId>,
    featured_image: Option<FileUpload>,
}

impl ArticleDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn with_category_ids(mut self, ids: Vec<CategoryId>) -> Self {
        self.category_ids = ids;
        self
    }

    #[must_use]
    pub fn with_featured_image(mut self, image: FileUpload) -> Self {
        self.featured_image = Some(image);
        self
    }

    pub(crate) fn into_parts(self) -> Vec<FormPart> {
        let mut parts = Vec::new();
        if let Some(title) = self.title {
            parts.push(FormPart {
                name: "Title".into(),
                value: PartValue::Text(title),
            });
        }
        if let Some(content) = self.content {
            parts.push(FormPart {
                name: "Content".into(),
                value: PartValue::Text(content),
            });
        }
        // Repeated field, one entry per category.
        for id in self.category_ids {
            parts.push(FormPart {
                name: "CategoryIds".into(),
                value: PartValue::Text(id.0),
            });
        }
        if let Some(image) = self.featured_image {
            parts.push(FormPart {
                name: "FeaturedImage".into(),
                value: PartValue::File {
                    filename: image.filename,
                    content_type: image.content_type,
                    bytes: image.bytes,
                },
            });
        }
        parts
    }
}

/// Query for the article listing. Every filter is optional; the default
/// query lists everything.
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    page: Option<u32>,
    page_size: Option<u32>,
    search: Option<String>,
}

impl ArticleQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Only the filters that were set become query parameters.
    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("PageNumber", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            params.push(("PageSize", page_size.to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        params
    }
}

impl ApiClient {
    /// List articles matching the query.
    pub async fn articles(&self, query: ArticleQuery) -> Result<Vec<Article>, Error> {
        let value = self
            .request(Method::GET, "/api/Article", &query.to_params(), Body::Empty)
            .await?;
        super::items(&value)
            .into_iter()
            .map(Article::from_value)
            .collect()
    }

    /// Fetch one article by id.
    pub async fn article(&self, id: &ArticleId) -> Result<Article, Error> {
        let value = self
            .request(Method::GET, &format!("/api/Article/{id}"), &[], Body::Empty)
            .await?;
        Article::from_value(super::payload(&value))
    }

    /// Create an article. Returns the created record when the backend echoes
    /// one back; some deployments return only a bare success envelope.
    pub async fn create_article(&self, draft: ArticleDraft) -> Result<Option<Article>, Error> {
        let value = self
            .request(
                Method::POST,
                "/api/Article",
                &[],
                Body::Multipart(draft.into_parts()),
            )
            .await?;
        Ok(Article::from_value(super::payload(&value)).ok())
    }

    /// Update an article. Same response tolerance as
    /// [`create_article`](ApiClient::create_article).
    pub async fn update_article(
        &self,
        id: &ArticleId,
        draft: ArticleDraft,
    ) -> Result<Option<Article>, Error> {
        let value = self
            .request(
                Method::PUT,
                &format!("/api/Article/{id}"),
                &[],
                Body::Multipart(draft.into_parts()),
            )
            .await?;
        Ok(Article::from_value(super::payload(&value)).ok())
    }

    /// Delete an article.
    pub async fn delete_article(&self, id: &ArticleId) -> Result<(), Error> {
        self.request(
            Method::DELETE,
            &format!("/api/Article/{id}"),
            &[],
            Body::Empty,
        )
        .await?;
        Ok(())
    }

    /// Articles written by one author. The backend path really is spelled
    /// `auther`.
    pub async fn articles_by_author(&self, author: &UserId) -> Result<Vec<Article>, Error> {
        let value = self
            .request(
                Method::GET,
                &format!("/api/Article/auther/{author}"),
                &[],
                Body::Empty,
            )
            .await?;
        super::items(&value)
            .into_iter()
            .map(Article::from_value)
            .collect()
    }

    /// Articles filed under one category.
    pub async fn articles_by_category(&self, category: &CategoryId) -> Result<Vec<Article>, Error> {
        let value = self
            .request(
                Method::GET,
                &format!("/api/Article/category/{category}"),
                &[],
                Body::Empty,
            )
            .await?;
        super::items(&value)
            .into_iter()
            .map(Article::from_value)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_pascal_case_variant() {
        let article = Article::from_value(&json!({
            "Id": 3,
            "Title": "قانون العمل الجديد",
            "Content": "...",
            "AuthorId": "u-7",
            "CategoryIds": ["c1", 2],
        }))
        .unwrap();

        assert_eq!(article.id, ArticleId::from("3"));
        assert_eq!(article.title, "قانون العمل الجديد");
        assert_eq!(article.author_id, Some(UserId::from("u-7")));
        assert_eq!(
            article.category_ids,
            vec![CategoryId::from("c1"), CategoryId::from("2")]
        );
    }

    #[test]
    fn from_value_category_objects() {
        let article = Article::from_value(&json!({
            "_id": "a1",
            "title": "t",
            "categories": [{"id": 5, "name": "Labor"}, {"CategoryId": "c9"}],
        }))
        .unwrap();
        assert_eq!(
            article.category_ids,
            vec![CategoryId::from("5"), CategoryId::from("c9")]
        );
    }

    #[test]
    fn from_value_without_id_is_rejected() {
        assert!(Article::from_value(&json!({"title": "orphan"})).is_err());
    }

    #[test]
    fn missing_optional_fields_degrade() {
        let article = Article::from_value(&json!({"id": "a2"})).unwrap();
        assert_eq!(article.title, "");
        assert_eq!(article.author_id, None);
        assert!(article.category_ids.is_empty());
    }

    #[test]
    fn draft_builds_repeated_category_parts() {
        let parts = ArticleDraft::new()
            .with_title("t")
            .with_category_ids(vec![CategoryId::from("1"), CategoryId::from("2")])
            .into_parts();

        let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Title", "CategoryIds", "CategoryIds"]);
    }

    #[test]
    fn query_maps_only_set_filters() {
        assert!(ArticleQuery::new().to_params().is_empty());

        let params = ArticleQuery::new()
            .with_page(2)
            .with_page_size(20)
            .with_search("عقد")
            .to_params();
        assert_eq!(
            params,
            vec![
                ("PageNumber", "2".to_owned()),
                ("PageSize", "20".to_owned()),
                ("search", "عقد".to_owned()),
            ]
        );
    }

    #[test]
    fn draft_skips_absent_fields() {
        let parts = ArticleDraft::new().with_content("c").into_parts();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "Content");
    }
}
