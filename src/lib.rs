#![doc = include_str!("../README.md")]

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod singleflight;
pub mod storage;

// Re-exports for convenient access
pub use api::{
    Article, ArticleDraft, ArticleId, ArticleQuery, Category, CategoryDraft, CategoryId, Comment,
    CommentDraft, CommentId, FileUpload, LikeState, ManagedUser, Paginated, UserId, UserQuery,
};
pub use client::ApiClient;
pub use config::{ClientConfig, Language};
pub use error::Error;
pub use session::{LoginOutcome, Principal, Role, Session};
pub use singleflight::{Flight, SingleFlight};
pub use storage::{FileStorage, MemoryStorage, StorageScopes, TokenStorage};
