use async_trait::async_trait;
use infoshare_common::model::{
    Id, ModelValidationError,
    post::{CreatePost, Post, PostMarker, PostUpdate},
};
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("A record in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("A record in the database could not be decoded: {0}")]
    Decode(mongodb::error::Error),
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),
}

impl DbError {
    /// Whether the store answered, but with records that do not form valid posts.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, DbError::Data(_) | DbError::Decode(_))
    }
}

/// The post collection. Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Inserts a new post stamped with `date` and returns its store-assigned id.
    async fn create_post(
        &self,
        post: &CreatePost,
        date: OffsetDateTime,
    ) -> Result<Id<PostMarker>>;

    /// All posts in store order.
    async fn fetch_posts(&self) -> Result<Vec<Post>>;

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>>;

    /// Merges `update` into the post and refreshes its date. Returns the number of matched posts.
    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        update: &PostUpdate,
        date: OffsetDateTime,
    ) -> Result<u64>;

    /// Returns the number of deleted posts.
    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<u64>;
}
