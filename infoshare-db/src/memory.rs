//! In-memory [`PostStore`], used where no MongoDB instance is available.

use crate::store::{PostStore, Result};
use async_trait::async_trait;
use infoshare_common::model::{
    Id,
    post::{CreatePost, Post, PostMarker, PostUpdate},
};
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// Posts kept in insertion order. Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryPostStore {
    posts: RwLock<Vec<Post>>,
}

impl MemoryPostStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn create_post(
        &self,
        post: &CreatePost,
        date: OffsetDateTime,
    ) -> Result<Id<PostMarker>> {
        let post_id = Id::generate();
        self.posts
            .write()
            .await
            .push(post.clone().into_post(post_id, date));

        Ok(post_id)
    }

    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        Ok(self.posts.read().await.clone())
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|post| post.id == post_id).cloned())
    }

    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        update: &PostUpdate,
        date: OffsetDateTime,
    ) -> Result<u64> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.iter_mut().find(|post| post.id == post_id) else {
            return Ok(0);
        };

        update.apply(post);
        post.date = date;
        Ok(1)
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<u64> {
        let mut posts = self.posts.write().await;
        let count_before = posts.len();
        posts.retain(|post| post.id != post_id);

        Ok(u64::from(posts.len() < count_before))
    }
}

#[cfg(test)]
mod tests {
    use crate::{memory::MemoryPostStore, store::PostStore};
    use infoshare_common::model::{
        Id,
        post::{CreatePost, PostUpdate},
    };
    use time::macros::datetime;

    fn create_post(title: &str) -> CreatePost {
        CreatePost {
            title: title.to_owned(),
            description: "description".to_owned(),
            image: None,
        }
    }

    #[tokio::test]
    async fn crud() {
        let store = MemoryPostStore::new();
        let created_at = datetime!(2025-10-24 10:30 UTC);
        let updated_at = datetime!(2025-10-24 11:00 UTC);

        let first = store
            .create_post(&create_post("first"), created_at)
            .await
            .unwrap();
        let second = store
            .create_post(&create_post("second"), created_at)
            .await
            .unwrap();
        assert_ne!(first, second);

        let titles: Vec<_> = store
            .fetch_posts()
            .await
            .unwrap()
            .into_iter()
            .map(|post| post.title)
            .collect();
        assert_eq!(titles, ["first", "second"]);

        let update = PostUpdate {
            title: Some("renamed".to_owned()),
            ..PostUpdate::default()
        };
        assert_eq!(
            store.update_post(first, &update, updated_at).await.unwrap(),
            1
        );

        let post = store.fetch_post(first).await.unwrap().unwrap();
        assert_eq!(post.title, "renamed");
        assert_eq!(post.description, "description");
        assert_eq!(post.date, updated_at);

        assert_eq!(store.delete_post(first).await.unwrap(), 1);
        assert_eq!(store.delete_post(first).await.unwrap(), 0);
        assert_eq!(store.fetch_post(first).await.unwrap(), None);
        assert_eq!(store.fetch_posts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_posts_match_nothing() {
        let store = MemoryPostStore::new();
        let update = PostUpdate {
            description: Some("new".to_owned()),
            ..PostUpdate::default()
        };

        assert_eq!(
            store
                .update_post(Id::generate(), &update, datetime!(2025-10-24 10:30 UTC))
                .await
                .unwrap(),
            0
        );
        assert_eq!(store.delete_post(Id::generate()).await.unwrap(), 0);
    }
}
