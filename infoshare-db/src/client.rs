use crate::{
    record::{PostRecord, id_filter, update_document},
    store::{DbError, PostStore, Result},
};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use infoshare_common::model::{
    Id,
    post::{CreatePost, Post, PostMarker, PostUpdate},
};
use mongodb::{
    Client, Collection,
    bson::doc,
    error::{Error as MongoError, ErrorKind},
};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::time::timeout;
use tracing::info;

/// MongoDB backed [`PostStore`]. Every operation is bounded by the configured timeout.
#[derive(Clone, Debug)]
pub struct DbClient {
    posts: Collection<PostRecord>,
    timeout: Duration,
}

impl DbClient {
    /// Connects to `uri` and pings `database` before handing out a client.
    pub async fn connect(
        uri: &str,
        database: &str,
        collection: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let database = client.database(database);

        with_timeout(timeout, async {
            database
                .run_command(doc! { "ping": 1 })
                .await
                .map_err(DbError::from)
        })
        .await?;

        info!(database = database.name(), collection, "Connected to MongoDB");

        Ok(Self {
            posts: database.collection(collection),
            timeout,
        })
    }

    async fn timed<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        with_timeout(self.timeout, operation).await
    }
}

#[async_trait]
impl PostStore for DbClient {
    async fn create_post(
        &self,
        post: &CreatePost,
        date: OffsetDateTime,
    ) -> Result<Id<PostMarker>> {
        let post_id = Id::generate();
        let record = PostRecord::new(post_id, post, date);

        self.timed(async { self.posts.insert_one(record).await.map_err(DbError::from) })
            .await?;

        Ok(post_id)
    }

    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let records: Vec<PostRecord> = self
            .timed(async {
                let cursor = self.posts.find(doc! {}).await.map_err(DbError::from)?;
                cursor
                    .try_collect::<Vec<_>>()
                    .await
                    .map_err(decode_error)
            })
            .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = self
            .timed(async {
                self.posts
                    .find_one(id_filter(post_id))
                    .await
                    .map_err(decode_error)
            })
            .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        update: &PostUpdate,
        date: OffsetDateTime,
    ) -> Result<u64> {
        let result = self
            .timed(async {
                self.posts
                    .update_one(id_filter(post_id), update_document(update, date))
                    .await
                    .map_err(DbError::from)
            })
            .await?;

        Ok(result.matched_count)
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<u64> {
        let result = self
            .timed(async {
                self.posts
                    .delete_one(id_filter(post_id))
                    .await
                    .map_err(DbError::from)
            })
            .await?;

        Ok(result.deleted_count)
    }
}

async fn with_timeout<T>(
    duration: Duration,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    timeout(duration, operation)
        .await
        .map_err(|_| DbError::Timeout(duration))?
}

fn decode_error(error: MongoError) -> DbError {
    if matches!(*error.kind, ErrorKind::BsonDeserialization(_)) {
        DbError::Decode(error)
    } else {
        DbError::Mongo(error)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        client::{decode_error, with_timeout},
        record::PostRecord,
        store::DbError,
    };
    use mongodb::{
        bson::{self, doc},
        error::Error as MongoError,
    };
    use std::{io, time::Duration};
    use tokio::time::sleep;

    #[tokio::test]
    async fn operations_are_bounded() {
        let result = with_timeout(Duration::from_millis(10), async {
            sleep(Duration::from_secs(5)).await;
            Ok::<_, DbError>(())
        })
        .await;

        assert!(matches!(
            result,
            Err(DbError::Timeout(duration)) if duration == Duration::from_millis(10)
        ));
    }

    #[tokio::test]
    async fn fast_operations_pass_through() {
        let value = with_timeout(Duration::from_secs(5), async { Ok::<_, DbError>(42) })
            .await
            .unwrap();
        assert_eq!(value, 42);

        let error = with_timeout(Duration::from_secs(5), async {
            Err::<(), _>(DbError::Timeout(Duration::ZERO))
        })
        .await;
        assert!(matches!(error, Err(DbError::Timeout(Duration::ZERO))));
    }

    #[test]
    fn malformed_documents_are_decode_errors() {
        let malformed = bson::from_document::<PostRecord>(doc! { "title": 7 }).unwrap_err();

        let error = decode_error(MongoError::from(malformed));
        assert!(error.is_decode());
        assert!(matches!(error, DbError::Decode(_)));
    }

    #[test]
    fn driver_failures_are_not_decode_errors() {
        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "connection reset");

        let error = decode_error(MongoError::from(reset));
        assert!(!error.is_decode());
        assert!(matches!(error, DbError::Mongo(_)));
    }
}
