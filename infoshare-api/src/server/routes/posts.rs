use crate::server::{Result, ServerError, ServerRouter, json::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use infoshare_common::{
    model::{
        Id, IdParseError,
        post::{CreatePost, Post, PostMarker, PostUpdate},
    },
    util,
};
use infoshare_db::store::PostStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_post)
        .typed_get(list_posts)
        .typed_get(get_post)
        .typed_patch(update_post)
        .typed_delete(delete_post)
        .typed_get(missing_post_id)
        .typed_patch(missing_post_id)
        .typed_delete(missing_post_id)
}

#[derive(TypedPath)]
#[typed_path("/api/posts")]
struct PostsPath;

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: String,
}

/// `/api/posts/{id}` with an empty id, which the `{id}` capture never matches.
#[derive(TypedPath)]
#[typed_path("/api/posts/")]
struct EmptyPostPath;

impl PostPath {
    fn post_id(&self) -> Result<Id<PostMarker>> {
        self.id.parse().map_err(|err| match err {
            IdParseError::Empty => ServerError::MissingPostId,
            IdParseError::Invalid(id) => ServerError::InvalidPostId(id),
        })
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct MessageResponse {
    message: &'static str,
}

async fn create_post(
    _: PostsPath,
    State(store): State<Arc<dyn PostStore>>,
    Json(post): Json<CreatePost>,
) -> Result<(StatusCode, Json<Post>)> {
    post.validate()?;

    let date = util::now();
    let post_id = store
        .create_post(&post, date)
        .await
        .map_err(ServerError::CreatePost)?;

    debug!(%post_id, "Created post");

    Ok((StatusCode::CREATED, Json(post.into_post(post_id, date))))
}

async fn list_posts(
    _: PostsPath,
    State(store): State<Arc<dyn PostStore>>,
) -> Result<Json<Vec<Post>>> {
    let posts = store.fetch_posts().await.map_err(|err| {
        if err.is_decode() {
            ServerError::DecodePosts(err)
        } else {
            ServerError::FetchPosts(err)
        }
    })?;

    Ok(Json(posts))
}

async fn get_post(
    path: PostPath,
    State(store): State<Arc<dyn PostStore>>,
) -> Result<Json<Post>> {
    let post_id = path.post_id()?;
    let post = store
        .fetch_post(post_id)
        .await
        .map_err(ServerError::FetchPost)?
        .ok_or(ServerError::PostByIdNotFound(post_id))?;

    Ok(Json(post))
}

/// The body is extracted fallibly so a malformed id is reported before a malformed body.
async fn update_post(
    path: PostPath,
    State(store): State<Arc<dyn PostStore>>,
    body: Result<Json<Map<String, Value>>>,
) -> Result<Json<Post>> {
    let post_id = path.post_id()?;
    let Json(fields) = body?;
    let update = PostUpdate::try_from(fields)?;

    let matched = store
        .update_post(post_id, &update, util::now())
        .await
        .map_err(ServerError::UpdatePost)?;
    if matched == 0 {
        return Err(ServerError::PostByIdNotFound(post_id));
    }

    debug!(%post_id, "Updated post");

    // Not atomic with the update; a concurrent delete surfaces as a failed re-fetch.
    let post = store
        .fetch_post(post_id)
        .await
        .map_err(ServerError::FetchUpdatedPost)?
        .ok_or(ServerError::UpdatedPostMissing(post_id))?;

    Ok(Json(post))
}

async fn delete_post(
    path: PostPath,
    State(store): State<Arc<dyn PostStore>>,
) -> Result<Json<MessageResponse>> {
    let post_id = path.post_id()?;
    let deleted = store
        .delete_post(post_id)
        .await
        .map_err(ServerError::DeletePost)?;
    if deleted == 0 {
        return Err(ServerError::PostByIdNotFound(post_id));
    }

    debug!(%post_id, "Deleted post");

    Ok(Json(MessageResponse {
        message: "Post deleted successfully",
    }))
}

async fn missing_post_id(_: EmptyPostPath) -> ServerError {
    ServerError::MissingPostId
}
