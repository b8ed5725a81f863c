use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use infoshare_common::model::{
    Id,
    post::{InvalidPostError, InvalidUpdateError, PostMarker},
};
use infoshare_db::store::{DbError, PostStore};
use json::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::error;

mod json;
mod routes;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub post_store: Arc<dyn PostStore>,
}

pub fn app(state: ServerState) -> Router {
    routes::routes()
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Route not found")]
    UnknownRoute(Uri),
    #[error("Invalid request path")]
    PathRejection(#[from] PathRejection),
    #[error("Invalid request body")]
    JsonRejection(#[from] JsonRejection),
    #[error("Failed to serialize response")]
    JsonResponse {
        body_type: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    InvalidPost(#[from] InvalidPostError),
    #[error(transparent)]
    InvalidUpdate(#[from] InvalidUpdateError),
    #[error("Post ID is required")]
    MissingPostId,
    #[error("Invalid post ID format")]
    InvalidPostId(String),
    #[error("Post not found")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("Failed to create post")]
    CreatePost(#[source] DbError),
    #[error("Failed to fetch posts")]
    FetchPosts(#[source] DbError),
    #[error("Failed to decode posts")]
    DecodePosts(#[source] DbError),
    #[error("Failed to fetch post")]
    FetchPost(#[source] DbError),
    #[error("Failed to update post")]
    UpdatePost(#[source] DbError),
    #[error("Failed to fetch updated post")]
    FetchUpdatedPost(#[source] DbError),
    #[error("Failed to fetch updated post")]
    UpdatedPostMissing(Id<PostMarker>),
    #[error("Failed to delete post")]
    DeletePost(#[source] DbError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_) | ServerError::PostByIdNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ServerError::PathRejection(_)
            | ServerError::JsonRejection(_)
            | ServerError::InvalidPost(_)
            | ServerError::InvalidUpdate(_)
            | ServerError::MissingPostId
            | ServerError::InvalidPostId(_) => StatusCode::BAD_REQUEST,
            ServerError::JsonResponse { .. }
            | ServerError::CreatePost(_)
            | ServerError::FetchPosts(_)
            | ServerError::DecodePosts(_)
            | ServerError::FetchPost(_)
            | ServerError::UpdatePost(_)
            | ServerError::FetchUpdatedPost(_)
            | ServerError::UpdatedPostMissing(_)
            | ServerError::DeletePost(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Underlying cause, reported to the client next to the error message.
    pub fn details(&self) -> Option<String> {
        match self {
            ServerError::UnknownRoute(uri) => Some(uri.to_string()),
            ServerError::PathRejection(rejection) => Some(rejection.body_text()),
            ServerError::JsonRejection(rejection) => Some(rejection.body_text()),
            ServerError::JsonResponse { body_type, source } => {
                Some(format!("{body_type}: {source}"))
            }
            ServerError::InvalidUpdate(InvalidUpdateError::Fields(err)) => Some(err.to_string()),
            ServerError::CreatePost(err)
            | ServerError::FetchPosts(err)
            | ServerError::DecodePosts(err)
            | ServerError::FetchPost(err)
            | ServerError::UpdatePost(err)
            | ServerError::FetchUpdatedPost(err)
            | ServerError::DeletePost(err) => Some(err.to_string()),
            ServerError::UpdatedPostMissing(post_id) => {
                Some(format!("Post {post_id} no longer exists"))
            }
            ServerError::InvalidPost(_)
            | ServerError::InvalidUpdate(InvalidUpdateError::Empty)
            | ServerError::MissingPostId
            | ServerError::InvalidPostId(_)
            | ServerError::PostByIdNotFound(_) => None,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = self.details();

        error!(error = %self, ?details, %status, "Replying with error");

        let error_response = ErrorResponse {
            error: self.to_string(),
            details,
        };
        (status, Json(error_response)).into_response()
    }
}
