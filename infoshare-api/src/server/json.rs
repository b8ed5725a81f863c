//! Request and response bodies for the post routes.

use crate::server::ServerError;
use axum::{
    Json as AxumJson,
    body::Bytes,
    extract::FromRequest,
    response::{IntoResponse, Response},
};
use axum_extra::TypedHeader;
use headers::ContentType;
use serde::Serialize;

/// JSON extractor and response whose failures are reported as [`ServerError`]s.
///
/// Requests must carry a JSON content type. Extraction failures become
/// [`ServerError::JsonRejection`] and serialization failures become
/// [`ServerError::JsonResponse`].
#[derive(FromRequest, Debug, Clone, Copy, Default)]
#[from_request(via(AxumJson), rejection(ServerError))]
pub struct Json<T>(pub T);

impl<T: Serialize> Json<T> {
    fn to_bytes(&self) -> Result<Bytes, ServerError> {
        let body = serde_json::to_vec(&self.0).map_err(|source| ServerError::JsonResponse {
            body_type: std::any::type_name::<T>(),
            source,
        })?;
        Ok(Bytes::from(body))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match self.to_bytes() {
            Ok(body) => (TypedHeader(ContentType::json()), body).into_response(),
            Err(err) => err.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::server::{ServerError, json::Json};
    use axum::{
        body::Body,
        extract::FromRequest,
        http::{Request, StatusCode, header},
        response::IntoResponse,
    };
    use serde_json::{Value, json};
    use std::collections::BTreeMap;

    #[test]
    fn responses_carry_json_content_type() {
        let response = Json(json!({ "message": "hi" })).into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[tokio::test]
    async fn bodies_without_json_content_type_are_rejected() {
        let request = Request::builder().body(Body::from("{}")).unwrap();

        let rejection = Json::<Value>::from_request(request, &()).await.unwrap_err();
        assert!(matches!(rejection, ServerError::JsonRejection(_)));
        assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);
        assert_eq!(rejection.to_string(), "Invalid request body");
    }

    #[test]
    fn unserializable_bodies_are_internal_errors() {
        let body = BTreeMap::from([((1_u8, 2_u8), 3_u8)]);

        let err = Json(body).to_bytes().unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to serialize response");
        assert!(err.details().unwrap().contains("BTreeMap"));
    }
}
