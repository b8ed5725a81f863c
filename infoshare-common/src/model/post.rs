use crate::model::Id;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use time::OffsetDateTime;

/// Fields a client may never overwrite through an update.
pub const IMMUTABLE_POST_FIELDS: [&str; 2] = ["_id", "date"];

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: Id<PostMarker>,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// Body of a create request. Missing or `null` text fields decode as empty and are caught by
/// [`CreatePost::validate`].
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct CreatePost {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidPostError {
    #[error("Title is required")]
    MissingTitle,
    #[error("Description is required")]
    MissingDescription,
}

impl CreatePost {
    pub fn validate(&self) -> Result<(), InvalidPostError> {
        if self.title.is_empty() {
            return Err(InvalidPostError::MissingTitle);
        }
        if self.description.is_empty() {
            return Err(InvalidPostError::MissingDescription);
        }

        Ok(())
    }

    #[must_use]
    pub fn into_post(self, id: Id<PostMarker>, date: OffsetDateTime) -> Post {
        Post {
            id,
            title: self.title,
            description: self.description,
            image: self.image,
            date,
        }
    }
}

/// A partial update. `None` leaves a field untouched; `image: Some(None)` removes the image.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostUpdate {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,
}

#[derive(Debug, Error)]
pub enum InvalidUpdateError {
    #[error("No valid fields to update")]
    Empty,
    #[error("Invalid update fields")]
    Fields(#[source] serde_json::Error),
}

impl PostUpdate {
    pub fn apply(&self, post: &mut Post) {
        if let Some(title) = &self.title {
            post.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            post.description.clone_from(description);
        }
        if let Some(image) = &self.image {
            post.image.clone_from(image);
        }
    }
}

impl TryFrom<Map<String, Value>> for PostUpdate {
    type Error = InvalidUpdateError;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        for field in IMMUTABLE_POST_FIELDS {
            fields.remove(field);
        }

        if fields.is_empty() {
            return Err(InvalidUpdateError::Empty);
        }

        serde_json::from_value(Value::Object(fields)).map_err(InvalidUpdateError::Fields)
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
