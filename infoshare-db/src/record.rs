use infoshare_common::model::{
    Id, ModelValidationError,
    post::{CreatePost, Post, PostMarker, PostUpdate},
};
use mongodb::bson::{self, Document, doc, oid::ObjectId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub(crate) struct PostRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub date: bson::DateTime,
}

impl PostRecord {
    pub fn new(id: Id<PostMarker>, post: &CreatePost, date: OffsetDateTime) -> Self {
        Self {
            id: id.object_id(),
            title: post.title.clone(),
            description: post.description.clone(),
            image: post.image.clone(),
            date: to_bson_date_time(date),
        }
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            title: value.title,
            description: value.description,
            image: value.image,
            date: from_bson_date_time(value.date)?,
        })
    }
}

pub(crate) fn id_filter(post_id: Id<PostMarker>) -> Document {
    doc! { "_id": post_id.object_id() }
}

/// Builds the `$set`/`$unset` modifications for a partial update; `date` is always set.
pub(crate) fn update_document(update: &PostUpdate, date: OffsetDateTime) -> Document {
    let mut set = doc! { "date": to_bson_date_time(date) };
    let mut unset = Document::new();

    if let Some(title) = &update.title {
        set.insert("title", title.as_str());
    }
    if let Some(description) = &update.description {
        set.insert("description", description.as_str());
    }
    match &update.image {
        Some(Some(image)) => {
            set.insert("image", image.as_str());
        }
        Some(None) => {
            unset.insert("image", "");
        }
        None => {}
    }

    let mut modifications = doc! { "$set": set };
    if !unset.is_empty() {
        modifications.insert("$unset", unset);
    }
    modifications
}

fn to_bson_date_time(date: OffsetDateTime) -> bson::DateTime {
    // Every representable OffsetDateTime fits into i64 milliseconds.
    #[allow(clippy::cast_possible_truncation)]
    let millis = (date.unix_timestamp_nanos() / 1_000_000) as i64;
    bson::DateTime::from_millis(millis)
}

fn from_bson_date_time(date: bson::DateTime) -> Result<OffsetDateTime, ModelValidationError> {
    let nanos = i128::from(date.timestamp_millis()) * 1_000_000;
    Ok(OffsetDateTime::from_unix_timestamp_nanos(nanos)?)
}
