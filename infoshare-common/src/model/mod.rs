pub mod post;

use bson::oid::ObjectId;
use derive_where::derive_where;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{Error, Unexpected},
};
use std::{
    fmt::{Display, Formatter},
    marker::PhantomData,
    str::FromStr,
};
use thiserror::Error;
use time::error::ComponentRange;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum ModelValidationError {
    #[error("Timestamp out of range: {0}")]
    Timestamp(#[from] ComponentRange),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum IdParseError {
    #[error("The id is empty")]
    Empty,
    #[error("The id is not a valid object id: {0}")]
    Invalid(String),
}

/// Store-assigned identifier, rendered as 24 hex characters at the HTTP boundary.
#[derive_where(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct Id<Marker>(ObjectId, PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(object_id: ObjectId) -> Self {
        Self(object_id, PhantomData)
    }

    #[must_use]
    pub fn generate() -> Self {
        Self::new(ObjectId::new())
    }

    #[must_use]
    pub fn object_id(self) -> ObjectId {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> FromStr for Id<Marker> {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdParseError::Empty);
        }

        ObjectId::parse_str(s)
            .map(Self::new)
            .map_err(|_| IdParseError::Invalid(s.to_owned()))
    }
}

impl<Marker> From<ObjectId> for Id<Marker> {
    fn from(value: ObjectId) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for ObjectId {
    fn from(value: Id<Marker>) -> Self {
        value.0
    }
}

impl<Marker> Serialize for Id<Marker> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de, Marker> Deserialize<'de> for Id<Marker> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        inner
            .parse()
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"a 24 character hex id"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Id, IdParseError, post::PostMarker};
    use bson::oid::ObjectId;

    #[test]
    fn parse_id() {
        let id: Id<PostMarker> = "65f1c0ffee00000000000001".parse().unwrap();
        assert_eq!(
            id.object_id(),
            ObjectId::parse_str("65f1c0ffee00000000000001").unwrap()
        );
        assert_eq!(id.to_string(), "65f1c0ffee00000000000001");

        assert_eq!("".parse::<Id<PostMarker>>(), Err(IdParseError::Empty));
        assert_eq!(
            "not-an-id".parse::<Id<PostMarker>>(),
            Err(IdParseError::Invalid("not-an-id".to_owned()))
        );
        assert!("65f1c0ffee0000000000000".parse::<Id<PostMarker>>().is_err());
    }

    #[test]
    fn id_serializes_as_hex_string() {
        let id = Id::<PostMarker>::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));

        let back: Id<PostMarker> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<Id<PostMarker>>("\"xyz\"").is_err());
        assert!(serde_json::from_str::<Id<PostMarker>>("42").is_err());
    }
}
