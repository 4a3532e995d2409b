pub mod auth;
pub mod comment;
pub mod like;
pub mod post;
pub mod user;

use crate::model::{auth::InvalidPasswordHashError, user::InvalidUsernameError};
use derive_where::derive_where;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData, num::ParseIntError, str::FromStr};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Username(#[from] InvalidUsernameError),
    #[error(transparent)]
    ContentStatus(#[from] InvalidContentStatusError),
    #[error(transparent)]
    PasswordHash(#[from] InvalidPasswordHashError),
}

/// Database identifier tagged with the kind of row it points at.
#[derive_where(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Debug,
    Default,
    Hash,
    Serialize,
    Deserialize
)]
#[serde(transparent)]
pub struct Id<Marker>(u64, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id, PhantomData)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> FromStr for Id<Marker> {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str(s).map(Self::new)
    }
}

impl<Marker> From<u64> for Id<Marker> {
    fn from(value: u64) -> Self {
        Id::new(value)
    }
}

impl<Marker> From<Id<Marker>> for u64 {
    fn from(value: Id<Marker>) -> Self {
        value.get()
    }
}

/// Soft-delete flag shared by posts and comments.
///
/// Stored as a small integer: `1` for active, `0` for deleted.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Deleted,
    #[default]
    Active,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Unknown content status code: {0}")]
pub struct InvalidContentStatusError(i16);

impl ContentStatus {
    #[must_use]
    pub fn code(self) -> i16 {
        match self {
            ContentStatus::Deleted => 0,
            ContentStatus::Active => 1,
        }
    }
}

impl TryFrom<i16> for ContentStatus {
    type Error = InvalidContentStatusError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ContentStatus::Deleted),
            1 => Ok(ContentStatus::Active),
            other => Err(InvalidContentStatusError(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{ContentStatus, Id, post::PostMarker};

    #[test]
    fn id_parses_only_unsigned_integers() {
        assert_eq!("42".parse::<Id<PostMarker>>(), Ok(Id::new(42)));
        assert!("-1".parse::<Id<PostMarker>>().is_err());
        assert!("abc".parse::<Id<PostMarker>>().is_err());
        assert!("".parse::<Id<PostMarker>>().is_err());
    }

    #[test]
    fn id_serializes_as_plain_number() {
        let id = Id::<PostMarker>::new(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        assert_eq!(serde_json::from_str::<Id<PostMarker>>("7").unwrap(), id);
    }

    #[test]
    fn content_status_codes() {
        assert_eq!(ContentStatus::default(), ContentStatus::Active);
        assert_eq!(ContentStatus::try_from(1), Ok(ContentStatus::Active));
        assert_eq!(ContentStatus::try_from(0), Ok(ContentStatus::Deleted));
        assert!(ContentStatus::try_from(2).is_err());
        assert_eq!(
            serde_json::to_string(&ContentStatus::Active).unwrap(),
            "\"active\""
        );
    }
}
