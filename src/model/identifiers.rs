//! Core identifier newtypes with smart constructors.
//!
//! All identifiers validate non-empty strings at construction time.
//! Raw constructors are never exported - use smart constructors only.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier shared by every placement of one logical tonic event.
///
/// A tonic sign duplicated across octave rows carries the same uuid on
/// each row; the layout builder uses it to reserve a single slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TonicUuid(String);

/// Error returned when a tonic uuid is empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Tonic uuid must not be empty")]
pub struct InvalidTonicUuid;

impl TonicUuid {
    /// Smart constructor: validates non-empty uuid.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidTonicUuid> {
        let raw = raw.into();
        if raw.is_empty() {
            Err(InvalidTonicUuid)
        } else {
            Ok(Self(raw))
        }
    }

    /// Borrow the raw uuid string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TonicUuid {
    type Error = InvalidTonicUuid;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TonicUuid> for String {
    fn from(value: TonicUuid) -> Self {
        value.0
    }
}

impl fmt::Display for TonicUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a modulation marker.
///
/// Used to break ties between markers anchored at the same position and
/// to address a marker in mutation calls made by the score store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MarkerId(String);

/// Error returned when a marker id is empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Marker id must not be empty")]
pub struct InvalidMarkerId;

impl MarkerId {
    /// Smart constructor: validates non-empty id.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidMarkerId> {
        let raw = raw.into();
        if raw.is_empty() {
            Err(InvalidMarkerId)
        } else {
            Ok(Self(raw))
        }
    }

    /// Borrow the raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MarkerId {
    type Error = InvalidMarkerId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MarkerId> for String {
    fn from(value: MarkerId) -> Self {
        value.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
