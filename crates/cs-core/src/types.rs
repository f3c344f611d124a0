//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid track scope value.
    #[error("invalid track scope: {value}")]
    InvalidTrackScope { value: String },
}

/// Whether a track is a lane of sequential entries or a day-wide banner row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackScope {
    /// A parallel column whose entries must stay contiguous.
    #[default]
    Lane,
    /// Holds banners spanning every lane; excluded from packing.
    Shared,
}

impl TrackScope {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lane => "lane",
            Self::Shared => "shared",
        }
    }
}

impl fmt::Display for TrackScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TrackScope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lane" => Ok(Self::Lane),
            "shared" => Ok(Self::Shared),
            _ => Err(ValidationError::InvalidTrackScope {
                value: s.to_string(),
            }),
        }
    }
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated schedule entry identifier.
    EntryId, "entry ID"
);

define_string_id!(
    /// A validated track identifier.
    ///
    /// Besides real lane ids, the markers `"shared"` and `"all"` address
    /// day-wide banners that span every lane.
    TrackId, "track ID"
);

define_string_id!(
    /// A validated shoot day identifier.
    DayId, "day ID"
);

/// Track id markers used by banners that are not addressed to a stored track.
const SHARED_TRACK_MARKERS: [&str; 2] = ["shared", "all"];

impl TrackId {
    /// Returns true if this id is one of the day-wide banner markers.
    pub fn is_shared_marker(&self) -> bool {
        SHARED_TRACK_MARKERS.contains(&self.0.as_str())
    }
}
