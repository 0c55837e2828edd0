//! Branded id newtypes.
//!
//! Worker tokens and session ids are distinct `String` newtypes so one can
//! never be passed where the other is expected. Both are UUID v7
//! (time-ordered), generated via [`uuid::Uuid::now_v7`].

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generate a new UUID v7 string (time-ordered).
fn new_v7() -> String {
    Uuid::now_v7().to_string()
}

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random id (UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(new_v7())
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Opaque single-use worker token minted at registration time.
    WorkerId
}

branded_id! {
    /// Identifier for one socket session.
    SessionId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        let a = WorkerId::new();
        let b = WorkerId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_are_time_ordered() {
        let a = WorkerId::new();
        let b = WorkerId::new();
        // UUID v7 sorts by creation time lexicographically.
        assert!(a.as_str() <= b.as_str());
    }

    #[test]
    fn display_matches_inner() {
        let id = WorkerId::from("abc");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(id.as_str(), "abc");
    }

    #[test]
    fn serde_is_transparent() {
        let id = SessionId::from("sess_1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"sess_1\"");
        let back: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn string_round_trip() {
        let id = WorkerId::from(String::from("token"));
        let s: String = id.clone().into();
        assert_eq!(s, "token");
        assert_eq!(id.into_inner(), "token");
    }

    #[test]
    fn worker_and_session_ids_are_distinct_types() {
        // Compile-time property; the assertion just keeps the test alive.
        let w = WorkerId::from("x");
        let s = SessionId::from("x");
        assert_eq!(w.as_str(), s.as_str());
    }
}
