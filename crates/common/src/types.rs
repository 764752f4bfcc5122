use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error returned when a string is not a valid identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} id: {input:?}")]
pub struct IdParseError {
    pub kind: &'static str,
    pub input: String,
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an ID from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Parses an ID, rejecting anything that is not a well-formed UUID.
            pub fn parse(input: &str) -> Result<Self, IdParseError> {
                Uuid::parse_str(input.trim())
                    .map(Self)
                    .map_err(|_| IdParseError {
                        kind: $kind,
                        input: input.to_string(),
                    })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a shop.
    ShopId,
    "shop"
);

uuid_id!(
    /// Unique identifier for a user account (shop owners and authenticated principals).
    UserId,
    "user"
);

uuid_id!(
    /// Unique identifier for a product listed in a shop.
    ProductId,
    "product"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_unique_ids() {
        assert_ne!(ShopId::new(), ShopId::new());
    }

    #[test]
    fn parse_accepts_hyphenated_uuid() {
        let uuid = Uuid::new_v4();
        let id = ShopId::parse(&uuid.to_string()).unwrap();
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for input in ["", "abc", "5f1d7c0e", "not-a-uuid-at-all-0000000000000000"] {
            let err = ShopId::parse(input).unwrap_err();
            assert_eq!(err.kind, "shop");
            assert_eq!(err.input, input);
        }
    }

    #[test]
    fn display_is_lowercase_hyphenated() {
        let uuid = Uuid::parse_str("A1A2A3A4-B1B2-C1C2-D1D2-D3D4D5D6D7D8").unwrap();
        let id = UserId::from_uuid(uuid);
        assert_eq!(id.to_string(), "a1a2a3a4-b1b2-c1c2-d1d2-d3d4d5d6d7d8");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ProductId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
