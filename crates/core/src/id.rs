//! Strongly-typed identifiers used across the domain.
//!
//! Each id is a uuid newtype; mixing them up is a type error rather than a
//! runtime surprise. New ids are UUIDv7 so they sort by creation time.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Mint a fresh (time-ordered) identifier.
            ///
            /// Tests that need determinism should construct ids explicitly
            /// instead.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s).map_err(|e| {
                    DomainError::invalid_id(format!("{}: {}", stringify!($name), e))
                })?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_id! {
    /// Identifier of a store branch (the isolation boundary).
    BranchId
}

uuid_id! {
    /// Identifier of a user (actor identity).
    UserId
}

uuid_id! {
    /// Identifier of a supplier (external party reference).
    SupplierId
}

uuid_id! {
    /// Identifier of a catalog product (external reference).
    ProductId
}

uuid_id! {
    /// Identifier of an aggregate root.
    AggregateId
}
