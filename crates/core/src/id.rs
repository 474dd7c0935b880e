//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a catalog product (owned by the external catalog).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

/// Identifier of a retail location in the network.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(Uuid);

/// Identifier of a stock alert.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(Uuid);

/// Identifier of a movement ledger entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(Uuid);

/// Identifier of a transfer suggestion.
///
/// Always derived from suggestion content (see [`SuggestionId::derive`]), never
/// minted randomly: the same (product, source, destination) triple must map to
/// the same id across plan runs so executed suggestions can be recognized on
/// resubmission.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuggestionId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

macro_rules! impl_minted_uuid_newtype {
    ($t:ty) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

impl_uuid_newtype!(ProductId, "ProductId");
impl_uuid_newtype!(StoreId, "StoreId");
impl_uuid_newtype!(AlertId, "AlertId");
impl_uuid_newtype!(MovementId, "MovementId");
impl_uuid_newtype!(SuggestionId, "SuggestionId");

impl_minted_uuid_newtype!(ProductId);
impl_minted_uuid_newtype!(StoreId);
impl_minted_uuid_newtype!(MovementId);

/// Namespace for content-derived alert ids.
const ALERT_NAMESPACE: Uuid = Uuid::from_u128(0x6f1f_52a9_27e4_4b1c_9c02_5d8a_41e0_37b5);

/// Namespace for content-derived suggestion ids.
const SUGGESTION_NAMESPACE: Uuid = Uuid::from_u128(0xd34b_8c17_90af_4e6d_8b52_1a7f_6c09_e842);

impl AlertId {
    /// Derive the id of an alert from the (product, store, category) triple.
    ///
    /// One classification pass emits at most one alert per category per
    /// store/product pair, so the triple identifies the alert; a condition that
    /// persists across passes keeps its id.
    pub fn derive(product_id: ProductId, store_id: StoreId, category: &str) -> Self {
        let mut input = Vec::with_capacity(32 + category.len());
        input.extend_from_slice(product_id.as_uuid().as_bytes());
        input.extend_from_slice(store_id.as_uuid().as_bytes());
        input.extend_from_slice(category.as_bytes());
        Self(Uuid::new_v5(&ALERT_NAMESPACE, &input))
    }
}

impl SuggestionId {
    /// Derive the id of a transfer suggestion from its routing triple.
    pub fn derive(product_id: ProductId, from: StoreId, to: StoreId) -> Self {
        let mut input = [0u8; 48];
        input[..16].copy_from_slice(product_id.as_uuid().as_bytes());
        input[16..32].copy_from_slice(from.as_uuid().as_bytes());
        input[32..].copy_from_slice(to.as_uuid().as_bytes());
        Self(Uuid::new_v5(&SUGGESTION_NAMESPACE, &input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestion_id_is_stable_for_the_same_route() {
        let product = ProductId::new();
        let from = StoreId::new();
        let to = StoreId::new();

        assert_eq!(
            SuggestionId::derive(product, from, to),
            SuggestionId::derive(product, from, to),
        );
    }

    #[test]
    fn suggestion_id_is_direction_sensitive() {
        let product = ProductId::new();
        let a = StoreId::new();
        let b = StoreId::new();

        assert_ne!(
            SuggestionId::derive(product, a, b),
            SuggestionId::derive(product, b, a),
        );
    }

    #[test]
    fn alert_id_differs_per_category() {
        let product = ProductId::new();
        let store = StoreId::new();

        assert_ne!(
            AlertId::derive(product, store, "low_stock"),
            AlertId::derive(product, store, "no_movement"),
        );
    }

    #[test]
    fn ids_round_trip_through_display_and_parse() {
        let id = ProductId::new();
        let parsed: ProductId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
