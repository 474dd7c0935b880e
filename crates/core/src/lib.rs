//! `restock-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the domain error taxonomy, and the optimistic
//! concurrency version check used by every stock mutation.

pub mod error;
pub mod id;
pub mod version;

pub use error::{DomainError, DomainResult};
pub use id::{AlertId, MovementId, ProductId, StoreId, SuggestionId};
pub use version::ExpectedVersion;
