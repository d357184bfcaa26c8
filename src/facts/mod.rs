//! Fact tables: policy terms and claims

mod data;
pub mod loader;

pub use data::{ClaimRecord, PolicyRecord};
pub use loader::{load_claims, load_policies};
