//! Trait definitions for Taiga operations.
//!
//! The generic façades implement these once for every resource kind; bring
//! them into scope to call the verbs.

mod delete;
mod get;
mod list;
mod update;

pub use delete::Delete;
pub use get::Get;
pub use list::List;
pub use update::Update;
